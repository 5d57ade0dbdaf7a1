use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::password::hash_password;
use crate::auth::AdminGate;
use crate::config::Config;
use crate::domain::repositories::user_repository::User;
use crate::domain::repositories::{TeamRepository, UserRepository};
use crate::domain::user::value_objects::{Email, Role};
use crate::infrastructure::local_store::{JsonFileKeyValueStore, SharedStorage};
use crate::infrastructure::repositories::{
    InMemoryTeamRepository, InMemoryUserRepository, PostgresTeamRepository,
    PostgresUserRepository,
};
use crate::services::{LocalSession, TeamService};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Failed to open local store: {0}")]
    LocalStore(String),
}

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub teams: TeamService,
    pub users: Arc<dyn UserRepository>,
    pub gate: AdminGate,
    pub session: Arc<LocalSession>,
    pub storage: Arc<SharedStorage>,
    pool: Option<PgPool>,
}

impl AppState {
    /// Connects the configured stores and restores local claims
    ///
    /// Without a database URL the team and user stores live in memory.
    pub async fn init(config: Config) -> Result<Self, StartupError> {
        let teams: Arc<dyn TeamRepository>;
        let users: Arc<dyn UserRepository>;
        let pool = match &config.database_url {
            Some(url) => {
                tracing::info!("Connecting to database...");
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(url)
                    .await?;
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("Database connected and migrated");

                teams = Arc::new(PostgresTeamRepository::new(pool.clone()));
                users = Arc::new(PostgresUserRepository::new(pool.clone()));
                Some(pool)
            }
            None => {
                teams = Arc::new(InMemoryTeamRepository::new());
                users = Arc::new(InMemoryUserRepository::new());
                None
            }
        };

        let kv = JsonFileKeyValueStore::open(&config.local_store_path)
            .map_err(StartupError::LocalStore)?;
        let storage = Arc::new(SharedStorage::new(Arc::new(kv)));

        let state = Self::assemble(config, teams, users, storage, pool)?;
        state.provision_admin().await;
        Ok(state)
    }

    /// Fully in-memory state, for tests
    pub fn in_memory(config: Config) -> Result<Self, StartupError> {
        Self::assemble(
            config,
            Arc::new(InMemoryTeamRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(SharedStorage::in_memory()),
            None,
        )
    }

    /// Wires services over already-built adapters
    pub fn assemble(
        config: Config,
        teams: Arc<dyn TeamRepository>,
        users: Arc<dyn UserRepository>,
        storage: Arc<SharedStorage>,
        pool: Option<PgPool>,
    ) -> Result<Self, StartupError> {
        let gate = AdminGate::new(Arc::clone(&users));
        let session = LocalSession::open(Arc::clone(&storage), config.admin_code.clone())
            .map_err(StartupError::LocalStore)?;

        Ok(Self {
            config: Arc::new(config),
            teams: TeamService::new(teams, gate.clone()),
            users,
            gate,
            session: Arc::new(session),
            storage,
            pool,
        })
    }

    /// Creates the admin account on first start when an admin code is set
    ///
    /// An existing account with the admin email is never promoted.
    pub async fn provision_admin(&self) {
        let Some(code) = self.config.admin_code.as_deref() else {
            return;
        };
        let email = match Email::new(&self.config.admin_email) {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(error = %e, "ADMIN_EMAIL is not usable; no admin account");
                return;
            }
        };

        match self.users.find_by_email(&email).await {
            Ok(Some(user)) if !user.role.is_admin() => {
                tracing::warn!(%email, "Admin email belongs to a non-admin account");
                return;
            }
            Ok(Some(_)) => return,
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "Failed to look up admin account");
                return;
            }
        }

        let hash = match hash_password(code) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!(error = %e, "Failed to hash admin code");
                return;
            }
        };
        let mut admin = User::with_credentials(email.clone(), hash);
        admin.role = Role::Admin;

        match self.users.create(admin).await {
            Ok(id) => tracing::info!(%email, user_id = %id, "Admin account created"),
            Err(e) => tracing::error!(error = %e, "Failed to create admin account"),
        }
    }

    /// Flushes local storage and closes the database pool
    pub async fn shutdown(&self) {
        if let Err(e) = self.session.flush() {
            tracing::error!(error = %e, "Failed to flush local store");
        }
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
        tracing::info!("Shutdown complete");
    }
}
