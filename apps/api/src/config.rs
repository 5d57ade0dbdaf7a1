use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_JWT_SECRET: &str = "dev-secret-key";
const DEFAULT_ADMIN_EMAIL: &str = "admin@ptb.app";
const DEFAULT_LOCAL_STORE: &str = ".ptb/local_store.json";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime configuration, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string; in-memory storage when absent
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Account used by the admin sign-in; its password is the admin code
    pub admin_email: String,
    /// Shared secret for the local admin flag; unset means it never unlocks
    pub admin_code: Option<String>,
    /// Durable local store (claims, names, saved summaries)
    pub local_store_path: PathBuf,
    pub max_connections: u32,
}

impl Config {
    /// Reads configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL");
        if database_url.is_none() {
            tracing::warn!("DATABASE_URL not set, teams are kept in memory");
        }

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "BIND_ADDR",
                value: bind_raw.clone(),
            })?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set, using development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: "DB_MAX_CONNECTIONS",
                    value: raw,
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            admin_email: get("ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
            admin_code: get("ADMIN_CODE").map(|c| c.trim().to_string()),
            local_store_path: get("CLAIMS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_STORE)),
            max_connections,
        })
    }

    /// In-memory configuration for tests
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            bind_addr: ([127, 0, 0, 1], 0).into(),
            jwt_secret: "test-secret".to_string(),
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_code: Some("TESTCODE".to_string()),
            local_store_path: PathBuf::from(DEFAULT_LOCAL_STORE),
            max_connections: 1,
        }
    }
}
