use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::repositories::user_repository::{User, UserRepository};
use crate::domain::user::value_objects::{Email, Role};

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new PostgresUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: Option<String>,
    password_hash: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = r
            .email
            .map(Email::new)
            .transpose()
            .map_err(|e| format!("Invalid email from database: {}", e))?;

        Ok(User {
            id: r.id,
            email,
            password_hash: r.password_hash,
            role: Role::from_stored(&r.role),
            created_at: r.created_at,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<Uuid, String> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(user.email.as_ref().map(Email::as_str))
        .bind(user.password_hash.as_deref())
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create user: {}", e))?;

        Ok(user.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, String> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to find user by id: {}", e))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, String> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to find user by email: {}", e))?;

        row.map(User::try_from).transpose()
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), String> {
        let result = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to set role: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("User not found: {}", id));
        }

        Ok(())
    }
}
