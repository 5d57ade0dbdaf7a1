use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::user::value_objects::{Email, Role};

/// User profile as held by the store
///
/// Anonymous users have neither email nor password hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: Option<Email>,
    pub password_hash: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A fresh anonymous profile
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: None,
            password_hash: None,
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    /// A fresh email/password profile
    pub fn with_credentials(email: Email, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: Some(email),
            password_hash: Some(password_hash),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.email.is_none()
    }
}

/// Repository trait for user profiles
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: User) -> Result<Uuid, String>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, String>;

    /// Find a user by email address
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, String>;

    /// Change the role attribute on a profile
    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), String>;
}
