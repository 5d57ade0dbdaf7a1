use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::repositories::user_repository::{User, UserRepository};
use crate::domain::user::value_objects::{Email, Role};

/// In-memory implementation of UserRepository
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<Uuid, String> {
        let mut users = self.users.write().await;
        if let Some(email) = &user.email {
            if users.values().any(|u| u.email.as_ref() == Some(email)) {
                return Err(format!("Failed to create user: duplicate email {}", email));
            }
        }
        let id = user.id;
        users.insert(id, user);
        Ok(id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, String> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, String> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.as_ref() == Some(email))
            .cloned())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), String> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| format!("User not found: {}", id))?;
        user.role = role;
        Ok(())
    }
}
