// Admin gate
// Role lookup on the user profile, re-checked on every call

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::repositories::UserRepository;

/// Decides whether a user may run admin-only operations
///
/// This is a convenience check for the service layer. Real enforcement
/// belongs to the store's own access rules.
#[derive(Clone)]
pub struct AdminGate {
    users: Arc<dyn UserRepository>,
}

impl AdminGate {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// True only when the profile exists and its role is admin
    ///
    /// Lookup failures and missing profiles are treated as not privileged.
    pub async fn is_privileged(&self, user_id: Uuid) -> bool {
        match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => user.role.is_admin(),
            Ok(None) => {
                tracing::debug!(%user_id, "No profile for user; not privileged");
                false
            }
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "Role lookup failed; treating as not privileged");
                false
            }
        }
    }
}

/// Compares a supplied admin code with the configured one
///
/// Surrounding whitespace is ignored. With no code configured nothing matches.
/// The code is a shared secret checked on this side only; it is not an
/// authorization boundary.
pub fn code_matches(expected: Option<&str>, supplied: &str) -> bool {
    match expected {
        Some(expected) if !expected.is_empty() => supplied.trim() == expected,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::user_repository::User;
    use crate::domain::user::value_objects::{Email, Role};
    use crate::infrastructure::repositories::InMemoryUserRepository;
    use async_trait::async_trait;

    struct FailingUsers;

    #[async_trait]
    impl UserRepository for FailingUsers {
        async fn create(&self, _user: User) -> Result<Uuid, String> {
            Err("unavailable".into())
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, String> {
            Err("unavailable".into())
        }
        async fn find_by_email(&self, _email: &Email) -> Result<Option<User>, String> {
            Err("unavailable".into())
        }
        async fn set_role(&self, _id: Uuid, _role: Role) -> Result<(), String> {
            Err("unavailable".into())
        }
    }

    #[tokio::test]
    async fn admin_role_is_privileged() {
        let users = Arc::new(InMemoryUserRepository::new());
        let id = users.create(User::anonymous()).await.unwrap();
        users.set_role(id, Role::Admin).await.unwrap();

        assert!(AdminGate::new(users).is_privileged(id).await);
    }

    #[tokio::test]
    async fn plain_user_is_not_privileged() {
        let users = Arc::new(InMemoryUserRepository::new());
        let id = users.create(User::anonymous()).await.unwrap();

        assert!(!AdminGate::new(users).is_privileged(id).await);
    }

    #[tokio::test]
    async fn missing_profile_is_not_privileged() {
        let gate = AdminGate::new(Arc::new(InMemoryUserRepository::new()));
        assert!(!gate.is_privileged(Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn lookup_failure_is_not_privileged() {
        let gate = AdminGate::new(Arc::new(FailingUsers));
        assert!(!gate.is_privileged(Uuid::new_v4()).await);
    }

    #[test]
    fn code_comparison_trims_and_requires_configuration() {
        assert!(code_matches(Some("PALLET"), "  PALLET "));
        assert!(!code_matches(Some("PALLET"), "pallet"));
        assert!(!code_matches(None, "anything"));
        assert!(!code_matches(Some(""), ""));
    }
}
