use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::team::{Member, NewTeam, Team};

/// Prefix of the error every adapter returns for a missing team
pub const TEAM_NOT_FOUND: &str = "Team not found";

/// Error text for a write against a team that does not exist
pub fn team_not_found(id: Uuid) -> String {
    format!("{}: {}", TEAM_NOT_FOUND, id)
}

/// True when an adapter error reports a missing team
pub fn is_team_not_found(error: &str) -> bool {
    error.starts_with(TEAM_NOT_FOUND)
}

/// Repository trait for team records
///
/// Every call is an independent request against the store: there is no
/// client-side transaction and no retry.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Persist a new team; the store assigns `created_at`
    async fn create(&self, team: &NewTeam) -> Result<Team, String>;

    /// Find a team by its ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>, String>;

    /// Teams owned by a user, newest first
    async fn list_by_owner(&self, owner_uid: Uuid) -> Result<Vec<Team>, String>;

    /// Every team, newest first
    async fn list_all(&self) -> Result<Vec<Team>, String>;

    /// Replace the member list wholesale and stamp `updated_at`
    async fn update_members(&self, id: Uuid, members: &[Member]) -> Result<(), String>;

    /// Delete a team by ID; deleting a missing team is not an error
    async fn delete(&self, id: Uuid) -> Result<(), String>;
}
