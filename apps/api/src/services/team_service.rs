use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AdminGate;
use crate::domain::errors::{TeamBuilderError, TeamBuilderResult};
use crate::domain::repositories::{is_team_not_found, team_not_found, TeamRepository};
use crate::domain::team::events::TeamEvent;
use crate::domain::team::value_objects::{canonicalize_ids, parse_id_list};
use crate::domain::team::{Member, NewTeam, Team, MAX_TEAM_SIZE};
use crate::services::repair::{repair_all, RepairReport};

/// Team operations on behalf of a caller
///
/// The caller is the authenticated UID, or None for a request without a
/// session. Validation happens here, before any remote call.
#[derive(Clone)]
pub struct TeamService {
    teams: Arc<dyn TeamRepository>,
    gate: AdminGate,
}

impl TeamService {
    pub fn new(teams: Arc<dyn TeamRepository>, gate: AdminGate) -> Self {
        Self { teams, gate }
    }

    /// Saves a new team owned by the caller
    pub async fn create_team(
        &self,
        caller: Option<Uuid>,
        name: Option<String>,
        members: Vec<Member>,
    ) -> TeamBuilderResult<Team> {
        let owner = caller.ok_or(TeamBuilderError::NotAuthenticated)?;
        let (draft, events) = NewTeam::new(owner, name, members)?;

        let team = self.teams.create(&draft).await.map_err(remote)?;
        log_events(&events);

        Ok(team)
    }

    /// Caller's teams, newest first; no session means no teams
    pub async fn list_my_teams(&self, caller: Option<Uuid>) -> TeamBuilderResult<Vec<Team>> {
        let Some(owner) = caller else {
            return Ok(Vec::new());
        };
        self.teams.list_by_owner(owner).await.map_err(remote)
    }

    /// Every team, newest first, for privileged callers; empty otherwise
    pub async fn list_all_teams(&self, caller: Option<Uuid>) -> TeamBuilderResult<Vec<Team>> {
        let Some(uid) = caller else {
            return Ok(Vec::new());
        };
        if !self.gate.is_privileged(uid).await {
            return Ok(Vec::new());
        }
        self.teams.list_all().await.map_err(remote)
    }

    /// Replaces a team's members from admin input like `"1,4,7"`
    ///
    /// Rejects input with no valid identifiers, or with more than ten valid
    /// entries counted before duplicates are removed.
    pub async fn edit_members(
        &self,
        caller: Option<Uuid>,
        team_id: Uuid,
        input: &str,
    ) -> TeamBuilderResult<Vec<Member>> {
        self.require_admin(caller).await?;

        let ids = parse_id_list(input);
        if ids.is_empty() {
            return Err(TeamBuilderError::validation("No valid IDs entered"));
        }
        if ids.len() > MAX_TEAM_SIZE {
            return Err(TeamBuilderError::validation(format!(
                "At most {} members per team",
                MAX_TEAM_SIZE
            )));
        }

        let cleaned = canonicalize_ids(ids.into_iter().map(Some));
        self.teams
            .update_members(team_id, &cleaned)
            .await
            .map_err(|e| classify(e, team_id))?;

        log_events(&[TeamEvent::MembersReplaced {
            team_id,
            member_count: cleaned.len(),
        }]);

        Ok(cleaned)
    }

    /// Deletes a team owned by the caller, or any team for an admin
    ///
    /// A team that no longer exists counts as deleted.
    pub async fn delete_team(&self, caller: Option<Uuid>, team_id: Uuid) -> TeamBuilderResult<()> {
        let uid = caller.ok_or(TeamBuilderError::NotAuthenticated)?;

        let Some(team) = self.teams.find_by_id(team_id).await.map_err(remote)? else {
            return Ok(());
        };
        if team.owner_uid() != uid && !self.gate.is_privileged(uid).await {
            return Err(TeamBuilderError::not_authorized(
                "Only the owner or an admin may delete this team",
            ));
        }

        self.teams.delete(team_id).await.map_err(remote)?;
        log_events(&[TeamEvent::Deleted { team_id }]);

        Ok(())
    }

    /// Admin-only delete that skips the ownership lookup
    pub async fn admin_delete(&self, caller: Option<Uuid>, team_id: Uuid) -> TeamBuilderResult<()> {
        self.require_admin(caller).await?;
        self.teams.delete(team_id).await.map_err(remote)?;
        log_events(&[TeamEvent::Deleted { team_id }]);
        Ok(())
    }

    /// Brings every stored team into canonical form
    pub async fn repair(&self, caller: Option<Uuid>) -> TeamBuilderResult<RepairReport> {
        self.require_admin(caller).await?;
        repair_all(self.teams.as_ref()).await
    }

    /// Fails unless the caller is signed in and privileged
    pub async fn require_admin(&self, caller: Option<Uuid>) -> TeamBuilderResult<Uuid> {
        let uid = caller.ok_or(TeamBuilderError::NotAuthenticated)?;
        if self.gate.is_privileged(uid).await {
            Ok(uid)
        } else {
            Err(TeamBuilderError::not_authorized("Admin rights required"))
        }
    }
}

fn remote(e: String) -> TeamBuilderError {
    tracing::error!(error = %e, "Team store operation failed");
    TeamBuilderError::remote(e)
}

fn classify(e: String, team_id: Uuid) -> TeamBuilderError {
    if is_team_not_found(&e) {
        TeamBuilderError::NotFound(team_not_found(team_id))
    } else {
        remote(e)
    }
}

fn log_events(events: &[TeamEvent]) {
    for event in events {
        tracing::info!(team_id = %event.team_id(), ?event, "Team event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::user_repository::User;
    use crate::domain::repositories::UserRepository;
    use crate::domain::team::PokemonId;
    use crate::domain::user::value_objects::Role;
    use crate::infrastructure::repositories::{InMemoryTeamRepository, InMemoryUserRepository};
    use serde_json::json;

    struct Fixture {
        service: TeamService,
        teams: Arc<InMemoryTeamRepository>,
        admin: Uuid,
        trainer: Uuid,
    }

    async fn fixture() -> Fixture {
        let teams = Arc::new(InMemoryTeamRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let admin = users.create(User::anonymous()).await.unwrap();
        users.set_role(admin, Role::Admin).await.unwrap();
        let trainer = users.create(User::anonymous()).await.unwrap();

        let service = TeamService::new(teams.clone(), AdminGate::new(users));
        Fixture {
            service,
            teams,
            admin,
            trainer,
        }
    }

    fn members(ids: &[i64]) -> Vec<Member> {
        ids.iter()
            .map(|id| Member::new(PokemonId::new(*id).unwrap()))
            .collect()
    }

    #[tokio::test]
    async fn create_requires_session() {
        let f = fixture().await;
        let result = f.service.create_team(None, None, members(&[1])).await;
        assert_eq!(result.unwrap_err(), TeamBuilderError::NotAuthenticated);
    }

    #[tokio::test]
    async fn create_rejects_bad_counts_before_storing() {
        let f = fixture().await;
        let eleven: Vec<i64> = (1..=11).collect();

        let empty = f.service.create_team(Some(f.trainer), None, vec![]).await;
        let over = f.service.create_team(Some(f.trainer), None, members(&eleven)).await;

        assert!(matches!(empty, Err(TeamBuilderError::Validation(_))));
        assert!(matches!(over, Err(TeamBuilderError::Validation(_))));
        assert!(f.teams.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_mine_without_session_is_empty() {
        let f = fixture().await;
        f.service
            .create_team(Some(f.trainer), None, members(&[1]))
            .await
            .unwrap();

        assert!(f.service.list_my_teams(None).await.unwrap().is_empty());
        assert_eq!(f.service.list_my_teams(Some(f.trainer)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_all_is_empty_for_non_admin() {
        let f = fixture().await;
        f.service
            .create_team(Some(f.trainer), None, members(&[1]))
            .await
            .unwrap();

        assert!(f.service.list_all_teams(Some(f.trainer)).await.unwrap().is_empty());
        assert!(f.service.list_all_teams(None).await.unwrap().is_empty());
        assert_eq!(f.service.list_all_teams(Some(f.admin)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn edit_members_prechecks_and_dedups() {
        let f = fixture().await;
        let team = f
            .service
            .create_team(Some(f.trainer), None, members(&[1]))
            .await
            .unwrap();

        let none = f.service.edit_members(Some(f.admin), team.id(), "x, 0, -3").await;
        assert!(matches!(none, Err(TeamBuilderError::Validation(_))));

        // Eleven entries are rejected even though only ten are distinct.
        let over = f
            .service
            .edit_members(Some(f.admin), team.id(), "1,2,3,4,5,6,7,8,9,10,10")
            .await;
        assert!(matches!(over, Err(TeamBuilderError::Validation(_))));

        let cleaned = f
            .service
            .edit_members(Some(f.admin), team.id(), "7, 4, 7, 1")
            .await
            .unwrap();
        assert_eq!(cleaned, members(&[7, 4, 1]));

        let stored = f.teams.find_by_id(team.id()).await.unwrap().unwrap();
        assert_eq!(stored.member_ids(), vec![7, 4, 1]);
    }

    #[tokio::test]
    async fn edit_members_requires_admin_and_existing_team() {
        let f = fixture().await;

        let denied = f
            .service
            .edit_members(Some(f.trainer), Uuid::new_v4(), "1")
            .await;
        assert!(matches!(denied, Err(TeamBuilderError::NotAuthorized(_))));

        let missing = f
            .service
            .edit_members(Some(f.admin), Uuid::new_v4(), "1")
            .await;
        assert!(matches!(missing, Err(TeamBuilderError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_by_owner_admin_or_nobody() {
        let f = fixture().await;
        let other = Uuid::new_v4();
        let team = f
            .service
            .create_team(Some(f.trainer), None, members(&[1]))
            .await
            .unwrap();

        let denied = f.service.delete_team(Some(other), team.id()).await;
        assert!(matches!(denied, Err(TeamBuilderError::NotAuthorized(_))));

        f.service.delete_team(Some(f.admin), team.id()).await.unwrap();
        assert!(f.teams.find_by_id(team.id()).await.unwrap().is_none());

        // Already gone: still fine.
        assert!(f.service.delete_team(Some(f.trainer), team.id()).await.is_ok());
    }

    #[tokio::test]
    async fn repair_is_admin_only() {
        let f = fixture().await;
        f.teams
            .insert_raw(f.trainer, None, vec![json!({"pokemonId": -1})])
            .await;

        let denied = f.service.repair(Some(f.trainer)).await;
        assert!(matches!(denied, Err(TeamBuilderError::NotAuthorized(_))));

        let report = f.service.repair(Some(f.admin)).await.unwrap();
        assert_eq!(report.deleted_count, 1);
    }
}
