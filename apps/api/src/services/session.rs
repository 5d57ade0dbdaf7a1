use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::admin::code_matches;
use crate::domain::claims::{ClaimMap, ClaimStatus};
use crate::domain::errors::{TeamBuilderError, TeamBuilderResult};
use crate::domain::pokedex;
use crate::domain::team::{Member, PokemonId, Team, MAX_TEAM_SIZE};
use crate::domain::user::DisplayName;
use crate::infrastructure::claim_store::ClaimStore;
use crate::infrastructure::local_store::{keys, SharedStorage};
use crate::services::team_service::TeamService;

/// Locally cached copy of a saved team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTeamSummary {
    pub user: String,
    pub team: Vec<u32>,
    /// Creation time in milliseconds since the epoch
    pub saved_at: i64,
}

/// What a toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Claimed,
    Released,
}

/// One roster card as seen by a trainer
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub id: PokemonId,
    pub label: String,
    pub artwork_url: String,
    pub status: ClaimStatus,
    pub holder: Option<DisplayName>,
}

/// Local bookkeeping around the claim store
///
/// Covers the trainer-name registry, the current-user pointer, claim
/// toggling with ownership and cap checks, the cached saved-team summaries
/// and the local admin flag.
pub struct LocalSession {
    storage: Arc<SharedStorage>,
    claims: ClaimStore,
    admin_code: Option<String>,
}

impl LocalSession {
    pub fn open(storage: Arc<SharedStorage>, admin_code: Option<String>) -> Result<Self, String> {
        let claims = ClaimStore::open(Arc::clone(&storage))?;
        Ok(Self {
            storage,
            claims,
            admin_code,
        })
    }

    pub fn claims(&self) -> &ClaimStore {
        &self.claims
    }

    pub fn storage(&self) -> &Arc<SharedStorage> {
        &self.storage
    }

    // ===== Trainer names =====

    /// Records a trainer name and makes it the current user
    ///
    /// A name equal to an existing one (ignoring case and padding) is not
    /// added twice.
    pub fn register_name(&self, raw: &str) -> TeamBuilderResult<DisplayName> {
        let name = DisplayName::new(raw)
            .ok_or_else(|| TeamBuilderError::validation("Name cannot be empty"))?;

        let mut names = self.registered_names()?;
        if !names.contains(&name) {
            names.push(name.clone());
            self.storage.write_json(keys::USERS, &names).map_err(local)?;
        }
        self.storage
            .kv()
            .set(keys::CURRENT_USER, name.as_str())
            .map_err(local)?;

        Ok(name)
    }

    /// Registered names in registration order; blank or non-text entries are skipped
    pub fn registered_names(&self) -> TeamBuilderResult<Vec<DisplayName>> {
        let raw = self
            .storage
            .read_json::<Vec<Value>>(keys::USERS)
            .map_err(local)?
            .unwrap_or_default();

        Ok(raw
            .into_iter()
            .filter_map(|entry| {
                let name = entry.as_str().and_then(DisplayName::new);
                if name.is_none() {
                    tracing::warn!(entry = %entry, "Skipping malformed trainer name");
                }
                name
            })
            .collect())
    }

    pub fn current_user(&self) -> TeamBuilderResult<Option<DisplayName>> {
        let raw = self.storage.kv().get(keys::CURRENT_USER).map_err(local)?;
        Ok(raw.and_then(DisplayName::new))
    }

    // ===== Claims =====

    pub fn claim_map(&self) -> ClaimMap {
        self.claims.get()
    }

    /// Claims an unheld Pokémon or releases one the user holds
    ///
    /// Refuses Pokémon held by someone else and claims beyond the team cap.
    pub fn toggle(
        &self,
        id: PokemonId,
        user: Option<&DisplayName>,
    ) -> TeamBuilderResult<ToggleOutcome> {
        let user = user.ok_or(TeamBuilderError::NotAuthenticated)?;
        if !pokedex::roster().contains(&id) {
            return Err(TeamBuilderError::validation(format!(
                "Pokémon #{} is not on the roster",
                id
            )));
        }

        self.claims
            .try_mutate(|claims| match claims.holder(id).cloned() {
                Some(holder) if &holder != user => Err(TeamBuilderError::not_authorized(
                    format!("Already claimed by {}", holder),
                )),
                Some(_) => {
                    claims.clear(id);
                    Ok(ToggleOutcome::Released)
                }
                None if claims.held_by(user).len() >= MAX_TEAM_SIZE => Err(
                    TeamBuilderError::validation(format!("Max {} in your team", MAX_TEAM_SIZE)),
                ),
                None => {
                    claims.set(id, user.clone());
                    Ok(ToggleOutcome::Claimed)
                }
            })
            .map_err(local)?
    }

    /// Pokémon currently held by `user`, ascending
    pub fn mine(&self, user: &DisplayName) -> Vec<PokemonId> {
        self.claims.get().held_by(user)
    }

    /// Releases everything `user` holds; returns how many were released
    pub fn clear_mine(&self, user: &DisplayName) -> TeamBuilderResult<usize> {
        self.claims
            .mutate(|claims| {
                let held = claims.held_by(user);
                for id in &held {
                    claims.clear(*id);
                }
                held.len()
            })
            .map_err(local)
    }

    /// The roster in display order, with each entry's status for `user`
    pub fn roster_view(&self, user: Option<&DisplayName>) -> Vec<RosterEntry> {
        let claims = self.claims.get();
        pokedex::roster()
            .into_iter()
            .map(|id| RosterEntry {
                id,
                label: pokedex::label(id),
                artwork_url: pokedex::artwork_url(id),
                status: claims.status_for(id, user),
                holder: claims.holder(id).cloned(),
            })
            .collect()
    }

    // ===== Saved teams =====

    /// Persists the user's claims as a new team and refreshes the local cache
    ///
    /// The local cache write runs on the blocking pool.
    pub async fn save_claims(
        self: &Arc<Self>,
        teams: &TeamService,
        caller: Option<Uuid>,
        user: &DisplayName,
    ) -> TeamBuilderResult<Vec<SavedTeamSummary>> {
        let mine = self.mine(user);
        if mine.is_empty() {
            return Err(TeamBuilderError::validation("No Pokémon selected"));
        }

        let members = mine.into_iter().map(Member::new).collect();
        teams
            .create_team(caller, Some(format!("{} team", user)), members)
            .await?;

        let saved = teams.list_my_teams(caller).await?;
        let session = Arc::clone(self);
        let user = user.clone();
        tokio::task::spawn_blocking(move || session.cache_summaries(&user, &saved))
            .await
            .map_err(|e| local(e.to_string()))?
    }

    /// Replaces the cached summaries with the given teams
    pub fn cache_summaries(
        &self,
        user: &DisplayName,
        teams: &[Team],
    ) -> TeamBuilderResult<Vec<SavedTeamSummary>> {
        let mut summaries: Vec<SavedTeamSummary> = teams
            .iter()
            .map(|t| SavedTeamSummary {
                user: user.to_string(),
                team: t.member_ids(),
                saved_at: t.created_at().timestamp_millis(),
            })
            .collect();
        summaries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));

        self.storage
            .write_json(keys::TEAMS, &summaries)
            .map_err(local)?;
        self.storage
            .announce(self.claims.origin(), keys::TEAMS)
            .map_err(local)?;

        Ok(summaries)
    }

    /// Cached summaries, newest first
    pub fn saved_teams(&self) -> TeamBuilderResult<Vec<SavedTeamSummary>> {
        let mut summaries = self
            .storage
            .read_json::<Vec<SavedTeamSummary>>(keys::TEAMS)
            .map_err(local)?
            .unwrap_or_default();
        summaries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(summaries)
    }

    // ===== Admin flag =====

    /// Sets the local admin flag when the code matches
    pub fn unlock_admin(&self, code: &str) -> TeamBuilderResult<()> {
        if !code_matches(self.admin_code.as_deref(), code) {
            return Err(TeamBuilderError::not_authorized("Incorrect code"));
        }
        self.storage.kv().set(keys::ADMIN, "1").map_err(local)?;
        tracing::info!("Local admin flag unlocked");
        Ok(())
    }

    pub fn admin_unlocked(&self) -> bool {
        matches!(self.storage.kv().get(keys::ADMIN), Ok(Some(flag)) if flag == "1")
    }

    /// Flushes durable storage
    pub fn flush(&self) -> Result<(), String> {
        self.storage.flush()
    }
}

fn local(e: String) -> TeamBuilderError {
    tracing::error!(error = %e, "Local store operation failed");
    TeamBuilderError::remote(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> LocalSession {
        LocalSession::open(Arc::new(SharedStorage::in_memory()), Some("PALLET".into())).unwrap()
    }

    fn id(n: i64) -> PokemonId {
        PokemonId::new(n).unwrap()
    }

    fn name(s: &str) -> DisplayName {
        DisplayName::new(s).unwrap()
    }

    #[test]
    fn register_name_dedups_and_sets_current() {
        let s = session();
        s.register_name("Ash").unwrap();
        s.register_name("  ash ").unwrap();
        s.register_name("Misty").unwrap();

        assert_eq!(s.registered_names().unwrap(), vec![name("Ash"), name("Misty")]);
        assert_eq!(s.current_user().unwrap(), Some(name("Misty")));
        assert!(s.register_name("   ").is_err());
    }

    #[test]
    fn blank_stored_name_does_not_erase_the_others() {
        let s = session();
        s.storage()
            .kv()
            .set(keys::USERS, r#"["Red","Blue","  ",7]"#)
            .unwrap();

        assert_eq!(s.registered_names().unwrap(), vec![name("Red"), name("Blue")]);

        s.register_name("Ash").unwrap();

        let durable: Vec<String> = s.storage().read_json(keys::USERS).unwrap().unwrap();
        assert_eq!(durable, vec!["Red", "Blue", "Ash"]);
    }

    #[test]
    fn toggle_claims_then_releases() {
        let s = session();
        let ash = name("Ash");

        assert_eq!(s.toggle(id(25), Some(&ash)).unwrap(), ToggleOutcome::Claimed);
        assert_eq!(s.mine(&ash), vec![id(25)]);
        assert_eq!(s.toggle(id(25), Some(&name("ASH"))).unwrap(), ToggleOutcome::Released);
        assert!(s.mine(&ash).is_empty());
    }

    #[test]
    fn toggle_refuses_other_holders_claim() {
        let s = session();
        s.toggle(id(1), Some(&name("Gary"))).unwrap();

        let result = s.toggle(id(1), Some(&name("Ash")));
        assert!(matches!(result, Err(TeamBuilderError::NotAuthorized(_))));
        assert_eq!(s.claims().holder(id(1)), Some(name("Gary")));
    }

    #[test]
    fn toggle_enforces_cap() {
        let s = session();
        let ash = name("Ash");
        for n in 1..=10 {
            s.toggle(id(n), Some(&ash)).unwrap();
        }

        let result = s.toggle(id(11), Some(&ash));
        assert!(matches!(result, Err(TeamBuilderError::Validation(_))));
        assert_eq!(s.mine(&ash).len(), 10);
        // Releasing still works at the cap.
        assert_eq!(s.toggle(id(10), Some(&ash)).unwrap(), ToggleOutcome::Released);
    }

    #[test]
    fn toggle_requires_user_and_roster_entry() {
        let s = session();
        assert_eq!(
            s.toggle(id(1), None).unwrap_err(),
            TeamBuilderError::NotAuthenticated
        );
        assert!(matches!(
            s.toggle(id(152), Some(&name("Ash"))),
            Err(TeamBuilderError::Validation(_))
        ));
        assert!(s.toggle(id(172), Some(&name("Ash"))).is_ok());
    }

    #[test]
    fn clear_mine_leaves_others() {
        let s = session();
        s.toggle(id(1), Some(&name("Ash"))).unwrap();
        s.toggle(id(4), Some(&name("Ash"))).unwrap();
        s.toggle(id(7), Some(&name("Brock"))).unwrap();

        assert_eq!(s.clear_mine(&name("ash")).unwrap(), 2);
        assert_eq!(s.claim_map().len(), 1);
        assert_eq!(s.claims().holder(id(7)), Some(name("Brock")));
    }

    #[test]
    fn roster_view_marks_status() {
        let s = session();
        s.toggle(id(1), Some(&name("Ash"))).unwrap();
        s.toggle(id(4), Some(&name("Brock"))).unwrap();

        let view = s.roster_view(Some(&name("Ash")));
        let status = |n: u32| view.iter().find(|e| e.id.get() == n).unwrap().status;

        assert_eq!(status(1), ClaimStatus::Mine);
        assert_eq!(status(4), ClaimStatus::Taken);
        assert_eq!(status(7), ClaimStatus::Available);
    }

    #[test]
    fn unlock_admin_requires_matching_code() {
        let s = session();
        assert!(s.unlock_admin("wrong").is_err());
        assert!(!s.admin_unlocked());

        s.unlock_admin(" PALLET ").unwrap();
        assert!(s.admin_unlocked());
    }

    #[test]
    fn summaries_are_sorted_newest_first() {
        let s = session();
        let older = SavedTeamSummary {
            user: "Ash".into(),
            team: vec![1],
            saved_at: 10,
        };
        let newer = SavedTeamSummary {
            user: "Ash".into(),
            team: vec![2],
            saved_at: 20,
        };
        s.storage()
            .write_json(keys::TEAMS, &vec![older.clone(), newer.clone()])
            .unwrap();

        assert_eq!(s.saved_teams().unwrap(), vec![newer, older]);
    }
}
