use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::repositories::{team_not_found, TeamRepository};
use crate::domain::team::{Member, NewTeam, Team};

/// In-memory implementation of TeamRepository
///
/// Used when no database is configured and by the test suites. Issues
/// strictly increasing timestamps so creation order is always recoverable.
#[derive(Default)]
pub struct InMemoryTeamRepository {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    teams: HashMap<Uuid, Team>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Inner {
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

impl InMemoryTeamRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record with arbitrary raw members, bypassing validation
    ///
    /// Lets tests and fixtures seed the malformed data a repair pass is for.
    pub async fn insert_raw(&self, owner_uid: Uuid, name: Option<String>, members: Vec<Value>) -> Team {
        let mut inner = self.inner.write().await;
        let created_at = inner.next_stamp();
        let team = Team::from_persistence(Uuid::new_v4(), name, owner_uid, members, created_at, None);
        inner.teams.insert(team.id(), team.clone());
        team
    }

    fn newest_first(mut teams: Vec<Team>) -> Vec<Team> {
        teams.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        teams
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn create(&self, team: &NewTeam) -> Result<Team, String> {
        let mut inner = self.inner.write().await;
        if inner.teams.contains_key(&team.id()) {
            return Err(format!("Failed to create team: duplicate id {}", team.id()));
        }

        let created_at = inner.next_stamp();
        let stored = Team::from_persistence(
            team.id(),
            team.name().map(str::to_string),
            team.owner_uid(),
            team.members().iter().map(Member::to_value).collect(),
            created_at,
            None,
        );
        inner.teams.insert(stored.id(), stored.clone());

        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>, String> {
        Ok(self.inner.read().await.teams.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_uid: Uuid) -> Result<Vec<Team>, String> {
        let inner = self.inner.read().await;
        let teams = inner
            .teams
            .values()
            .filter(|t| t.owner_uid() == owner_uid)
            .cloned()
            .collect();

        Ok(Self::newest_first(teams))
    }

    async fn list_all(&self) -> Result<Vec<Team>, String> {
        let inner = self.inner.read().await;
        Ok(Self::newest_first(inner.teams.values().cloned().collect()))
    }

    async fn update_members(&self, id: Uuid, members: &[Member]) -> Result<(), String> {
        let mut inner = self.inner.write().await;
        let updated_at = inner.next_stamp();
        let current = inner
            .teams
            .get(&id)
            .cloned()
            .ok_or_else(|| team_not_found(id))?;

        let replaced = Team::from_persistence(
            current.id(),
            current.name().map(str::to_string),
            current.owner_uid(),
            members.iter().map(Member::to_value).collect(),
            current.created_at(),
            Some(updated_at),
        );
        inner.teams.insert(id, replaced);

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), String> {
        self.inner.write().await.teams.remove(&id);
        Ok(())
    }
}
