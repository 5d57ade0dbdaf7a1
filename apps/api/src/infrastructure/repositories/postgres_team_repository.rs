use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::repositories::{team_not_found, TeamRepository};
use crate::domain::team::{Member, NewTeam, Team};

/// PostgreSQL implementation of TeamRepository
///
/// Members live in a JSONB column exactly as written, so malformed entries
/// survive a round trip and stay visible to the repair pass.
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    /// Creates a new PostgresTeamRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TeamRow {
    id: Uuid,
    name: Option<String>,
    owner_uid: Uuid,
    members: Json<Value>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<TeamRow> for Team {
    fn from(r: TeamRow) -> Self {
        // A non-array members column reads as an empty team; repair deletes it.
        let members = match r.members.0 {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        Team::from_persistence(r.id, r.name, r.owner_uid, members, r.created_at, r.updated_at)
    }
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn create(&self, team: &NewTeam) -> Result<Team, String> {
        let row = sqlx::query_as::<_, TeamRow>(
            r#"
            INSERT INTO teams (id, name, owner_uid, members, created_at)
            VALUES ($1, $2, $3, $4, clock_timestamp())
            RETURNING id, name, owner_uid, members, created_at, updated_at
            "#,
        )
        .bind(team.id())
        .bind(team.name())
        .bind(team.owner_uid())
        .bind(Json(team.members_value()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| format!("Failed to create team: {}", e))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>, String> {
        let row = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, name, owner_uid, members, created_at, updated_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to find team by id: {}", e))?;

        Ok(row.map(Team::from))
    }

    async fn list_by_owner(&self, owner_uid: Uuid) -> Result<Vec<Team>, String> {
        let rows = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, name, owner_uid, members, created_at, updated_at
            FROM teams
            WHERE owner_uid = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_uid)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to list teams by owner: {}", e))?;

        Ok(rows.into_iter().map(Team::from).collect())
    }

    async fn list_all(&self) -> Result<Vec<Team>, String> {
        let rows = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, name, owner_uid, members, created_at, updated_at
            FROM teams
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to list teams: {}", e))?;

        Ok(rows.into_iter().map(Team::from).collect())
    }

    async fn update_members(&self, id: Uuid, members: &[Member]) -> Result<(), String> {
        let members = Value::Array(members.iter().map(Member::to_value).collect());
        let result = sqlx::query(
            r#"
            UPDATE teams
            SET members = $2, updated_at = clock_timestamp()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(members))
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to update team members: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(team_not_found(id));
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), String> {
        sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to delete team: {}", e))?;

        Ok(())
    }
}
