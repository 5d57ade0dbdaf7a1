use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::auth::JwtAuth;
use crate::domain::team::{canonicalize, Team, MAX_TEAM_SIZE};
use crate::domain::user::DisplayName;
use crate::services::SavedTeamSummary;
use crate::state::AppState;

/// Request body for creating a team
///
/// Members are taken as raw JSON and run through the membership validator,
/// so `[{"pokemonId": 4}, 7, "25"]` is accepted.
#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: Option<String>,
    pub members: Vec<Value>,
}

/// Request body for saving the current claims
#[derive(Debug, Deserialize)]
pub struct SaveClaimsRequest {
    pub user: String,
}

/// A stored team as returned to clients
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub label: String,
    pub owner_uid: Uuid,
    pub members: Vec<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id(),
            name: team.name().map(str::to_string),
            label: team.display_label(),
            owner_uid: team.owner_uid(),
            members: team.member_ids(),
            created_at: team.created_at(),
            updated_at: team.updated_at(),
        }
    }
}

/// Create a new team for the caller
///
/// POST /api/teams
pub async fn create_team(
    State(state): State<AppState>,
    JwtAuth(caller): JwtAuth,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    if req.members.is_empty() || req.members.len() > MAX_TEAM_SIZE {
        return Err(ApiError::bad_request(format!(
            "A team needs 1 to {} members",
            MAX_TEAM_SIZE
        )));
    }
    let members = canonicalize(&req.members);

    let team = state
        .teams
        .create_team(Some(caller), req.name, members)
        .await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(&team))))
}

/// Save the named trainer's claims as a team
///
/// POST /api/teams/from-claims
pub async fn save_claims(
    State(state): State<AppState>,
    JwtAuth(caller): JwtAuth,
    Json(req): Json<SaveClaimsRequest>,
) -> Result<(StatusCode, Json<Vec<SavedTeamSummary>>), ApiError> {
    let user = DisplayName::new(&req.user)
        .ok_or_else(|| ApiError::bad_request("Register a name first"))?;

    let summaries = state
        .session
        .save_claims(&state.teams, Some(caller), &user)
        .await?;

    Ok((StatusCode::CREATED, Json(summaries)))
}

/// Teams owned by the caller, newest first
///
/// GET /api/teams/mine
pub async fn list_my_teams(
    State(state): State<AppState>,
    JwtAuth(caller): JwtAuth,
) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    let teams = state.teams.list_my_teams(Some(caller)).await?;
    Ok(Json(teams.iter().map(TeamResponse::from).collect()))
}

/// Delete a team owned by the caller
///
/// DELETE /api/teams/:id
pub async fn delete_team(
    State(state): State<AppState>,
    JwtAuth(caller): JwtAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.teams.delete_team(Some(caller), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
