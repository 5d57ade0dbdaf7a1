use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::handlers::teams::TeamResponse;
use crate::api::middleware::auth::JwtAuth;
use crate::services::RepairReport;
use crate::state::AppState;

/// Request body for an admin member edit, e.g. `{"members": "1, 4, 7"}`
#[derive(Debug, Deserialize)]
pub struct EditMembersRequest {
    pub members: String,
}

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct EditMembersResponse {
    pub id: Uuid,
    pub members: Vec<u32>,
}

/// Every stored team, sorted by name with the owner UID as fallback
///
/// GET /api/admin/teams
///
/// Callers without the admin role get an empty list.
pub async fn list_all_teams(
    State(state): State<AppState>,
    JwtAuth(caller): JwtAuth,
) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    let mut teams = state.teams.list_all_teams(Some(caller)).await?;
    teams.sort_by_cached_key(|team| team.display_label());
    Ok(Json(teams.iter().map(TeamResponse::from).collect()))
}

/// Replace a team's members
///
/// PUT /api/admin/teams/:id/members
pub async fn edit_members(
    State(state): State<AppState>,
    JwtAuth(caller): JwtAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<EditMembersRequest>,
) -> Result<Json<EditMembersResponse>, ApiError> {
    let members = state
        .teams
        .edit_members(Some(caller), id, &req.members)
        .await?;

    Ok(Json(EditMembersResponse {
        id,
        members: members.iter().map(|m| m.pokemon_id.get()).collect(),
    }))
}

/// DELETE /api/admin/teams/:id
pub async fn delete_team(
    State(state): State<AppState>,
    JwtAuth(caller): JwtAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.teams.admin_delete(Some(caller), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run the repair pass over every stored team
///
/// POST /api/admin/repair
pub async fn repair(
    State(state): State<AppState>,
    JwtAuth(caller): JwtAuth,
) -> Result<Json<RepairReport>, ApiError> {
    Ok(Json(state.teams.repair(Some(caller)).await?))
}

/// Set the local admin flag
///
/// POST /api/admin/unlock
pub async fn unlock(
    State(state): State<AppState>,
    Json(req): Json<UnlockRequest>,
) -> Result<StatusCode, ApiError> {
    let session = state.session.clone();
    tokio::task::spawn_blocking(move || session.unlock_admin(&req.code)).await??;
    Ok(StatusCode::NO_CONTENT)
}
