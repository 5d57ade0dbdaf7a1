use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::api::errors::ApiError;
use crate::domain::claims::ClaimMap;
use crate::domain::team::PokemonId;
use crate::domain::user::DisplayName;
use crate::services::{RosterEntry, SavedTeamSummary, ToggleOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user: Option<String>,
}

impl UserQuery {
    fn display_name(&self) -> Option<DisplayName> {
        self.user.as_deref().and_then(DisplayName::new)
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterNameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub current_user: Option<DisplayName>,
    pub registered: Vec<DisplayName>,
    pub admin_unlocked: bool,
    pub saved_teams: Vec<SavedTeamSummary>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub outcome: ToggleOutcome,
    pub mine: Vec<PokemonId>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub released: usize,
}

fn session_snapshot(state: &AppState) -> Result<SessionResponse, ApiError> {
    let session = &state.session;
    Ok(SessionResponse {
        current_user: session.current_user()?,
        registered: session.registered_names()?,
        admin_unlocked: session.admin_unlocked(),
        saved_teams: session.saved_teams()?,
    })
}

/// Roster with each entry's claim status for `user`
///
/// GET /api/pokemon?user=
pub async fn roster(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Json<Vec<RosterEntry>> {
    Json(state.session.roster_view(query.display_name().as_ref()))
}

/// GET /api/session
pub async fn current_session(
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
    let snapshot = tokio::task::spawn_blocking(move || session_snapshot(&state)).await??;
    Ok(Json(snapshot))
}

/// Register a trainer name and make it current
///
/// POST /api/session
pub async fn register_name(
    State(state): State<AppState>,
    Json(req): Json<RegisterNameRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let snapshot = tokio::task::spawn_blocking(move || -> Result<SessionResponse, ApiError> {
        state.session.register_name(&req.name)?;
        session_snapshot(&state)
    })
    .await??;
    Ok(Json(snapshot))
}

/// GET /api/claims
pub async fn claim_map(State(state): State<AppState>) -> Json<ClaimMap> {
    Json(state.session.claim_map())
}

/// Claim or release one Pokémon
///
/// POST /api/claims/:id/toggle
pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let id = PokemonId::new(id)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid Pokémon id: {}", id)))?;
    let user = req.user.as_deref().and_then(DisplayName::new);

    let session = state.session.clone();
    let response = tokio::task::spawn_blocking(move || {
        let outcome = session.toggle(id, user.as_ref())?;
        let mine = user.as_ref().map(|u| session.mine(u)).unwrap_or_default();
        Ok::<_, ApiError>(ToggleResponse { outcome, mine })
    })
    .await??;

    Ok(Json(response))
}

/// Release everything `user` holds
///
/// DELETE /api/claims?user=
pub async fn clear_mine(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ClearResponse>, ApiError> {
    let user = query
        .display_name()
        .ok_or_else(|| ApiError::bad_request("Missing user"))?;
    let session = state.session.clone();
    let released = tokio::task::spawn_blocking(move || session.clear_mine(&user)).await??;
    Ok(Json(ClearResponse { released }))
}

/// Stream of storage change tokens
///
/// GET /api/claims/events
pub async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let rx = state.storage.changes();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        let change = msg.ok()?;
        let event = Event::default()
            .event("change")
            .id(change.token.to_string())
            .json_data(&change)
            .ok()?;
        Some(Ok::<Event, Infallible>(event))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
