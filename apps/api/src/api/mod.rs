// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;
pub mod middleware;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;
use handlers::{admin, auth, claims, teams};

/// Builds the application router over shared state
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(auth::health_check))
        // Auth routes
        .route("/api/auth/anonymous", post(auth::anonymous))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/admin", post(auth::admin_sign_in))
        // Local session and claims
        .route("/api/pokemon", get(claims::roster))
        .route(
            "/api/session",
            get(claims::current_session).post(claims::register_name),
        )
        .route("/api/claims", get(claims::claim_map).delete(claims::clear_mine))
        .route("/api/claims/events", get(claims::events))
        .route("/api/claims/:id/toggle", post(claims::toggle))
        // Team routes
        .route("/api/teams", post(teams::create_team))
        .route("/api/teams/from-claims", post(teams::save_claims))
        .route("/api/teams/mine", get(teams::list_my_teams))
        .route("/api/teams/:id", delete(teams::delete_team))
        // Admin routes
        .route("/api/admin/unlock", post(admin::unlock))
        .route("/api/admin/teams", get(admin::list_all_teams))
        .route("/api/admin/teams/:id", delete(admin::delete_team))
        .route("/api/admin/teams/:id/members", put(admin::edit_members))
        .route("/api/admin/repair", post(admin::repair))
        .with_state(state)
}
