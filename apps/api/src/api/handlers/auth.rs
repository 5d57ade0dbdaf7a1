use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::auth::JwtAuth;
use crate::auth::jwt::create_token;
use crate::auth::password::{check_strength, hash_password, verify_password};
use crate::domain::repositories::user_repository::User;
use crate::domain::user::value_objects::Email;
use crate::state::AppState;

/// Request body for registration and login
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Request body for admin sign-in
#[derive(Debug, Deserialize)]
pub struct AdminSignInRequest {
    pub code: String,
}

/// A freshly issued session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: Uuid,
    pub anonymous: bool,
    pub is_admin: bool,
}

fn issue(state: &AppState, user: &User) -> Result<SessionResponse, ApiError> {
    let token = create_token(user.id, user.is_anonymous(), &state.config.jwt_secret)
        .map_err(|e| ApiError::internal_server_error(format!("Failed to create token: {}", e)))?;

    Ok(SessionResponse {
        token,
        user_id: user.id,
        anonymous: user.is_anonymous(),
        is_admin: user.role.is_admin(),
    })
}

/// Sign in without credentials
///
/// POST /api/auth/anonymous
pub async fn anonymous(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let user = User::anonymous();
    state
        .users
        .create(user.clone())
        .await
        .map_err(|e| ApiError::internal_server_error(format!("Failed to create user: {}", e)))?;

    tracing::info!(user_id = %user.id, "Anonymous sign-in");
    Ok((StatusCode::CREATED, Json(issue(&state, &user)?)))
}

/// Register a new email account
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let email = Email::new(&req.email)
        .map_err(|e| ApiError::bad_request(format!("Invalid email: {}", e)))?;
    check_strength(&req.password).map_err(ApiError::bad_request)?;

    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::internal_server_error(format!("Failed to hash password: {}", e)))?;

    let user = User::with_credentials(email, password_hash);
    state.users.create(user.clone()).await.map_err(|e| {
        if e.contains("duplicate") || e.contains("unique") {
            ApiError::conflict("Email already registered")
        } else {
            ApiError::internal_server_error(format!("Failed to create user: {}", e))
        }
    })?;

    Ok((StatusCode::CREATED, Json(issue(&state, &user)?)))
}

/// Login with email and password
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let email = Email::new(&req.email)
        .map_err(|e| ApiError::bad_request(format!("Invalid email: {}", e)))?;

    let user = authenticate(&state, &email, &req.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    Ok(Json(issue(&state, &user)?))
}

/// Sign in as admin with the admin code
///
/// POST /api/auth/admin
///
/// A caller who is already privileged gets a fresh session. Anyone else is
/// signed in as the configured admin account, with the code as its password.
pub async fn admin_sign_in(
    State(state): State<AppState>,
    JwtAuth(caller): JwtAuth,
    Json(req): Json<AdminSignInRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    if state.gate.is_privileged(caller).await {
        if let Some(user) = state
            .users
            .find_by_id(caller)
            .await
            .map_err(|e| ApiError::internal_server_error(format!("Database error: {}", e)))?
        {
            return Ok(Json(issue(&state, &user)?));
        }
    }

    let email = Email::new(&state.config.admin_email)
        .map_err(|_| ApiError::forbidden("Admin sign-in is not configured"))?;
    let admin = authenticate(&state, &email, req.code.trim())
        .await?
        .ok_or_else(|| ApiError::unauthorized("Incorrect code"))?;

    if !state.gate.is_privileged(admin.id).await {
        tracing::warn!(%caller, "Admin sign-in reached an account without the admin role");
        return Err(ApiError::forbidden("Not authorized"));
    }

    tracing::info!(%caller, admin_id = %admin.id, "Admin sign-in");
    Ok(Json(issue(&state, &admin)?))
}

async fn authenticate(
    state: &AppState,
    email: &Email,
    password: &str,
) -> Result<Option<User>, ApiError> {
    let Some(user) = state
        .users
        .find_by_email(email)
        .await
        .map_err(|e| ApiError::internal_server_error(format!("Database error: {}", e)))?
    else {
        return Ok(None);
    };
    let Some(hash) = user.password_hash.as_deref() else {
        return Ok(None);
    };

    let valid = verify_password(password, hash).map_err(|e| {
        ApiError::internal_server_error(format!("Password verification failed: {}", e))
    })?;

    Ok(valid.then_some(user))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
