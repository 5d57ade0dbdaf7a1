use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::auth::jwt::verify_token;
use crate::state::AppState;

/// JWT authentication extractor for protected routes
///
/// Usage:
/// ```ignore
/// async fn protected_handler(
///     JwtAuth(user_id): JwtAuth,
/// ) -> Result<String, ApiError> {
///     Ok(format!("Hello trainer {}", user_id))
/// }
/// ```
pub struct JwtAuth(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for JwtAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match caller(parts, state)? {
            Some(user_id) => Ok(JwtAuth(user_id)),
            None => Err(ApiError::unauthorized("Missing authorization header")),
        }
    }
}

fn caller(parts: &Parts, state: &AppState) -> Result<Option<Uuid>, ApiError> {
    let Some(auth_header) = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        return Ok(None);
    };

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::unauthorized("Invalid authorization format. Use: Bearer <token>")
    })?;

    let claims = verify_token(token, &state.config.jwt_secret)
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

    Ok(Some(claims.sub))
}
