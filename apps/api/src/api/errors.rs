use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::errors::TeamBuilderError;

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<TeamBuilderError> for ApiError {
    fn from(err: TeamBuilderError) -> Self {
        match err {
            TeamBuilderError::Validation(message) => Self::bad_request(message),
            TeamBuilderError::NotAuthenticated => Self::unauthorized("Sign in first"),
            TeamBuilderError::NotAuthorized(message) => Self::forbidden(message),
            TeamBuilderError::NotFound(message) => Self::not_found(message),
            TeamBuilderError::RemoteOperationFailed(detail) => {
                // Driver details stay in the log.
                tracing::error!(error = %detail, "Request failed on a store operation");
                Self::internal_server_error("Storage operation failed")
            }
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!(error = %err, "Blocking task did not complete");
        Self::internal_server_error("Task join error")
    }
}

impl From<String> for ApiError {
    fn from(message: String) -> Self {
        Self::internal_server_error(message)
    }
}
