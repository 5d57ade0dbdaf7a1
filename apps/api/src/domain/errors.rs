use thiserror::Error;

/// Errors surfaced by team builder operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TeamBuilderError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Remote operation failed: {0}")]
    RemoteOperationFailed(String),
}

impl TeamBuilderError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::NotAuthorized(message.into())
    }

    /// Lifts a repository error string
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteOperationFailed(message.into())
    }
}

pub type TeamBuilderResult<T> = Result<T, TeamBuilderError>;
