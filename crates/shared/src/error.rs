//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Mirrors the engine's error taxonomy at the application boundary so
/// callers can react to stable categories ("insufficient funds" vs
/// "already applied" vs "not yours") without inspecting message text.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input (zero/negative amount, bad currency, etc).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Entity does not belong to the acting employee.
    #[error("Ownership violation: {0}")]
    Ownership(String),

    /// Entity is in the wrong state for the operation.
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Requested amount exceeds the remaining balance.
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// External service error.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Ownership(_) => 403,
            Self::NotFound(_) => 404,
            Self::StateConflict(_) => 409,
            Self::InsufficientBalance(_) => 422,
            Self::Database(_) | Self::ExternalService(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Ownership(_) => "OWNERSHIP_VIOLATION",
            Self::StateConflict(_) => "STATE_CONFLICT",
            Self::InsufficientBalance(_) => "INSUFFICIENT_BALANCE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
