/// Error types for discussion-service
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Result type alias for discussion-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing caller input (field presence, numeric range,
    /// unrecognized filter values)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced post/question/code/parent does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Author mismatch on edit/delete
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Unique-constraint race lost; retried internally before surfacing
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An invariant this service maintains was found violated. Always a bug
    /// signal, never user-caused.
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Consistency(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
