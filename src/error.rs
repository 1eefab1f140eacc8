// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Upstream question generation failed, produced malformed output,
    /// refused, or timed out. Retryable by the caller; never auto-retried here.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Blob store read/write failure.
    #[error("storage error: {0}")]
    Storage(String),

    // 404 Not Found (question id, user, ...)
    #[error("not found: {0}")]
    NotFound(String),

    // 400 Bad Request
    #[error("validation error: {0}")]
    Validation(String),

    // 401 Unauthorized
    #[error("unauthorized: {0}")]
    Auth(String),

    // 403 Forbidden
    #[error("forbidden: {0}")]
    Forbidden(String),

    // 409 Conflict (e.g., duplicate username)
    #[error("conflict: {0}")]
    Conflict(String),

    // 500 Internal Server Error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Generation(msg) => {
                tracing::error!("Generation error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Question generation failed".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Storage backend failed".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::Internal`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(err.to_string())
    }
}
