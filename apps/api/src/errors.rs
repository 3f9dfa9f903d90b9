use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every error renders as a flat `{"error": "..."}` JSON object, the shape the
/// mobile client matches on, so new variants must map to a client-readable
/// message here.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required field is missing or malformed. The message is client-facing.
    #[error("{0}")]
    Validation(String),

    /// Unknown (method, action) pair or a body that is not valid JSON.
    #[error("Invalid request")]
    InvalidRequest,

    /// No pending code exists for the phone (never issued, already consumed,
    /// or expired and cleaned up).
    #[error("Code not found or expired")]
    CodeNotFound,

    /// A pending code exists but its TTL has elapsed.
    #[error("Code expired")]
    CodeExpired,

    /// The supplied code does not match the stored one.
    #[error("Invalid code")]
    CodeMismatch,

    /// A business rule rejects the operation (e.g. trial already used).
    #[error("{0}")]
    Conflict(String),

    /// The payment gateway declined the charge.
    #[error("Payment failed")]
    PaymentFailed,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidRequest => (StatusCode::BAD_REQUEST, "Invalid request".to_string()),
            AppError::CodeNotFound => (
                StatusCode::BAD_REQUEST,
                "Code not found or expired".to_string(),
            ),
            AppError::CodeExpired => (StatusCode::BAD_REQUEST, "Code expired".to_string()),
            AppError::CodeMismatch => (StatusCode::BAD_REQUEST, "Invalid code".to_string()),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PaymentFailed => (StatusCode::BAD_REQUEST, "Payment failed".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}
