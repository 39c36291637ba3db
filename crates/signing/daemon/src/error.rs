//! Error types for the signing daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use signing_engine::SigningError;
use signing_types::ValidationError;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request the engine never saw
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Error raised by the signing engine
    #[error(transparent)]
    Signing(#[from] SigningError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Signing(e) => (signing_status(e), e.code()),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        let ApiError::Signing(e) = self else {
            return None;
        };
        match e {
            SigningError::InvalidSlotState {
                process_id,
                slot_id,
                reason,
            } => Some(json!({ "process_id": process_id, "slot_id": slot_id, "reason": reason })),
            SigningError::DuplicateCommit {
                process_id,
                slot_id,
                replay,
            } => Some(json!({ "process_id": process_id, "slot_id": slot_id, "replay": replay })),
            SigningError::ProcessTerminal { process_id, status } => {
                Some(json!({ "process_id": process_id, "status": status }))
            }
            SigningError::SlotNotFound {
                process_id,
                slot_id,
            } => Some(json!({ "process_id": process_id, "slot_id": slot_id })),
            SigningError::DocumentBusy {
                document_id,
                process_id,
            } => Some(json!({ "document_id": document_id, "process_id": process_id })),
            SigningError::Validation(ValidationError::PayloadTooLarge { size, limit }) => {
                Some(json!({ "size": size, "limit": limit }))
            }
            SigningError::Storage(_) => Some(json!({ "retryable": e.is_retryable() })),
            _ => None,
        }
    }
}

fn signing_status(e: &SigningError) -> StatusCode {
    match e {
        SigningError::Validation(ValidationError::PayloadTooLarge { .. }) => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        SigningError::Validation(ValidationError::UnsupportedMediaType { .. }) => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
        SigningError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SigningError::InvalidSlotState { .. }
        | SigningError::DuplicateCommit { .. }
        | SigningError::ProcessTerminal { .. }
        | SigningError::DocumentBusy { .. } => StatusCode::CONFLICT,
        SigningError::ProcessNotFound(_)
        | SigningError::SlotNotFound { .. }
        | SigningError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
        SigningError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        SigningError::Storage(_) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        SigningError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
