//! API error type and the JSON error envelope.
//!
//! Every failure leaving the HTTP layer is an [`ApiError`], rendered as
//! `{"success": false, "error": {"message", "code"}}` with the matching
//! status. Conversions from the library error types live here so handlers
//! can use `?` throughout.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use carebridge_auth::VerifyError;
use carebridge_core::CoreError;
use carebridge_storage::StorageError;
use serde_json::json;
use tracing::error;

/// Error returned by API handlers and middleware.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
        }
    }

    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(code, message = %message, "Request failed");
        }

        let body = json!({
            "success": false,
            "error": {
                "message": message,
                "code": code,
            }
        });
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            // The stored message is already client-facing; the Display form
            // carries a prefix meant for logs.
            CoreError::Validation { message } => ApiError::BadRequest { message },
            err @ CoreError::InvalidTimestamp(_) => ApiError::bad_request(err.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { resource, .. } => {
                ApiError::not_found(format!("{resource} not found"))
            }
            StorageError::PermissionDenied { message } => ApiError::Forbidden { message },
            err @ StorageError::AlreadyExists { .. } => ApiError::conflict(err.to_string()),
            err @ StorageError::Internal { .. } => ApiError::internal(err.to_string()),
        }
    }
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::AuthenticationRequired => ApiError::unauthorized("Token not provided"),
            VerifyError::InvalidToken => ApiError::unauthorized("Invalid or expired token"),
            VerifyError::CaregiverNotFound => ApiError::unauthorized("Caregiver not found"),
            // Infrastructure failures are the server's problem, not the
            // client's; the details stay in the logs.
            VerifyError::Provider { .. } | VerifyError::Directory { .. } => {
                ApiError::internal("Authentication failed")
            }
        }
    }
}
