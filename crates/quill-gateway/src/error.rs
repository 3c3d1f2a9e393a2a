//! Error handling for the gateway.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
    /// Bad request.
    #[error("{0}")]
    BadRequest(String),
    /// Not found.
    #[error("{0}")]
    NotFound(String),
    /// Write conflicts with an existing row.
    #[error("{0}")]
    Conflict(String),
}

/// Error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error flag.
    pub error: bool,
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
        };

        let body = ErrorResponse {
            error: true,
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<quill_core::Error> for AppError {
    fn from(e: quill_core::Error) -> Self {
        use quill_core::Error;

        match e {
            Error::PrimaryKeyViolation { .. } => AppError::Conflict(e.to_string()),
            Error::InvalidRow { .. } => AppError::BadRequest(e.to_string()),
            Error::UnknownEntity(_) | Error::UnknownRelation { .. } => {
                AppError::NotFound(e.to_string())
            }
            _ => {
                tracing::error!(error = %e, "Storage request failed");
                AppError::Internal(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let conflict: AppError = quill_core::Error::PrimaryKeyViolation {
            table: "posts".into(),
            key: "p1".into(),
        }
        .into();
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let missing: AppError = quill_core::Error::UnknownEntity("drafts".into()).into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let invalid: AppError = quill_core::Error::InvalidRow {
            table: "posts".into(),
            reason: "bad".into(),
        }
        .into();
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
