//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Handler ── Result<T, ApiError>                                         │
//! │                                                                         │
//! │  SyncError::Validation ──► VALIDATION_ERROR  400  (field errors listed) │
//! │  JSON body rejection ────► VALIDATION_ERROR  400                        │
//! │  SyncError::NotFound ────► NOT_FOUND         404                        │
//! │  SyncError::Storage ─────► STORAGE_ERROR     500  (details logged only) │
//! │  anything else ──────────► INTERNAL          500                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Body:
//! ```json
//! {
//!   "code": "VALIDATION_ERROR",
//!   "message": "1 validation error(s): addressLines is required",
//!   "errors": [{ "kind": "required", "field": "addressLines" }]
//! }
//! ```

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use alta_core::ValidationError;
use alta_sync::SyncError;

/// Error body returned by every failing route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable message
    pub message: String,

    /// Field-level problems, for validation failures
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Unknown local id (404)
    NotFound,

    /// Local buffer failure (500)
    StorageError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::StorageError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Validation(errors) => ApiError {
                code: ErrorCode::ValidationError,
                message: errors.to_string(),
                errors: errors.errors().to_vec(),
            },
            SyncError::NotFound(message) => ApiError::new(ErrorCode::NotFound, message),
            SyncError::Storage(e) => {
                error!(error = %e, "Local buffer failure");
                ApiError::new(ErrorCode::StorageError, "The submission could not be stored")
            }
            other => {
                error!(error = %other, "Unexpected error");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alta_db::DbError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::ValidationError.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::StorageError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_details_not_echoed() {
        let err = ApiError::from(SyncError::from(DbError::Unavailable(
            "/var/lib/alta/alta.db: disk I/O error".into(),
        )));

        assert_eq!(err.code, ErrorCode::StorageError);
        assert!(!err.message.contains("disk"));
    }

    #[test]
    fn test_validation_body() {
        let err = ApiError::from(SyncError::Validation(
            ValidationError::required("addressLines").into(),
        ));

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["errors"][0]["field"], "addressLines");
    }
}
