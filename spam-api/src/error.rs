//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use spam_core::SpamError;

/// Result type alias for handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Caller error, never logged as a server fault
    #[error("{0}")]
    BadRequest(String),

    /// A component failed to initialize at startup
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Unexpected failure; detail stays in the server log
    #[error("{0}")]
    Internal(String),
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub status_code: u16,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        debug!("Rejected request: {}", msg);
        ApiError::BadRequest(msg)
    }

    /// Log the underlying failure and keep only `context` for the caller
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, err);
        ApiError::Internal(context.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SpamError> for ApiError {
    fn from(err: SpamError) -> Self {
        if err.is_validation() {
            ApiError::bad_request(err.to_string())
        } else {
            ApiError::internal("Internal server error", err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
            status_code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::ServiceUnavailable("x".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_hides_detail() {
        let err = ApiError::internal("Failed to export CSV", "disk on fire at /var/data");
        assert_eq!(err.to_string(), "Failed to export CSV");
    }

    #[test]
    fn test_from_spam_error() {
        let err: ApiError = SpamError::Validation("Email text cannot be empty".into()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = SpamError::Artifact("bad weights".into()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
