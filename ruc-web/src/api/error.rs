//! Error responses
//!
//! Every failure reaches the client as a transient notice
//! `{"severity": "error", "message": "..."}` with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ruc_common::identity::AuthError;
use ruc_common::validate::ValidationError;
use ruc_common::Error;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Shown for server-side failures that have no more specific message
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Notice severity, as the client's alert component expects it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// Transient user-facing message
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Common(#[from] Error),

    /// Server-side failure reported to the user with a fixed message
    #[error("{message}")]
    Failed {
        message: &'static str,
        #[source]
        source: Error,
    },
}

impl ApiError {
    /// Report a server-side failure with `message` instead of the generic one
    pub fn storage_message(self, message: &'static str) -> Self {
        match self {
            ApiError::Common(source) if source.is_storage() => ApiError::Failed { message, source },
            other => other,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Common(e.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Common(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Common(Error::Validation(e)) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Common(Error::Auth(e)) => (StatusCode::UNAUTHORIZED, e.to_string()),
            ApiError::Common(Error::Forbidden(_)) => (
                StatusCode::FORBIDDEN,
                "You can only change your own reviews.".to_string(),
            ),
            ApiError::Common(Error::NotFound(what)) => {
                (StatusCode::NOT_FOUND, format!("Not found: {}", what))
            }
            ApiError::Common(Error::InvalidPath(msg)) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Common(e) => {
                error!("Request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
            ApiError::Failed { message, source } => {
                error!("{} ({})", message, source);
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
        };

        (status, Json(Notice::error(message))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_is_bad_request_with_message() {
        let response = ApiError::from(ValidationError::IncompleteFields).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["severity"], "error");
        assert_eq!(body["message"], "Please fill out all fields.");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (ApiError::from(AuthError::MissingSession), StatusCode::UNAUTHORIZED),
            (ApiError::from(Error::Forbidden("x".into())), StatusCode::FORBIDDEN),
            (ApiError::from(Error::NotFound("x".into())), StatusCode::NOT_FOUND),
            (ApiError::from(Error::Internal("x".into())), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_storage_message_only_replaces_server_failures() {
        let failed = ApiError::from(Error::Internal("disk".into())).storage_message("Error submitting review. Please try again.");
        let body = body_json(failed.into_response()).await;
        assert_eq!(body["message"], "Error submitting review. Please try again.");

        let rejected = ApiError::from(ValidationError::InvalidClassCode).storage_message("unused");
        let response = rejected.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["message"],
            "Class Code should be exactly 3 digits."
        );
    }
}
