//! Error types for melodex-server
//!
//! Every handler returns [`ApiResult`]. Validation and authentication errors
//! are raised before any store or gateway access. Store and gateway failures
//! are logged here and reach the client only as a generic message, except
//! upstream details in development deployments.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use melodex_common::api::{ErrorBody, ErrorResponse};
use melodex_common::config::Environment;
use thiserror::Error;
use tracing::error;

use crate::services::GatewayError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session (401)
    #[error("Unauthorized")]
    Unauthenticated,

    /// Missing or malformed request field (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Duplicate favorite for this user (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Target absent or not owned by the caller (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Catalog or completion gateway failure (500)
    ///
    /// `message` is already redacted for the deployment environment.
    #[error("Upstream failure: {message}")]
    Upstream { message: String, retryable: bool },

    /// Internal server error (500) with a user-facing message
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error (500, details logged only)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// melodex-common error
    #[error("Common error: {0}")]
    Common(#[from] melodex_common::Error),
}

impl ApiError {
    /// Convert a gateway failure, exposing its detail only in development
    pub fn upstream(err: GatewayError, environment: Environment) -> Self {
        error!("Upstream gateway error: {}", err);

        let message = if environment.is_development() {
            err.to_string()
        } else {
            "Internal server error".to_string()
        };

        ApiError::Upstream {
            message,
            retryable: err.is_transient(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, retryable) = match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Unauthorized".to_string(),
                None,
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::Upstream { message, retryable } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "UPSTREAM_FAILURE",
                message,
                Some(retryable),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
                None,
            ),
            ApiError::Database(ref err) => {
                error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::Common(melodex_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None)
            }
            ApiError::Common(ref err) => {
                error!("Internal error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                retryable,
            },
        });

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::Common(melodex_common::Error::InvalidInput("x".into())),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_upstream_detail_redacted_in_production() {
        let err = GatewayError::Status {
            status: 502,
            body: "bad gateway from catalog".to_string(),
        };

        match ApiError::upstream(err, Environment::Production) {
            ApiError::Upstream { message, retryable } => {
                assert_eq!(message, "Internal server error");
                assert!(retryable, "5xx upstream is transient");
            }
            other => panic!("Expected Upstream, got {:?}", other),
        }
    }

    #[test]
    fn test_upstream_detail_exposed_in_development() {
        let err = GatewayError::Timeout("catalog search".to_string());

        match ApiError::upstream(err, Environment::Development) {
            ApiError::Upstream { message, retryable } => {
                assert!(message.contains("catalog search"));
                assert!(retryable);
            }
            other => panic!("Expected Upstream, got {:?}", other),
        }
    }
}
