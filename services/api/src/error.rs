//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
///
/// Handlers and repositories raise these; the `IntoResponse` impl below is
/// the only place they are serialized to HTTP.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Referenced entity absent
    #[error("{0}")]
    NotFound(String),

    /// Missing, malformed, or expired token
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Uniqueness or state violation
    #[error("{0}")]
    Conflict(String),

    /// Store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unexpected failure
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        let cases = [
            (
                ApiError::Validation("bad input".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::NotFound("Software not found".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                ApiError::Forbidden("no".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::Conflict("duplicate".to_string()),
                StatusCode::CONFLICT,
            ),
            (ApiError::Database(sqlx::Error::PoolClosed), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_message_passes_through() {
        let response = ApiError::Validation("Reason is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
