//! Unified error handling for the backend API.
//!
//! This module provides a centralized error type that implements `IntoResponse`,
//! allowing handlers to use `?` operator naturally while returning appropriate
//! HTTP status codes and error messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel_async::pooled_connection::deadpool::PoolError;
use serde::Serialize;
use thiserror::Error;

use crate::spotify::SpotifyError;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database connection pool error
    #[error("Database connection error")]
    ConnectionPool(#[source] PoolError),

    /// Database query error
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Generic internal error
    #[error("{0}")]
    Internal(anyhow::Error),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Query or body failed field validation
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A Spotify or Google endpoint answered with an error
    #[error("Upstream provider error: {0}")]
    Upstream(String),

    /// Authentication required but not provided or invalid
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted to access resource
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl ApiError {
    /// Create a not found error with a custom message
    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound(resource.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        ApiError::Upstream(message.into())
    }
}

/// Store errors arrive as `anyhow::Error`; pool and query failures keep
/// their own status codes, anything else is a 500.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<PoolError>() {
            Ok(e) => return ApiError::ConnectionPool(e),
            Err(err) => err,
        };
        match err.downcast::<diesel::result::Error>() {
            Ok(e) => ApiError::Database(e),
            Err(err) => ApiError::Internal(err),
        }
    }
}

impl From<SpotifyError> for ApiError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::Store(e) => e.into(),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            ApiError::ConnectionPool(e) => {
                tracing::error!("Connection pool error: {:?}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Database connection unavailable".to_string(),
                    None,
                )
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                match e {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        "Resource not found".to_string(),
                        None,
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Database operation failed".to_string(),
                        None,
                    ),
                }
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                format!("{} not found", resource),
                None,
            ),
            ApiError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid parameters".to_string(),
                Some(e.to_string()),
            ),
            ApiError::Upstream(msg) => {
                tracing::error!("Upstream provider error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone(), None)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
