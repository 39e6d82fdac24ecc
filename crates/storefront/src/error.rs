//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built; client errors are not.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::delivery::{DeliveryDecision, ResolveError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// The resolver rejected the request.
    #[error("Invalid delivery request: {0}")]
    Resolve(#[from] ResolveError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        match self {
            // Checkout expects a decision body even when the input is rejected.
            Self::Resolve(ResolveError::InvalidInput(detail)) | Self::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                Json(DeliveryDecision::invalid_input(&detail)),
            )
                .into_response(),
            // Don't expose internal error details to clients
            Self::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
