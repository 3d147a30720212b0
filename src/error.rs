//! Common error type and alias.
//!
//! Every failure surfaces to HTTP callers as `{"kind": ..., "detail": ...}`;
//! generation failures carry an extra `reason` naming what went wrong with
//! the provider call.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::images::GenerationError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Saying {0} not found")]
    NotFound(i64),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Image generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Image storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Machine-readable kind reported to API callers.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::Configuration(_) => "configuration_error",
            AppError::Generation(_) => "generation_failed",
            AppError::Storage(_) => "storage_error",
            AppError::Database(_) => "database_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Generation(GenerationError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Generation(GenerationError::MissingCredentials) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Generation(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) | AppError::Storage(_) | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Generation(inner) => json!({
                "kind": self.kind(),
                "reason": inner.reason(),
                "detail": inner.to_string(),
            }),
            _ => json!({
                "kind": self.kind(),
                "detail": self.to_string(),
            }),
        };
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{}", self);
        }
        (status, Json(body)).into_response()
    }
}
