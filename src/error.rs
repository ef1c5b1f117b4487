//! # Centralized Error Handling
//!
//! This module provides a unified error handling system for the HTTP surface.
//! It centralizes error logging and HTTP response generation, so handlers can
//! propagate configuration, pipeline and storage failures with `?`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::models::ConfigError;
use crate::services::{pipeline::PipelineError, storage::StorageError};

/// Central application error type that encompasses all possible error conditions.
///
/// Internal errors (storage, pipeline, task) are logged automatically when
/// converted into a response; client errors are returned with their message.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    #[error("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Config(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Pipeline(e) => {
                error!(error = %e, "Upload pipeline failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Upload failed".to_string())
            }
            AppError::Storage(e) => {
                error!(error = %e, "Storage operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorBody { message });
        (status, body).into_response()
    }
}

/// Convenience Result type alias that uses AppError as the error type.
pub type AppResult<T> = Result<T, AppError>;
