//! # Intake - File Upload Service
//!
//! Accepts multipart uploads, validates them against a layered settings
//! document, stores them under an upload root and post-processes images
//! (resizing, format conversion, thumbnails, cropping).
//!
//! ## Modules
//!
//! - [`handlers`] - HTTP request handlers for the upload, crop and file endpoints
//! - [`models`] - Configuration, request and result types
//! - [`services`] - The upload and crop pipelines and their storage/codec seams
//! - [`utils`] - Filename, size, type and geometry helpers

pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tracing::info;

use crate::handlers::{apply_limits, crop, health_check, list_files, remove_file, upload};
use crate::models::AppState;
use crate::utils::constant::MAX_REQUEST_BODY;

/// Creates an Axum router with application routes and state.
///
/// Stored files are served read-only from the upload root for every path no
/// route claims, so the URLs in upload results resolve as given.
///
/// # Arguments
///
/// * `state` - Shared state holding the upload root and default settings
///
/// # Returns
///
/// A configured Axum router with all application routes
pub fn app(state: Arc<AppState>) -> Router {
    info!(upload_root = %state.upload_root.display(), "Building router");

    let uploads = ServeDir::new(&state.upload_root);

    let api_routes = Router::new()
        .route("/api/upload", post(upload))
        .route("/api/crop", post(crop))
        .route("/api/files", get(list_files).delete(remove_file))
        .route("/api/maintenance/limits", post(apply_limits))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY));

    Router::new()
        .route("/health-check", get(health_check))
        .merge(api_routes)
        .fallback_service(uploads)
        .with_state(state)
}
