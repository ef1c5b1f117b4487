//! # Health Check Handler
//!
//! Simple health check endpoint for monitoring application availability.
//! Load balancers and deployment tools can poll it to verify that the
//! service is accepting requests.

use axum::http::StatusCode;
use tracing::{debug, instrument};

/// Health check endpoint that returns 200 OK.
///
/// Performs no storage checks; it only shows the server is responding.
///
/// # Returns
///
/// Always returns `200 OK` status code.
#[instrument]
pub async fn health_check() -> StatusCode {
    debug!("Health check endpoint accessed");
    StatusCode::OK
}
