//! # HTTP Request Handlers
//!
//! This module contains all HTTP request handlers for the upload service.
//! Handlers read the request, run the matching service on the blocking pool
//! where it touches images, and serialize the result.
//!
//! ## Available Handlers
//!
//! - **Health Check** (`health_check`) - Application health monitoring
//! - **Upload** (`upload`) - Multipart batch uploads
//! - **Crop** (`crop`) - Cropping of stored images
//! - **Files** (`files`) - Listings, deletion and retention limits

mod crop;
mod files;
mod health_check;
mod upload;

use std::path::{Component, Path};

use tracing::warn;

use crate::error::{AppError, AppResult};

pub use crop::*;
pub use files::*;
pub use health_check::*;
pub use upload::*;

/// Rejects absolute paths and paths climbing out of the upload root.
pub(crate) fn ensure_relative(path: &str) -> AppResult<()> {
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if escapes {
        warn!(path, "Rejected path outside the upload root");
        return Err(AppError::BadRequest("Path must stay inside the upload root"));
    }
    Ok(())
}
