//! # File Management Handlers
//!
//! Directory listings, single file deletion and retention limits. Paths are
//! relative to the upload root.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    error::{AppError, AppResult},
    handlers::ensure_relative,
    models::AppState,
    services::maintenance::{
        DirectoryEntry, ListingOptions, delete_file, directory_file_limits, directory_files,
    },
    utils::file_types::TypeSpec,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Directory to list; defaults to the configured upload path.
    pub path: Option<String>,
    /// Pipe-delimited type filter (`"image|pdf"`).
    pub file_types: Option<String>,
    /// Pipe-delimited type order (`"png|jpg"`).
    pub file_type_order: Option<String>,
}

/// Lists the files of a directory.
///
/// GET /api/files?path=&file_types=&file_type_order=
#[instrument(skip_all)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<DirectoryEntry>>> {
    let path = query.path.unwrap_or_else(|| state.defaults.path.clone());
    ensure_relative(&path)?;

    let options = ListingOptions {
        file_types: query.file_types.as_deref().map(TypeSpec::from),
        type_order: query.file_type_order.as_deref().map(TypeSpec::from),
    };

    let entries = directory_files(
        &state.storage,
        &state.upload_root,
        &path,
        &options,
        &state.defaults,
    )?;

    debug!(path = %path, count = entries.len(), "Listed directory");
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub path: String,
}

/// Deletes a file and its thumbnail.
///
/// DELETE /api/files?path=
///
/// # Returns
///
/// - `204 No Content` - Deleted
/// - `404 Not Found` - No such file
#[instrument(skip_all, fields(path = %query.path))]
pub async fn remove_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteQuery>,
) -> AppResult<StatusCode> {
    ensure_relative(&query.path)?;

    let full_path = state.upload_root.join(&query.path);
    if delete_file(&state.storage, &full_path.to_string_lossy(), &state.defaults) {
        info!("File deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("File not found"))
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitsRequest {
    pub path: String,
    /// Maximum file count per type specification.
    pub limits: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct LimitsResponse {
    pub deleted: Vec<String>,
}

/// Applies per-type file count limits to a directory.
///
/// POST /api/maintenance/limits Json
#[instrument(skip_all, fields(path = %request.path))]
pub async fn apply_limits(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LimitsRequest>,
) -> AppResult<Json<LimitsResponse>> {
    ensure_relative(&request.path)?;

    let dir = state.upload_root.join(&request.path);
    let deleted = directory_file_limits(
        &state.storage,
        &dir,
        &request.limits,
        &state.defaults.categories,
    )?;

    let deleted = deleted
        .into_iter()
        .map(|path| {
            path.strip_prefix(&state.upload_root)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned()
        })
        .collect();

    Ok(Json(LimitsResponse { deleted }))
}
