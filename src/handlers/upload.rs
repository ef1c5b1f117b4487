//! # Upload Handler
//!
//! Turns a multipart request into an upload batch:
//!
//! 1. Every part carrying a filename becomes an [`IncomingFile`], staged to a
//!    temporary file under the upload root
//! 2. Repeated `name[]` parts get increasing keys
//! 3. An optional text part `config` holds per-request settings overrides
//! 4. The batch runs on the blocking pool; leftover staged files are removed

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{AppState, IncomingFile, UploadResponse},
    services::pipeline::UploadPipeline,
    utils::constant::STAGING_DIRECTORY,
};

/// Name of the multipart text part holding settings overrides.
const CONFIG_PART: &str = "config";

/// Uploads one or more files.
///
/// POST /api/upload MultipartForm
///
/// # Returns
///
/// - `200 OK` - The batch result (per-file failures are reported inside it)
/// - `400 Bad Request` - Malformed multipart data or invalid `config` overrides
/// - `500 Internal Server Error` - Storage failure that aborted the batch
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    debug!("Processing upload request");

    let staging = state.upload_root.join(STAGING_DIRECTORY);
    fs::create_dir_all(&staging).await.map_err(|e| {
        error!(error = %e, "Failed to create staging directory");
        AppError::Internal
    })?;

    let mut files = Vec::new();
    let overrides = match read_parts(&mut multipart, &staging, &mut files).await {
        Ok(overrides) => overrides,
        Err(e) => {
            discard_staged(&files).await;
            return Err(e);
        }
    };

    let config = match state.config_for(overrides) {
        Ok(config) => config,
        Err(e) => {
            discard_staged(&files).await;
            return Err(e.into());
        }
    };
    let staged = files.clone();

    let worker_state = Arc::clone(&state);
    let outcome = tokio::task::spawn_blocking(move || {
        let state = worker_state;
        let pipeline = UploadPipeline::new(
            &state.upload_root,
            &state.storage,
            &state.codec,
            state.messages.as_ref(),
        );
        pipeline.process(files, &config)
    })
    .await;

    // rejected files are still staged
    discard_staged(&staged).await;

    let response = outcome.map_err(|e| {
        error!(error = %e, "Upload task failed");
        AppError::Internal
    })??;

    if let Some(result) = response.batch() {
        info!(
            uploaded = result.uploaded,
            attempted = result.attempted,
            "Upload request completed"
        );
    }

    Ok(Json(response))
}

/// Stages every file part and returns the `config` overrides, if sent.
async fn read_parts(
    multipart: &mut Multipart,
    staging: &Path,
    files: &mut Vec<IncomingFile>,
) -> AppResult<Option<Value>> {
    let mut overrides = None;
    let mut repeated: HashMap<String, usize> = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "Error reading multipart form");
        AppError::BadRequest("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        let Some(original_name) = field.file_name().map(str::to_string) else {
            if name == CONFIG_PART {
                let text = field.text().await.map_err(|e| {
                    warn!(error = %e, "Error reading config part");
                    AppError::BadRequest("Invalid config part")
                })?;
                let value: Value = serde_json::from_str(&text)
                    .map_err(|_| AppError::BadRequest("Config part must be a JSON object"))?;
                overrides = Some(value);
            } else {
                trace!(field_name = %name, "Ignoring text part");
            }
            continue;
        };

        let mime_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| {
            warn!(error = %e, "Error reading file data");
            AppError::BadRequest("Error reading file")
        })?;

        let temp_path = staging.join(format!("{}.part", Uuid::new_v4()));
        fs::write(&temp_path, &data).await.map_err(|e| {
            error!(error = %e, "Failed to stage upload");
            AppError::Internal
        })?;

        let (field_name, key) = match name.strip_suffix("[]") {
            Some(base) => {
                let counter = repeated.entry(base.to_string()).or_insert(0);
                let key = *counter;
                *counter += 1;
                (base.to_string(), Some(key))
            }
            None => (name, None),
        };

        let mut file = IncomingFile::new(field_name, original_name, temp_path, data.len() as u64);
        if let Some(key) = key {
            file = file.with_key(key);
        }
        if let Some(mime_type) = mime_type {
            file = file.with_mime_type(mime_type);
        }
        files.push(file);
    }

    Ok(overrides)
}

/// Removes whatever is left of the staged parts.
async fn discard_staged(files: &[IncomingFile]) {
    for file in files {
        if fs::try_exists(&file.temp_path).await.unwrap_or(false) {
            let _ = fs::remove_file(&file.temp_path).await;
        }
    }
}
