//! # Crop Handler

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    handlers::ensure_relative,
    models::{AppState, CropRequest, CropResult},
    services::crop::CropPipeline,
};

/// Crops an already stored image.
///
/// POST /api/crop Json
///
/// # Returns
///
/// - `200 OK` - Cropped; the body names the new file
/// - `422 Unprocessable Entity` - The crop was refused; the body carries the message
/// - `400 Bad Request` - Unsafe path or invalid `config` overrides
#[instrument(skip_all, fields(request_id = %Uuid::new_v4(), filename = %request.filename))]
pub async fn crop(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CropRequest>,
) -> AppResult<(StatusCode, Json<CropResult>)> {
    ensure_relative(&request.path)?;
    ensure_relative(&request.filename)?;
    if let Some(path) = &request.new_path {
        ensure_relative(path)?;
    }
    if let Some(filename) = &request.new_filename {
        ensure_relative(filename)?;
    }

    let config = state.config_for(request.config.clone())?;

    let worker_state = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        let state = worker_state;
        let pipeline = CropPipeline::new(
            &state.upload_root,
            &state.storage,
            &state.codec,
            state.messages.as_ref(),
        );
        pipeline.crop(&request, &config)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "Crop task failed");
        AppError::Internal
    })?;

    let status = if result.error {
        debug!(message = ?result.message, "Crop refused");
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };

    Ok((status, Json(result)))
}
