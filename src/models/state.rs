use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::models::{ConfigError, UploadConfig};
use crate::services::{codec::ImageCrateCodec, messages::Messages, storage::LocalStorage};

/// Application state shared across requests. Needs to be thread-safe.
pub struct AppState {
    /// Directory every caller-supplied relative path is resolved under.
    pub upload_root: PathBuf,
    /// Settings document per-request overrides are merged over.
    pub settings: Value,
    /// The configuration built from `settings` alone.
    pub defaults: UploadConfig,
    pub storage: LocalStorage,
    pub codec: ImageCrateCodec,
    pub messages: Arc<Messages>,
}

impl AppState {
    /// Creates the application state, validating `settings` up front.
    ///
    /// # Arguments
    ///
    /// * `upload_root` - Root directory of stored uploads
    /// * `settings` - Full settings document (defaults already merged in)
    /// * `messages` - Message table for rendering failures
    pub fn new(
        upload_root: PathBuf,
        settings: Value,
        messages: Messages,
    ) -> Result<Self, ConfigError> {
        info!(upload_root = %upload_root.display(), "Initializing application state");

        let defaults = UploadConfig::from_settings(settings.clone(), Value::Null)?;
        debug!(path = %defaults.path, "Default upload configuration loaded");

        Ok(Self {
            upload_root,
            settings,
            defaults,
            storage: LocalStorage::new(),
            codec: ImageCrateCodec,
            messages: Arc::new(messages),
        })
    }

    /// Builds the configuration for one request.
    pub fn config_for(&self, overrides: Option<Value>) -> Result<UploadConfig, ConfigError> {
        match overrides {
            None => Ok(self.defaults.clone()),
            Some(overrides) => UploadConfig::from_settings(self.settings.clone(), overrides),
        }
    }
}
