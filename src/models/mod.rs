mod config;
mod failure;
mod file;
mod result;
mod state;

pub use config::{
    ConfigError, FieldSelection, ThumbnailPlacement, UploadConfig, default_settings,
    default_upload_config, load_settings, merge_settings,
};
pub(crate) use config::join_url_path;
pub use failure::{CropError, DimensionBound, Params, UploadError};
pub use file::{ImageDimensions, IncomingFile, ResolvedFile};
pub use result::{CropRequest, CropResult, FileIndex, FileResult, UploadResponse, UploadResult};
pub use state::AppState;
