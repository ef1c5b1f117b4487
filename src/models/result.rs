//! # Result Structures
//!
//! The wire contract returned to callers. Field names are camelCase to stay
//! compatible with existing front-end consumers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{CropError, ImageDimensions, ResolvedFile, UploadError};
use crate::utils::geometry::CropRect;

/// Key of a file in [`UploadResult::files`]: its field name, or its position
/// in the batch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum FileIndex {
    Position(usize),
    Field(String),
}

impl fmt::Display for FileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileIndex::Position(position) => write!(f, "{position}"),
            FileIndex::Field(field) => f.write_str(field),
        }
    }
}

impl From<&str> for FileIndex {
    fn from(value: &str) -> Self {
        FileIndex::Field(value.to_string())
    }
}

impl From<usize> for FileIndex {
    fn from(value: usize) -> Self {
        FileIndex::Position(value)
    }
}

/// Outcome for one file. On failure only `error`, `field` and `key` are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_image: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_dimensions: Option<ImageDimensions>,
    /// Rendered failure message; `null` on success.
    pub error: Option<String>,
    pub field: String,
    pub key: Option<usize>,
    /// The failure behind `error`.
    #[serde(skip)]
    pub failure: Option<UploadError>,
}

impl FileResult {
    /// A successful upload.
    pub fn stored(file: &ResolvedFile, size: u64) -> Self {
        Self {
            name: Some(file.display_name.clone()),
            filename: Some(file.filename.clone()),
            basename: Some(file.basename.clone()),
            extension: Some(file.extension.clone()),
            path: Some(file.directory.clone()),
            url: Some(file.url.clone()),
            file_size: Some(size),
            is_image: Some(file.is_image),
            thumbnail_url: Some(file.thumbnail_url.clone()),
            image_dimensions: Some(file.dimensions),
            error: None,
            field: file.incoming.field.clone(),
            key: file.incoming.key,
            failure: None,
        }
    }

    /// A failed upload with its rendered message.
    pub fn failed(field: &str, key: Option<usize>, failure: UploadError, message: String) -> Self {
        Self {
            error: Some(message),
            field: field.to_string(),
            key,
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate outcome of one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadResult {
    /// True unless at least one file was stored.
    pub error: bool,
    pub uploaded: usize,
    pub attempted: usize,
    pub files: BTreeMap<FileIndex, FileResult>,
}

impl Default for UploadResult {
    fn default() -> Self {
        Self {
            error: true,
            uploaded: 0,
            attempted: 0,
            files: BTreeMap::new(),
        }
    }
}

impl UploadResult {
    pub fn file(&self, index: impl Into<FileIndex>) -> Option<&FileResult> {
        self.files.get(&index.into())
    }
}

/// What a batch call returns: the aggregate, or a single file's result when
/// `return_single_result` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Batch(UploadResult),
    Single(Box<FileResult>),
}

impl UploadResponse {
    pub fn batch(&self) -> Option<&UploadResult> {
        match self {
            UploadResponse::Batch(result) => Some(result),
            UploadResponse::Single(_) => None,
        }
    }

    pub fn single(&self) -> Option<&FileResult> {
        match self {
            UploadResponse::Single(result) => Some(result),
            UploadResponse::Batch(_) => None,
        }
    }
}

/// Standalone crop of an already stored image.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CropRequest {
    /// Directory of the source, relative to the storage root.
    pub path: String,
    pub filename: String,
    /// Target directory; defaults to `path`.
    #[serde(default)]
    pub new_path: Option<String>,
    /// Target filename; defaults to `filename`.
    #[serde(default)]
    pub new_filename: Option<String>,
    /// Output width; defaults to the configured resize width.
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Source rectangle; center crop when absent.
    #[serde(default)]
    pub position: Option<CropRect>,
    /// Per-call settings overrides.
    #[serde(default)]
    pub config: Option<Value>,
}

impl CropRequest {
    pub fn new(path: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filename: filename.into(),
            new_path: None,
            new_filename: None,
            width: None,
            height: None,
            position: None,
            config: None,
        }
    }
}

/// Outcome of a crop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropResult {
    pub error: bool,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip)]
    pub failure: Option<CropError>,
}

impl CropResult {
    pub fn cropped(name: String, path: String) -> Self {
        Self {
            error: false,
            message: None,
            name: Some(name),
            path: Some(path),
            failure: None,
        }
    }

    pub fn failed(failure: CropError, message: String) -> Self {
        Self {
            error: true,
            message: Some(message),
            name: None,
            path: None,
            failure: Some(failure),
        }
    }
}
