//! # Per-file and Crop Failures
//!
//! The error taxonomy reported inside results. These never abort a batch;
//! they are rendered through a [`Translator`](crate::services::messages::Translator)
//! using their [`key`](UploadError::key) and [`params`](UploadError::params).

use thiserror::Error;

use crate::utils::geometry::Dimensions;

/// Message parameters: `(name, value)` pairs.
pub type Params = Vec<(&'static str, String)>;

/// Which dimension bounds an image violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionBound {
    /// Both width and height bounds are configured.
    Size { width: u32, height: u32 },
    Width(u32),
    Height(u32),
}

/// Validation or persistence failure of a single uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("a file already exists with the name specified ({filename})")]
    FileAlreadyExists { filename: String },

    #[error("an image file is required")]
    ImageRequired,

    #[error("a file is required")]
    FileRequired,

    #[error("the file must be one of: {allowed}")]
    FormatsRequired { allowed: String },

    #[error("the file must not exceed {threshold}")]
    MaxFileSize { threshold: String },

    #[error("the image is smaller than allowed ({}x{})", actual.width, actual.height)]
    MinImageDimensions { bound: DimensionBound, actual: Dimensions },

    #[error("the image is larger than allowed ({}x{})", actual.width, actual.height)]
    MaxImageDimensions { bound: DimensionBound, actual: Dimensions },

    #[error("the file could not be stored")]
    General,
}

impl UploadError {
    /// Translation key of the message.
    pub fn key(&self) -> &'static str {
        match self {
            UploadError::FileAlreadyExists { .. } => "file_already_exists",
            UploadError::ImageRequired => "image_required",
            UploadError::FileRequired => "file_required",
            UploadError::FormatsRequired { .. } => "formats_required",
            UploadError::MaxFileSize { .. } => "max_file_size",
            UploadError::MinImageDimensions { bound, .. } => match bound {
                DimensionBound::Size { .. } => "min_image_size",
                DimensionBound::Width(_) => "min_image_width",
                DimensionBound::Height(_) => "min_image_height",
            },
            UploadError::MaxImageDimensions { bound, .. } => match bound {
                DimensionBound::Size { .. } => "max_image_size",
                DimensionBound::Width(_) => "max_image_width",
                DimensionBound::Height(_) => "max_image_height",
            },
            UploadError::General => "general",
        }
    }

    /// Parameters interpolated into the message.
    pub fn params(&self) -> Params {
        match self {
            UploadError::FileAlreadyExists { filename } => vec![("filename", filename.clone())],
            UploadError::FormatsRequired { allowed } => vec![("formats", allowed.clone())],
            UploadError::MaxFileSize { threshold } => vec![("maxFileSize", threshold.clone())],
            UploadError::MinImageDimensions { bound, .. } => bound_params(*bound, "min"),
            UploadError::MaxImageDimensions { bound, .. } => bound_params(*bound, "max"),
            UploadError::ImageRequired | UploadError::FileRequired | UploadError::General => {
                Vec::new()
            }
        }
    }

    /// The measured dimensions, for dimension failures.
    ///
    /// Rendered as a second sentence (`image_size_actual`).
    pub fn actual_dimensions(&self) -> Option<Dimensions> {
        match self {
            UploadError::MinImageDimensions { actual, .. }
            | UploadError::MaxImageDimensions { actual, .. } => Some(*actual),
            _ => None,
        }
    }
}

fn bound_params(bound: DimensionBound, prefix: &str) -> Params {
    let (w, h) = match prefix {
        "min" => ("minWidth", "minHeight"),
        _ => ("maxWidth", "maxHeight"),
    };
    match bound {
        DimensionBound::Size { width, height } => {
            vec![(w, width.to_string()), (h, height.to_string())]
        }
        DimensionBound::Width(width) => vec![(w, width.to_string())],
        DimensionBound::Height(height) => vec![(h, height.to_string())],
    }
}

/// Failure of the standalone crop operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CropError {
    #[error("file not found ({filename})")]
    FileNotFound { filename: String },

    #[error("file is not an image ({filename})")]
    FileNotImage { filename: String },

    #[error("a file already exists with the name specified ({filename})")]
    FileAlreadyExists { filename: String },

    #[error("directory not found ({path})")]
    DirectoryNotFound { path: String },

    #[error("the image could not be cropped")]
    General,
}

impl CropError {
    pub fn key(&self) -> &'static str {
        match self {
            CropError::FileNotFound { .. } => "file_not_found",
            CropError::FileNotImage { .. } => "file_not_image",
            CropError::FileAlreadyExists { .. } => "file_already_exists",
            CropError::DirectoryNotFound { .. } => "directory_not_found",
            CropError::General => "general",
        }
    }

    pub fn params(&self) -> Params {
        match self {
            CropError::FileNotFound { filename }
            | CropError::FileNotImage { filename }
            | CropError::FileAlreadyExists { filename } => vec![("filename", filename.clone())],
            CropError::DirectoryNotFound { path } => vec![("path", path.clone())],
            CropError::General => Vec::new(),
        }
    }
}
