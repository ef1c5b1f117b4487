//! # Pipeline Constants
//!
//! This module defines the fixed values used throughout the upload pipeline.
//! These constants control which extensions count as raster images, how crops
//! overscale before trimming, and how generated names and URLs look.

/// Raster image extensions the pipeline can measure, resize and convert.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Extensions that count as images for listings (raster plus svg).
///
/// Vector images are never measured or resized.
pub const DISPLAY_IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "svg"];

/// Enlargement applied to the target box before a center crop.
///
/// Scaling past the box first keeps the crop filled when the source aspect
/// ratio differs from the target's.
pub const CROP_OVERSCALE: f64 = 1.4;

/// Length of the token generated by the random filename strategy.
pub const RANDOM_FILENAME_LENGTH: usize = 16;

/// Upper bound (inclusive) of the cache-busting query appended to URLs.
pub const NO_CACHE_MAX: u32 = 99_999;

/// Permissions for directories created on demand.
pub const DIRECTORY_PERMISSIONS: u32 = 0o755;

/// Directory (under the upload root) where multipart parts are staged.
pub const STAGING_DIRECTORY: &str = ".staging";

/// Largest multipart body accepted by the HTTP surface.
pub const MAX_REQUEST_BODY: usize = 64 * 1024 * 1024;
