//! # Thumbnail Derivation
//!
//! Thumbnails live either in a sibling directory under the same filename or
//! beside their source with a suffix inserted before the extension. The two
//! placements are never combined.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::models::{ThumbnailPlacement, UploadConfig};
use crate::services::{
    codec::{ImageCodec, ImageKind, apply_transform},
    storage::Storage,
};
use crate::utils::{
    constant::DIRECTORY_PERMISSIONS,
    file_types::{extension_of, is_raster_image},
    filename::insert_suffix,
    geometry::thumbnail_transform,
};

/// Filename of the thumbnail of `filename`.
pub fn thumbnail_filename(filename: &str, placement: &ThumbnailPlacement) -> String {
    match placement {
        ThumbnailPlacement::Directory(_) => filename.to_string(),
        ThumbnailPlacement::Suffix(suffix) => insert_suffix(filename, suffix),
    }
}

/// Location of the thumbnail belonging to the file at `path`.
///
/// Returns `None` when there is no placement or when the thumbnail would be
/// the file itself.
pub fn thumbnail_path_for(path: &Path, placement: Option<&ThumbnailPlacement>) -> Option<PathBuf> {
    let placement = placement?;
    let filename = path.file_name()?.to_str()?;
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let thumbnail = match placement {
        ThumbnailPlacement::Directory(dir) => parent.join(dir).join(filename),
        ThumbnailPlacement::Suffix(_) => parent.join(thumbnail_filename(filename, placement)),
    };

    (thumbnail != path).then_some(thumbnail)
}

/// Writes the thumbnail of the stored image at `source`.
///
/// Returns false, without failing, when there is no thumbnail placement, the
/// thumbnail directory cannot be created, the source is missing or is not a
/// raster image.
#[instrument(skip_all, fields(source = %source.display()))]
pub fn derive_thumbnail<S, C>(storage: &S, codec: &C, source: &Path, config: &UploadConfig) -> bool
where
    S: Storage,
    C: ImageCodec,
{
    let Some(target) = thumbnail_path_for(source, config.thumbnail_placement.as_ref()) else {
        debug!("No thumbnail placement configured");
        return false;
    };

    let source_name = source.to_string_lossy();
    if !is_raster_image(&source_name) {
        debug!("Source is not a raster image");
        return false;
    }

    if !storage.exists(source) {
        warn!("Thumbnail source is missing");
        return false;
    }

    if let Some(dir) = target.parent()
        && !storage.is_dir(dir)
        && let Err(e) = storage.mkdir(dir, DIRECTORY_PERMISSIONS)
    {
        warn!(error = %e, "Failed to create thumbnail directory");
        return false;
    }

    let Some(kind) = extension_of(&source_name).and_then(ImageKind::from_extension) else {
        return false;
    };

    let image = match codec.decode(source) {
        Ok(image) => image,
        Err(e) => {
            warn!(error = %e, "Failed to decode thumbnail source");
            return false;
        }
    };

    let transform = thumbnail_transform(codec.size_of(&image), config.thumbnail_size);
    let thumbnail = apply_transform(codec, image, transform);

    if let Err(e) = codec.encode(&thumbnail, &target, kind, config.quality) {
        warn!(error = %e, target = %target.display(), "Failed to write thumbnail");
        return false;
    }

    debug!(target = %target.display(), "Thumbnail written");
    true
}
