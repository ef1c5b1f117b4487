//! # Crop Pipeline
//!
//! Crops an image that is already stored: either a center crop (overscale,
//! then trim) or an explicit source rectangle resampled to the target size.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::models::{CropError, CropRequest, CropResult, UploadConfig};
use crate::services::{
    codec::{ImageCodec, ImageKind, apply_transform},
    messages::Translator,
    storage::Storage,
    thumbnail::derive_thumbnail,
};
use crate::utils::{
    constant::{CROP_OVERSCALE, DIRECTORY_PERMISSIONS},
    file_types::extension_of,
    filename::sanitize,
    geometry::{Dimensions, cover_crop},
};

/// Crops stored images under a storage root.
pub struct CropPipeline<'a, S, C> {
    root: &'a Path,
    storage: &'a S,
    codec: &'a C,
    translator: &'a dyn Translator,
}

impl<'a, S, C> CropPipeline<'a, S, C>
where
    S: Storage,
    C: ImageCodec,
{
    pub fn new(
        root: &'a Path,
        storage: &'a S,
        codec: &'a C,
        translator: &'a dyn Translator,
    ) -> Self {
        Self {
            root,
            storage,
            codec,
            translator,
        }
    }

    /// Crops `request.filename` into the requested target.
    ///
    /// The output size is `width` x `height` from the request, falling back
    /// to the configured resize dimensions.
    #[instrument(skip_all, fields(path = %request.path, filename = %request.filename))]
    pub fn crop(&self, request: &CropRequest, config: &UploadConfig) -> CropResult {
        match self.try_crop(request, config) {
            Ok(result) => result,
            Err(failure) => {
                debug!(error = %failure, "Crop rejected");
                let message = self.translator.crop_error(&failure);
                CropResult::failed(failure, message)
            }
        }
    }

    fn try_crop(
        &self,
        request: &CropRequest,
        config: &UploadConfig,
    ) -> Result<CropResult, CropError> {
        let source = self.root.join(&request.path).join(&request.filename);
        if !self.storage.exists(&source) {
            return Err(CropError::FileNotFound {
                filename: request.filename.clone(),
            });
        }

        let source_extension = extension_of(&request.filename)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let Some(kind) = ImageKind::from_extension(&source_extension) else {
            return Err(CropError::FileNotImage {
                filename: request.filename.clone(),
            });
        };

        let target_dir = request
            .new_path
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| request.path.clone());
        let filename = target_filename(request, &source_extension);

        let image = self.codec.decode(&source).map_err(|e| {
            warn!(error = %e, "Failed to decode crop source");
            CropError::General
        })?;

        let target = self.root.join(&target_dir).join(&filename);
        if self.storage.exists(&target) {
            if config.overwrite {
                self.storage.delete(&target);
            } else {
                return Err(CropError::FileAlreadyExists { filename });
            }
        }

        let directory = self.root.join(&target_dir);
        if !self.storage.is_dir(&directory) {
            let created = config.create_directory
                && self.storage.mkdir(&directory, DIRECTORY_PERMISSIONS).is_ok();
            if !created {
                return Err(CropError::DirectoryNotFound { path: target_dir });
            }
        }

        let size = Dimensions::new(
            request.width.unwrap_or(config.resize_to.width),
            request.height.unwrap_or(config.resize_to.height),
        );

        let cropped = match request.position {
            None => {
                let transform = cover_crop(self.codec.size_of(&image), size, CROP_OVERSCALE);
                apply_transform(self.codec, image, transform)
            }
            Some(rect) => {
                let region = self.codec.crop_rect(image, rect);
                self.codec.resize(region, size.width, size.height, false)
            }
        };

        self.codec
            .encode(&cropped, &target, kind, config.quality)
            .map_err(|e| {
                warn!(error = %e, "Failed to write cropped image");
                CropError::General
            })?;

        if config.crop_thumbnail {
            derive_thumbnail(self.storage, self.codec, &target, config);
        }

        if config.crop_delete_original
            && filename != request.filename
            && self.storage.exists(&source)
        {
            debug!(source = %source.display(), "Deleting crop source");
            self.storage.delete(&source);
        }

        info!(target = %target.display(), "Image cropped");
        Ok(CropResult::cropped(
            filename,
            format!("{}/", target_dir.trim_end_matches('/')),
        ))
    }
}

/// The sanitized target name, with the source extension appended when the
/// requested name has none.
fn target_filename(request: &CropRequest, source_extension: &str) -> String {
    let requested = request
        .new_filename
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(&request.filename);

    let mut filename = sanitize(requested);
    if extension_of(&filename).is_none() && !source_extension.is_empty() {
        filename.push('.');
        filename.push_str(source_extension);
    }
    filename
}
