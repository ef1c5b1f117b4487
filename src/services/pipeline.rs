//! # Upload Pipeline
//!
//! Validates a batch of incoming files against an [`UploadConfig`], moves the
//! accepted ones into place and runs the image stages (resize, format
//! conversion, thumbnail) on stored images.
//!
//! Per-file problems never abort the batch; they end up in that file's
//! [`FileResult`]. Only storage failures the pipeline cannot work around,
//! such as an uncreatable target directory, are returned as errors.
//!
//! ## Check order
//!
//! For every file the first failing check wins:
//!
//! 1. target already exists (deleted first when `overwrite` is set)
//! 2. file type
//! 3. maximum file size
//! 4. minimum image dimensions
//! 5. maximum image dimensions, unless oversized images are resized instead

use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, instrument, trace, warn};

use crate::models::{
    DimensionBound, FileIndex, FileResult, ImageDimensions, IncomingFile, ResolvedFile,
    UploadConfig, UploadError, UploadResponse, UploadResult, join_url_path,
};
use crate::services::{
    codec::{ImageCodec, ImageKind, apply_transform},
    messages::Translator,
    storage::{Storage, StorageError},
    thumbnail::{derive_thumbnail, thumbnail_filename, thumbnail_path_for},
};
use crate::utils::{
    constant::{DIRECTORY_PERMISSIONS, IMAGE_EXTENSIONS, NO_CACHE_MAX},
    file_types::{AllowedTypes, extension_of},
    filename::{Substitutions, derive_filename, split_filename},
    geometry::{
        Dimensions, ResizeMode, ResizePlan, ResizeTarget, plan_transform, thumbnail_transform,
    },
};

/// Failures that abort a whole batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Which maximum bounds a measured image exceeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaxExceeded {
    pub width: bool,
    pub height: bool,
}

impl MaxExceeded {
    pub fn any(&self) -> bool {
        self.width || self.height
    }
}

/// Decides whether and how a stored image is resized.
///
/// An explicit resize always wins. Otherwise oversized images are shrunk when
/// `resize_on_max` is set: both bounds exceeded resizes into the max box,
/// one bound exceeded fits that side and keeps the aspect ratio.
pub fn decide_resize(config: &UploadConfig, exceeded: MaxExceeded) -> Option<ResizePlan> {
    let configured_mode = if config.crop {
        ResizeMode::Crop
    } else {
        config.default_mode
    };

    if config.resize {
        return Some(ResizePlan {
            target: ResizeTarget::exact(config.resize_to),
            mode: configured_mode,
        });
    }

    if !config.resize_on_max {
        return None;
    }

    match (exceeded.width, exceeded.height) {
        (true, true) => Some(ResizePlan {
            target: ResizeTarget {
                width: config.max_width,
                height: config.max_height,
            },
            mode: configured_mode,
        }),
        (true, false) => Some(ResizePlan {
            target: ResizeTarget {
                width: config.max_width,
                height: None,
            },
            mode: ResizeMode::Landscape,
        }),
        (false, true) => Some(ResizePlan {
            target: ResizeTarget {
                width: None,
                height: config.max_height,
            },
            mode: ResizeMode::Portrait,
        }),
        (false, false) => None,
    }
}

/// Builds the public URL of a path relative to the storage root.
pub fn public_url(config: &UploadConfig, relative: &str) -> String {
    let mut relative = relative.to_string();
    while relative.contains("//") {
        relative = relative.replace("//", "/");
    }

    let mut url = if config.base_url.is_empty() {
        format!("/{}", relative.trim_start_matches('/'))
    } else {
        format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    };

    if config.no_cache_url {
        let token = rand::rng().random_range(1..=NO_CACHE_MAX);
        url.push_str(&format!("?{token}"));
    }

    url
}

/// Runs upload batches against a storage root.
pub struct UploadPipeline<'a, S, C> {
    root: &'a Path,
    storage: &'a S,
    codec: &'a C,
    translator: &'a dyn Translator,
}

/// Running totals of one batch.
struct Batch {
    result: UploadResult,
    first: Option<FileIndex>,
}

impl Batch {
    fn record(&mut self, index: FileIndex, file: FileResult) {
        if file.is_success() {
            self.result.uploaded += 1;
            self.result.error = false;
        }
        if self.first.is_none() {
            self.first = Some(index.clone());
        }
        self.result.files.insert(index, file);
    }
}

impl<'a, S, C> UploadPipeline<'a, S, C>
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

    /// Processes one batch, in order.
    #[instrument(skip_all, fields(files = batch.len(), path = %config.path))]
    pub fn process(
        &self,
        batch: Vec<IncomingFile>,
        config: &UploadConfig,
    ) -> Result<UploadResponse, PipelineError> {
        let mut totals = Batch {
            result: UploadResult::default(),
            first: None,
        };
        let mut thumbnail_upload = None;
        let mut position = 0;

        for incoming in batch {
            let is_thumbnail_field =
                config.thumbnail_field.as_deref() == Some(incoming.field.as_str());

            if is_thumbnail_field {
                // processed once, after every regular field
                if thumbnail_upload.is_none() {
                    thumbnail_upload = Some(incoming);
                }
                continue;
            }

            if !config.fields.includes(&incoming.field) {
                trace!(field = %incoming.field, "Skipping unselected field");
                continue;
            }

            if incoming.is_attempted() {
                totals.result.attempted += 1;
            }

            let index = file_index(config, position, &incoming);
            position += 1;
            let file = self.process_file(incoming, config)?;
            totals.record(index, file);
        }

        if config.thumbnails
            && let Some(incoming) = thumbnail_upload
        {
            if incoming.is_attempted() {
                totals.result.attempted += 1;
            }
            let index = file_index(config, position, &incoming);
            let file = self.process_thumbnail_upload(incoming, config);
            totals.record(index, file);
        }

        info!(
            uploaded = totals.result.uploaded,
            attempted = totals.result.attempted,
            "Upload batch processed"
        );

        if config.single_result
            && let Some(first) = totals.first
            && let Some(file) = totals.result.files.remove(&first)
        {
            return Ok(UploadResponse::Single(Box::new(file)));
        }

        Ok(UploadResponse::Batch(totals.result))
    }

    #[instrument(skip_all, fields(field = %incoming.field, name = %incoming.original_name))]
    fn process_file(
        &self,
        incoming: IncomingFile,
        config: &UploadConfig,
    ) -> Result<FileResult, PipelineError> {
        let mut file = self.resolve(incoming, config, false);

        if config.create_directory {
            self.ensure_directory(&file.target)?;
        }

        // unreadable images measure 0x0 so the minimum bounds still apply
        let measured = if file.is_image {
            Some(
                self.codec
                    .dimensions(&file.incoming.temp_path)
                    .unwrap_or(Dimensions::new(0, 0)),
            )
        } else {
            None
        };

        let exceeded = match self.validate(&file, measured, config) {
            Ok(exceeded) => exceeded,
            Err(failure) => {
                debug!(error = %failure, "File rejected");
                return Ok(self.failed(&file, failure));
            }
        };

        if let Err(failure) = self.persist(&file) {
            return Ok(self.failed(&file, failure));
        }

        if file.is_image {
            if let Some(plan) = decide_resize(config, exceeded) {
                self.resize_stored(&file, plan, config);
            }
            if !file.extension.eq_ignore_ascii_case(&file.original_extension) {
                self.convert_stored(&file, config);
            }
            if config.thumbnails {
                derive_thumbnail(self.storage, self.codec, &file.target, config);
            }
        }

        file.dimensions = self.measure(&file, config);
        let size = self.storage.size(&file.target).unwrap_or(file.incoming.size);

        info!(target = %file.target.display(), size, "File stored");
        Ok(FileResult::stored(&file, size))
    }

    /// Stores the dedicated thumbnail upload at its thumbnail location and
    /// shrinks it to the thumbnail box.
    #[instrument(skip_all, fields(field = %incoming.field, name = %incoming.original_name))]
    fn process_thumbnail_upload(
        &self,
        incoming: IncomingFile,
        config: &UploadConfig,
    ) -> FileResult {
        let mut file = self.resolve(incoming, config, true);

        if !file.is_image {
            return self.failed(&file, UploadError::ImageRequired);
        }

        if let Some(dir) = file.target.parent()
            && !self.storage.is_dir(dir)
            && let Err(e) = self.storage.mkdir(dir, DIRECTORY_PERMISSIONS)
        {
            warn!(error = %e, dir = %dir.display(), "Failed to create thumbnail directory");
            return self.failed(&file, UploadError::General);
        }

        if let Err(failure) = self.persist(&file) {
            return self.failed(&file, failure);
        }

        if let Some(kind) = ImageKind::from_extension(&file.original_extension) {
            match self.codec.decode(&file.target) {
                Ok(image) => {
                    let transform =
                        thumbnail_transform(self.codec.size_of(&image), config.thumbnail_size);
                    let thumbnail = apply_transform(self.codec, image, transform);
                    if let Err(e) = self
                        .codec
                        .encode(&thumbnail, &file.target, kind, config.quality)
                    {
                        warn!(error = %e, "Failed to shrink thumbnail upload");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to decode thumbnail upload"),
            }
        }

        if let Some(dims) = self.codec.dimensions(&file.target) {
            file.dimensions = ImageDimensions {
                w: Some(dims.width),
                h: Some(dims.height),
                tw: Some(dims.width),
                th: Some(dims.height),
            };
        }
        file.thumbnail_url = file.url.clone();

        let size = self.storage.size(&file.target).unwrap_or(file.incoming.size);
        info!(target = %file.target.display(), "Thumbnail upload stored");
        FileResult::stored(&file, size)
    }

    /// Derives names, locations and URLs for an incoming file.
    fn resolve(
        &self,
        incoming: IncomingFile,
        config: &UploadConfig,
        as_thumbnail: bool,
    ) -> ResolvedFile {
        let key = incoming.key_text();
        let subs = Substitutions {
            field: &incoming.field,
            key: &key,
        };

        let mut filename = derive_filename(&incoming.original_name, &config.filename, subs);
        let mut directory = config.path.clone();

        if as_thumbnail && let Some(placement) = &config.thumbnail_placement {
            filename = thumbnail_filename(&filename, placement);
            directory = config.thumbnail_directory();
        }

        let (basename, extension) = split_filename(&filename);
        let original_extension = extension_of(&incoming.original_name)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let is_image = IMAGE_EXTENSIONS.contains(&original_extension.as_str());

        let relative = join_url_path(&directory, &filename);
        let url = public_url(config, &relative);

        let thumbnail_url = match (is_image, &config.thumbnail_placement) {
            (true, Some(placement)) if config.thumbnails => public_url(
                config,
                &join_url_path(
                    &config.thumbnail_directory(),
                    &thumbnail_filename(&filename, placement),
                ),
            ),
            (true, _) => url.clone(),
            (false, _) => config
                .default_thumb
                .as_deref()
                .map(|thumb| public_url(config, thumb))
                .unwrap_or_default(),
        };

        ResolvedFile {
            target: self.root.join(&directory).join(&filename),
            display_name: config.display_name.clone().unwrap_or_else(|| filename.clone()),
            directory: format!("{}/", directory.trim_end_matches('/')),
            filename,
            basename,
            extension,
            original_extension,
            url,
            thumbnail_url,
            is_image,
            dimensions: ImageDimensions::default(),
            incoming,
        }
    }

    fn ensure_directory(&self, target: &Path) -> Result<(), PipelineError> {
        if let Some(dir) = target.parent()
            && !self.storage.is_dir(dir)
        {
            self.storage.mkdir(dir, DIRECTORY_PERMISSIONS)?;
        }
        Ok(())
    }

    /// Runs the ordered checks. On success returns which maximum bounds are
    /// exceeded, for the resize stage.
    fn validate(
        &self,
        file: &ResolvedFile,
        measured: Option<Dimensions>,
        config: &UploadConfig,
    ) -> Result<MaxExceeded, UploadError> {
        let incoming = &file.incoming;

        if self.storage.exists(&file.target) {
            if config.overwrite {
                debug!(target = %file.target.display(), "Overwriting existing file");
                self.storage.delete(&file.target);
            } else {
                return Err(UploadError::FileAlreadyExists {
                    filename: file.filename.clone(),
                });
            }
        }

        let allowed = &config.allowed_types;
        let images_only = allowed.is_images_only();
        if !matches!(allowed, AllowedTypes::Any) {
            if !incoming.is_attempted() {
                return Err(if images_only {
                    UploadError::ImageRequired
                } else {
                    UploadError::FileRequired
                });
            }
            if !allowed.allows(&file.original_extension) {
                return Err(if images_only {
                    UploadError::ImageRequired
                } else {
                    UploadError::FormatsRequired {
                        allowed: allowed.describe(),
                    }
                });
            }
        }

        if let Some(limit) = config.max_file_size
            && limit.is_exceeded_by(incoming.size)
        {
            return Err(UploadError::MaxFileSize {
                threshold: limit.to_string(),
            });
        }

        let Some(actual) = measured.filter(|_| file.is_image) else {
            return Ok(MaxExceeded::default());
        };

        let too_narrow = config.min_width.is_some_and(|min| actual.width < min);
        let too_short = config.min_height.is_some_and(|min| actual.height < min);
        if (too_narrow || too_short)
            && let Some(bound) = bound_of(config.min_width, config.min_height)
        {
            return Err(UploadError::MinImageDimensions { bound, actual });
        }

        let exceeded = MaxExceeded {
            width: config.max_width.is_some_and(|max| actual.width > max),
            height: config.max_height.is_some_and(|max| actual.height > max),
        };
        if exceeded.any()
            && !config.resize_on_max
            && let Some(bound) = bound_of(config.max_width, config.max_height)
        {
            return Err(UploadError::MaxImageDimensions { bound, actual });
        }

        Ok(exceeded)
    }

    /// Moves the staged file into place.
    fn persist(&self, file: &ResolvedFile) -> Result<(), UploadError> {
        let incoming = &file.incoming;

        if !incoming.is_attempted() || incoming.error_code != 0 {
            warn!(error_code = incoming.error_code, "Upload arrived incomplete");
            return Err(UploadError::General);
        }

        self.storage
            .move_file(&incoming.temp_path, &file.target)
            .map_err(|e| {
                warn!(error = %e, "Failed to move upload into place");
                UploadError::General
            })
    }

    /// Resizes the stored image in place, keeping its original format.
    fn resize_stored(&self, file: &ResolvedFile, plan: ResizePlan, config: &UploadConfig) {
        let Some(kind) = ImageKind::from_extension(&file.original_extension) else {
            return;
        };

        let image = match self.codec.decode(&file.target) {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "Failed to decode stored image for resizing");
                return;
            }
        };

        let transform = plan_transform(self.codec.size_of(&image), plan);
        debug!(?plan, output = ?transform.output(), "Resizing stored image");

        let resized = apply_transform(self.codec, image, transform);
        if let Err(e) = self.codec.encode(&resized, &file.target, kind, config.quality) {
            warn!(error = %e, "Failed to write resized image");
        }
    }

    /// Re-encodes the stored image into the format its final extension names.
    fn convert_stored(&self, file: &ResolvedFile, config: &UploadConfig) {
        let from = ImageKind::from_extension(&file.original_extension);
        let to = ImageKind::from_extension(&file.extension);

        let (Some(from), Some(to)) = (from, to) else {
            trace!(extension = %file.extension, "No conversion between these formats");
            return;
        };
        if from == to {
            return;
        }

        match self.codec.decode(&file.target) {
            Ok(image) => {
                debug!(from = ?from, to = ?to, "Converting stored image");
                if let Err(e) = self.codec.encode(&image, &file.target, to, config.quality) {
                    warn!(error = %e, "Failed to convert stored image");
                }
            }
            Err(e) => warn!(error = %e, "Failed to decode stored image for conversion"),
        }
    }

    /// Measures the stored image and its thumbnail, if any.
    fn measure(&self, file: &ResolvedFile, config: &UploadConfig) -> ImageDimensions {
        let mut dims = ImageDimensions::default();
        if !file.is_image {
            return dims;
        }

        if let Some(size) = self.codec.dimensions(&file.target) {
            dims.w = Some(size.width);
            dims.h = Some(size.height);

            let thumbnail: Option<PathBuf> =
                thumbnail_path_for(&file.target, config.thumbnail_placement.as_ref());
            if let Some(thumbnail) = thumbnail.filter(|p| self.storage.exists(p))
                && let Some(thumb) = self.codec.dimensions(&thumbnail)
            {
                dims.tw = Some(thumb.width);
                dims.th = Some(thumb.height);
            }
        }

        dims
    }

    fn failed(&self, file: &ResolvedFile, failure: UploadError) -> FileResult {
        let message = self.translator.upload_error(&failure);
        FileResult::failed(&file.incoming.field, file.incoming.key, failure, message)
    }
}

/// Result key of a file: its field (with the array position for repeated
/// fields), or its position in the batch.
fn file_index(config: &UploadConfig, position: usize, incoming: &IncomingFile) -> FileIndex {
    if !config.field_name_as_index {
        return FileIndex::Position(position);
    }
    match incoming.key {
        Some(key) => FileIndex::Field(format!("{}.{key}", incoming.field)),
        None => FileIndex::Field(incoming.field.clone()),
    }
}

fn bound_of(width: Option<u32>, height: Option<u32>) -> Option<DimensionBound> {
    match (width, height) {
        (Some(width), Some(height)) => Some(DimensionBound::Size { width, height }),
        (Some(width), None) => Some(DimensionBound::Width(width)),
        (None, Some(height)) => Some(DimensionBound::Height(height)),
        (None, None) => None,
    }
}
