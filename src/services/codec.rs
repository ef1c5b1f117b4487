//! # Image Codec Capability
//!
//! Decoding, measuring, resampling and encoding images is delegated to an
//! [`ImageCodec`]. [`ImageCrateCodec`] implements it with the `image` crate.

use std::{
    fs::File,
    io::{self, BufWriter},
    path::Path,
};

use image::{
    DynamicImage, ImageFormat, ImageReader, codecs::jpeg::JpegEncoder, imageops::FilterType,
};
use thiserror::Error;
use tracing::{debug, trace};

use crate::utils::geometry::{CropRect, Dimensions, Transform};

/// Errors that can occur while decoding or encoding images
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// The raster formats the pipeline reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    /// Maps an extension (`jpg`, `JPEG`, `png`, `gif`) to its format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "gif" => Some(ImageKind::Gif),
            _ => None,
        }
    }

    fn format(self) -> ImageFormat {
        match self {
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Gif => ImageFormat::Gif,
        }
    }
}

/// Image decode/resize/encode abstraction.
///
/// The pipeline only ever works with the codec's own image handle type, so
/// test doubles and alternative backends can be swapped in freely.
pub trait ImageCodec: Send + Sync {
    /// Decoded image handle.
    type Image;

    /// Decodes the image stored at `path`.
    fn decode(&self, path: &Path) -> Result<Self::Image, CodecError>;

    /// Reads the dimensions of the image at `path` without decoding it fully.
    /// Returns `None` when the file is missing or not a readable image.
    fn dimensions(&self, path: &Path) -> Option<Dimensions>;

    /// Dimensions of a decoded image.
    fn size_of(&self, image: &Self::Image) -> Dimensions;

    /// Resamples to `width` x `height`. With `preserve_aspect` the result fits
    /// inside that box instead of matching it exactly.
    fn resize(
        &self,
        image: Self::Image,
        width: u32,
        height: u32,
        preserve_aspect: bool,
    ) -> Self::Image;

    /// Cuts out a rectangle, clamped to the image bounds.
    fn crop_rect(&self, image: Self::Image, rect: CropRect) -> Self::Image;

    /// Encodes to `path` in `kind`. `quality` (0-100) applies to lossy formats.
    fn encode(
        &self,
        image: &Self::Image,
        path: &Path,
        kind: ImageKind,
        quality: u8,
    ) -> Result<(), CodecError>;
}

/// Runs a planned [`Transform`] through a codec.
pub fn apply_transform<C: ImageCodec>(
    codec: &C,
    image: C::Image,
    transform: Transform,
) -> C::Image {
    match transform {
        Transform::Scale(dims) => codec.resize(image, dims.width, dims.height, false),
        Transform::ScaleThenCrop { scaled, crop } => {
            let image = codec.resize(image, scaled.width, scaled.height, false);
            codec.crop_rect(image, crop)
        }
    }
}

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCodec for ImageCrateCodec {
    type Image = DynamicImage;

    fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError> {
        trace!(path = %path.display(), "Decoding image");
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        Ok(image)
    }

    fn dimensions(&self, path: &Path) -> Option<Dimensions> {
        let (width, height) = ImageReader::open(path)
            .ok()?
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()?;
        Some(Dimensions::new(width, height))
    }

    fn size_of(&self, image: &DynamicImage) -> Dimensions {
        Dimensions::new(image.width(), image.height())
    }

    fn resize(
        &self,
        image: DynamicImage,
        width: u32,
        height: u32,
        preserve_aspect: bool,
    ) -> DynamicImage {
        trace!(
            from_width = image.width(),
            from_height = image.height(),
            width,
            height,
            preserve_aspect,
            "Resizing image"
        );

        // Resize using the Lanczos3 filter
        if preserve_aspect {
            image.resize(width, height, FilterType::Lanczos3)
        } else {
            image.resize_exact(width, height, FilterType::Lanczos3)
        }
    }

    fn crop_rect(&self, image: DynamicImage, rect: CropRect) -> DynamicImage {
        image.crop_imm(rect.x, rect.y, rect.width, rect.height)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        path: &Path,
        kind: ImageKind,
        quality: u8,
    ) -> Result<(), CodecError> {
        debug!(path = %path.display(), format = ?kind, quality, "Encoding image");

        match kind {
            ImageKind::Jpeg => {
                let writer = BufWriter::new(File::create(path)?);
                let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
                // JPEG has no alpha channel
                DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
            }
            ImageKind::Png => {
                image.save_with_format(path, kind.format())?;
            }
            ImageKind::Gif => {
                DynamicImage::ImageRgba8(image.to_rgba8()).save_with_format(path, kind.format())?;
            }
        }

        Ok(())
    }
}
