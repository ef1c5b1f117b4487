//! # Resize Geometry
//!
//! Pure dimension arithmetic for resizing, center-cropping and thumbnailing.
//! Nothing here touches pixels; the pipeline turns a [`Transform`] into codec
//! calls.

use serde::{Deserialize, Serialize};

use crate::utils::constant::CROP_OVERSCALE;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exact aspect ratio comparison without floating point.
    pub fn same_aspect_as(&self, other: Dimensions) -> bool {
        u64::from(self.width) * u64::from(other.height)
            == u64::from(self.height) * u64::from(other.width)
    }
}

/// How a resize treats the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Fit the width (or the whole box when both sides are bounded).
    #[default]
    Landscape,
    /// Fit the height (or the whole box when both sides are bounded).
    Portrait,
    /// Overscale to cover the box, then trim to it exactly.
    Crop,
}

/// A resize box; `None` leaves that side unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeTarget {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ResizeTarget {
    pub fn exact(dimensions: Dimensions) -> Self {
        Self {
            width: Some(dimensions.width),
            height: Some(dimensions.height),
        }
    }

    fn both(&self) -> Option<Dimensions> {
        Some(Dimensions::new(self.width?, self.height?))
    }
}

/// A decided resize: where to and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub target: ResizeTarget,
    pub mode: ResizeMode,
}

/// A rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
}

/// The concrete operations that realize a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Resample to exactly these dimensions.
    Scale(Dimensions),
    /// Resample to `scaled`, then cut out `crop`.
    ScaleThenCrop { scaled: Dimensions, crop: CropRect },
}

impl Transform {
    /// Dimensions of the image the transform produces.
    pub fn output(&self) -> Dimensions {
        match self {
            Transform::Scale(dims) => *dims,
            Transform::ScaleThenCrop { crop, .. } => Dimensions::new(crop.width, crop.height),
        }
    }
}

/// Scales `source` preserving its aspect ratio.
///
/// With both sides bounded the result fits inside the box; with one side
/// bounded that side is matched exactly and the other follows.
pub fn fit(source: Dimensions, target: ResizeTarget) -> Dimensions {
    if source.is_empty() {
        return Dimensions::new(
            target.width.unwrap_or(source.width),
            target.height.unwrap_or(source.height),
        );
    }

    let (w, h) = (f64::from(source.width), f64::from(source.height));
    match (target.width, target.height) {
        (Some(tw), Some(th)) => {
            let scale = (f64::from(tw) / w).min(f64::from(th) / h);
            Dimensions::new(scaled(w, scale), scaled(h, scale))
        }
        (Some(tw), None) => Dimensions::new(tw, scaled(h, f64::from(tw) / w)),
        (None, Some(th)) => Dimensions::new(scaled(w, f64::from(th) / h), th),
        (None, None) => source,
    }
}

/// Scales `source` to cover `target` enlarged by `overscale`, then centers a
/// crop of exactly `target`.
pub fn cover_crop(source: Dimensions, target: Dimensions, overscale: f64) -> Transform {
    if source.is_empty() || target.is_empty() {
        return Transform::Scale(target);
    }

    let (w, h) = (f64::from(source.width), f64::from(source.height));
    let scale =
        (f64::from(target.width) * overscale / w).max(f64::from(target.height) * overscale / h);

    let scaled = Dimensions::new(
        ((w * scale).ceil() as u32).max(target.width),
        ((h * scale).ceil() as u32).max(target.height),
    );

    Transform::ScaleThenCrop {
        scaled,
        crop: CropRect {
            x: (scaled.width - target.width) / 2,
            y: (scaled.height - target.height) / 2,
            width: target.width,
            height: target.height,
        },
    }
}

/// Turns a resize plan into concrete operations for an image of `source` size.
pub fn plan_transform(source: Dimensions, plan: ResizePlan) -> Transform {
    match (plan.mode, plan.target.both()) {
        (ResizeMode::Crop, Some(target)) => cover_crop(source, target, CROP_OVERSCALE),
        _ => Transform::Scale(fit(source, plan.target)),
    }
}

/// Operations producing a thumbnail of exactly `thumb` dimensions.
///
/// Sources already in the thumbnail's aspect ratio are scaled straight down;
/// anything else is overscaled and center-cropped.
pub fn thumbnail_transform(source: Dimensions, thumb: Dimensions) -> Transform {
    if !source.is_empty() && source.same_aspect_as(thumb) {
        Transform::Scale(thumb)
    } else {
        cover_crop(source, thumb, CROP_OVERSCALE)
    }
}

fn scaled(side: f64, scale: f64) -> u32 {
    ((side * scale).round() as u32).max(1)
}
