//! # Upload Configuration
//!
//! Settings are kept as a nested JSON document so that defaults, a settings
//! file and per-call overrides can be merged key by key. The merged document
//! is then deserialized (unknown keys rejected), validated and normalized
//! into an [`UploadConfig`] that the pipelines consume.

use std::{
    fs, io,
    path::{Component, Path},
};

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, instrument};
use validator::{Validate, ValidationError};

use crate::utils::{
    file_types::{AllowedTypes, Categories, TypeSpec, default_categories, resolve_types},
    filename::FilenameStrategy,
    geometry::{Dimensions, ResizeMode},
    size::{SizeLimit, SizeParseError, parse_max_size},
};

/// Errors raised while building an [`UploadConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings must be a JSON object")]
    NotAnObject,

    #[error("invalid settings: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("invalid max_file_size: {0}")]
    MaxFileSize(#[from] SizeParseError),

    #[error("invalid pixel bound for {field}: {value}")]
    InvalidPixels { field: &'static str, value: String },

    #[error("thumbnails_directory and thumbnails_suffix cannot both be set")]
    ConflictingThumbnailPlacement,

    #[error("failed to read settings file: {0}")]
    Io(#[from] io::Error),
}

/// The built-in settings document.
pub fn default_settings() -> Value {
    json!({
        "path": "uploads",
        "fields": true,
        "field_thumb": "thumbnail_image",
        "create_directory": false,
        "filename": null,
        "overwrite": false,
        "no_cache_url": true,
        "base_url": "",
        "file_types": "*",
        "max_file_size": false,
        "image_min_width": false,
        "image_min_height": false,
        "image_max_width": false,
        "image_max_height": false,
        "image_resize": false,
        "image_resize_max": false,
        "image_resize_default_type": "landscape",
        "image_resize_quality": 75,
        "image_thumb": false,
        "image_crop": false,
        "image_crop_thumb": true,
        "image_crop_delete_original": true,
        "image_dimensions": { "w": 1024, "h": 768, "tw": 180, "th": 180 },
        "display_name": false,
        "default_thumb": "default-thumb-upload.png",
        "return_single_result": false,
        "field_name_as_file_index": true,
        "thumbnails_directory": null,
        "thumbnails_suffix": "-small",
        "file_type_categories": default_categories(),
    })
}

/// Merges `overlay` into `base`.
///
/// Objects merge recursively key by key; any other overlay value replaces the
/// base value.
pub fn merge_settings(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_settings(existing, value)
                    }
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Reads a JSON settings document from disk.
pub fn load_settings(path: &Path) -> Result<Value, ConfigError> {
    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    if !value.is_object() {
        return Err(ConfigError::NotAnObject);
    }
    Ok(value)
}

/// Which multipart fields are processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelection {
    All,
    Only(Vec<String>),
}

impl FieldSelection {
    pub fn includes(&self, field: &str) -> bool {
        match self {
            FieldSelection::All => true,
            FieldSelection::Only(fields) => fields.iter().any(|f| f == field),
        }
    }
}

/// Where thumbnails are written relative to their source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailPlacement {
    /// A sibling directory holding a file of the same name.
    Directory(String),
    /// Beside the source, with the suffix inserted before the extension.
    Suffix(String),
}

/// Normalized, validated upload configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadConfig {
    /// Target directory, relative to the storage root.
    pub path: String,
    pub fields: FieldSelection,
    /// Field carrying a dedicated thumbnail upload.
    pub thumbnail_field: Option<String>,
    pub create_directory: bool,
    pub filename: FilenameStrategy,
    pub overwrite: bool,
    pub no_cache_url: bool,
    pub base_url: String,
    pub allowed_types: AllowedTypes,
    pub max_file_size: Option<SizeLimit>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub resize: bool,
    /// Shrink oversized images instead of rejecting them.
    pub resize_on_max: bool,
    pub default_mode: ResizeMode,
    pub quality: u8,
    pub thumbnails: bool,
    pub crop: bool,
    pub crop_thumbnail: bool,
    pub crop_delete_original: bool,
    pub resize_to: Dimensions,
    pub thumbnail_size: Dimensions,
    pub display_name: Option<String>,
    pub default_thumb: Option<String>,
    pub single_result: bool,
    pub field_name_as_index: bool,
    pub thumbnail_placement: Option<ThumbnailPlacement>,
    pub categories: Categories,
}

impl UploadConfig {
    /// Merges `overrides` over `base` and builds the configuration.
    ///
    /// Setting one thumbnail placement in `overrides` without mentioning the
    /// other clears the other, so switching from suffix to directory does not
    /// need an explicit `null`.
    #[instrument(skip_all)]
    pub fn from_settings(base: Value, overrides: Value) -> Result<Self, ConfigError> {
        if !base.is_object() || !(overrides.is_object() || overrides.is_null()) {
            return Err(ConfigError::NotAnObject);
        }

        let mut merged = base;
        if let Value::Object(overrides) = overrides {
            let cleared = placement_cleared_by(&overrides);
            merge_settings(&mut merged, Value::Object(overrides));
            if let (Some(key), Value::Object(map)) = (cleared, &mut merged) {
                map.insert(key.to_string(), Value::Null);
            }
        }

        let raw: RawUploadConfig = serde_json::from_value(merged)?;
        raw.validate()?;
        let config = raw.normalize()?;

        debug!(
            path = %config.path,
            thumbnails = config.thumbnails,
            resize = config.resize,
            "Upload configuration resolved"
        );
        Ok(config)
    }

    /// The defaults with `overrides` applied.
    pub fn with_overrides(overrides: Value) -> Result<Self, ConfigError> {
        Self::from_settings(default_settings(), overrides)
    }

    /// The directory thumbnails are written to, relative to the storage root.
    pub fn thumbnail_directory(&self) -> String {
        match &self.thumbnail_placement {
            Some(ThumbnailPlacement::Directory(dir)) => join_url_path(&self.path, dir),
            _ => self.path.clone(),
        }
    }
}

/// The default configuration, equal to building from [`default_settings`]
/// with no overrides.
pub fn default_upload_config() -> UploadConfig {
    UploadConfig::default()
}

fn placement_cleared_by(overrides: &Map<String, Value>) -> Option<&'static str> {
    let set = |key: &str| overrides.get(key).is_some_and(|v| !is_disabled(v));
    match (
        set("thumbnails_directory"),
        set("thumbnails_suffix"),
        overrides.contains_key("thumbnails_directory"),
        overrides.contains_key("thumbnails_suffix"),
    ) {
        (true, _, _, false) => Some("thumbnails_suffix"),
        (_, true, false, _) => Some("thumbnails_directory"),
        _ => None,
    }
}

fn is_disabled(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false))
}

/// Joins two relative path fragments with a single slash.
pub(crate) fn join_url_path(left: &str, right: &str) -> String {
    let left = left.trim_end_matches('/');
    let right = right.trim_start_matches('/');
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{left}/{right}"),
    }
}

/// Settings exactly as written, before normalization.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
struct RawUploadConfig {
    #[validate(length(min = 1), custom(function = "validate_relative_path"))]
    path: String,
    fields: FieldsSetting,
    #[serde(deserialize_with = "optional_text")]
    field_thumb: Option<String>,
    create_directory: bool,
    filename: FilenameStrategy,
    overwrite: bool,
    no_cache_url: bool,
    #[serde(default, deserialize_with = "optional_text")]
    base_url: Option<String>,
    file_types: TypeSpec,
    max_file_size: Option<NumberSetting>,
    image_min_width: Option<NumberSetting>,
    image_min_height: Option<NumberSetting>,
    image_max_width: Option<NumberSetting>,
    image_max_height: Option<NumberSetting>,
    image_resize: bool,
    image_resize_max: bool,
    image_resize_default_type: ResizeMode,
    #[validate(range(max = 100))]
    image_resize_quality: u8,
    image_thumb: bool,
    image_crop: bool,
    image_crop_thumb: bool,
    image_crop_delete_original: bool,
    #[validate(nested)]
    image_dimensions: RawDimensions,
    #[serde(deserialize_with = "optional_text")]
    display_name: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    default_thumb: Option<String>,
    return_single_result: bool,
    field_name_as_file_index: bool,
    #[serde(deserialize_with = "optional_text")]
    #[validate(custom(function = "validate_relative_path"))]
    thumbnails_directory: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    thumbnails_suffix: Option<String>,
    file_type_categories: Categories,
}

/// Directories are resolved under the storage root and must stay inside it.
fn validate_relative_path(path: &str) -> Result<(), ValidationError> {
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ValidationError::new("relative_path")
            .with_message("must be a relative path inside the upload root".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
struct RawDimensions {
    #[validate(range(min = 1))]
    w: u32,
    #[validate(range(min = 1))]
    h: u32,
    #[validate(range(min = 1))]
    tw: u32,
    #[validate(range(min = 1))]
    th: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldsSetting {
    All(bool),
    One(String),
    Many(Vec<String>),
}

/// A limit written as `false`, a number or a string such as `"200px"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberSetting {
    Flag(bool),
    Number(u64),
    Text(String),
}

impl RawUploadConfig {
    fn normalize(self) -> Result<UploadConfig, ConfigError> {
        let thumbnail_placement = match (self.thumbnails_directory, self.thumbnails_suffix) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingThumbnailPlacement),
            (Some(dir), None) => Some(ThumbnailPlacement::Directory(dir)),
            (None, Some(suffix)) => Some(ThumbnailPlacement::Suffix(suffix)),
            (None, None) => None,
        };

        let fields = match self.fields {
            FieldsSetting::All(true) => FieldSelection::All,
            FieldsSetting::All(false) => FieldSelection::Only(Vec::new()),
            FieldsSetting::One(field) => FieldSelection::Only(vec![field]),
            FieldsSetting::Many(fields) => FieldSelection::Only(fields),
        };

        let max_file_size = match self.max_file_size {
            None | Some(NumberSetting::Flag(false)) => None,
            Some(NumberSetting::Flag(true)) => {
                return Err(SizeParseError::Invalid("true".to_string()).into());
            }
            Some(NumberSetting::Number(bytes)) => Some(SizeLimit::from_bytes(bytes)),
            Some(NumberSetting::Text(text)) => Some(parse_max_size(&text)?),
        };

        Ok(UploadConfig {
            allowed_types: resolve_types(&self.file_types, &self.file_type_categories),
            path: self.path,
            fields,
            thumbnail_field: self.field_thumb,
            create_directory: self.create_directory,
            filename: self.filename,
            overwrite: self.overwrite,
            no_cache_url: self.no_cache_url,
            base_url: self.base_url.unwrap_or_default(),
            max_file_size,
            min_width: pixels("image_min_width", self.image_min_width)?,
            min_height: pixels("image_min_height", self.image_min_height)?,
            max_width: pixels("image_max_width", self.image_max_width)?,
            max_height: pixels("image_max_height", self.image_max_height)?,
            resize: self.image_resize,
            resize_on_max: self.image_resize_max,
            default_mode: self.image_resize_default_type,
            quality: self.image_resize_quality,
            thumbnails: self.image_thumb,
            crop: self.image_crop,
            crop_thumbnail: self.image_crop_thumb,
            crop_delete_original: self.image_crop_delete_original,
            resize_to: Dimensions::new(self.image_dimensions.w, self.image_dimensions.h),
            thumbnail_size: Dimensions::new(self.image_dimensions.tw, self.image_dimensions.th),
            display_name: self.display_name,
            default_thumb: self.default_thumb,
            single_result: self.return_single_result,
            field_name_as_index: self.field_name_as_file_index,
            thumbnail_placement,
            categories: self.file_type_categories,
        })
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        UploadConfig {
            path: "uploads".to_string(),
            fields: FieldSelection::All,
            thumbnail_field: Some("thumbnail_image".to_string()),
            create_directory: false,
            filename: FilenameStrategy::Verbatim,
            overwrite: false,
            no_cache_url: true,
            base_url: String::new(),
            allowed_types: AllowedTypes::Any,
            max_file_size: None,
            min_width: None,
            min_height: None,
            max_width: None,
            max_height: None,
            resize: false,
            resize_on_max: false,
            default_mode: ResizeMode::Landscape,
            quality: 75,
            thumbnails: false,
            crop: false,
            crop_thumbnail: true,
            crop_delete_original: true,
            resize_to: Dimensions::new(1024, 768),
            thumbnail_size: Dimensions::new(180, 180),
            display_name: None,
            default_thumb: Some("default-thumb-upload.png".to_string()),
            single_result: false,
            field_name_as_index: true,
            thumbnail_placement: Some(ThumbnailPlacement::Suffix("-small".to_string())),
            categories: default_categories(),
        }
    }
}

/// `false`, `0` and `null` disable a pixel bound; `"200px"` means 200.
fn pixels(field: &'static str, setting: Option<NumberSetting>) -> Result<Option<u32>, ConfigError> {
    let invalid = |value: String| ConfigError::InvalidPixels { field, value };

    let value = match setting {
        None | Some(NumberSetting::Flag(false)) => return Ok(None),
        Some(NumberSetting::Flag(true)) => return Err(invalid("true".to_string())),
        Some(NumberSetting::Number(n)) => u32::try_from(n).map_err(|_| invalid(n.to_string()))?,
        Some(NumberSetting::Text(text)) => {
            let lower = text.trim().to_ascii_lowercase();
            lower
                .trim_end_matches("px")
                .trim()
                .parse::<u32>()
                .map_err(|_| invalid(text))?
        }
    };

    Ok((value > 0).then_some(value))
}

/// `false`, `null` and `""` all mean "not set".
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Flag(bool),
        Value(String),
    }

    match Option::<Text>::deserialize(deserializer)? {
        None | Some(Text::Flag(false)) => Ok(None),
        Some(Text::Flag(true)) => Err(serde::de::Error::custom("expected a string, false or null")),
        Some(Text::Value(text)) if text.is_empty() => Ok(None),
        Some(Text::Value(text)) => Ok(Some(text)),
    }
}
