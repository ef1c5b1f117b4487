//! # Message Translation
//!
//! Failures carry a message key plus named parameters; a [`Translator`] turns
//! them into text. [`Messages`] is a plain key to template table where
//! `:name` placeholders are replaced by parameter values.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::models::{CropError, UploadError};

/// Renders a message key with its parameters.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String;

    /// Renders a per-file failure.
    ///
    /// Dimension failures get the measured size appended as a second sentence.
    fn upload_error(&self, error: &UploadError) -> String {
        let mut message = self.translate(error.key(), &error.params());
        if let Some(actual) = error.actual_dimensions() {
            let params = [
                ("width", actual.width.to_string()),
                ("height", actual.height.to_string()),
            ];
            message.push(' ');
            message.push_str(&self.translate("image_size_actual", &params));
        }
        message
    }

    fn crop_error(&self, error: &CropError) -> String {
        self.translate(error.key(), &error.params())
    }
}

/// Template table keyed by message key.
#[derive(Debug, Clone)]
pub struct Messages {
    templates: HashMap<String, String>,
}

const ENGLISH: &[(&str, &str)] = &[
    ("general", "Something went wrong. Please try again."),
    ("file_not_found", "The file specified was not found (:filename)."),
    ("file_not_image", "The file specified was not an image (:filename)."),
    ("file_already_exists", "A file already exists with the name specified (:filename)."),
    ("directory_not_found", "The directory specified does not exist (:path)."),
    ("file_required", "You must upload a file."),
    ("image_required", "You must upload an image file."),
    ("formats_required", "You must upload a file in one of the following formats: :formats."),
    ("max_file_size", "Your file must not exceed :maxFileSize."),
    ("min_image_size", "Your image must be at least :minWidth x :minHeight."),
    ("min_image_width", "Your image must be at least :minWidth pixels in width."),
    ("min_image_height", "Your image must be at least :minHeight pixels in height."),
    ("max_image_size", "Your image must be :maxWidth x :maxHeight or less."),
    ("max_image_width", "Your image must be :maxWidth pixels in width or less."),
    ("max_image_height", "Your image must be :maxHeight pixels in height or less."),
    ("image_size_actual", "Your uploaded image dimensions were :width x :height."),
];

impl Messages {
    /// The built-in English messages.
    pub fn english() -> Self {
        Self {
            templates: ENGLISH
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Builds a table from a flat JSON object of `key: template` pairs.
    /// Keys missing from `value` fall back to English.
    pub fn from_json(value: &Value) -> Result<Self, serde_json::Error> {
        let overrides: HashMap<String, String> = serde_json::from_value(value.clone())?;
        Ok(Self::english().with_overrides(overrides))
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.templates.extend(overrides);
        self
    }

    pub fn template(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::english()
    }
}

impl Translator for Messages {
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String {
        let Some(template) = self.templates.get(key) else {
            warn!(key, "Missing message template");
            return key.to_string();
        };

        // longest names first so `:minWidth` is never split by a shorter name
        let mut params: Vec<&(&str, String)> = params.iter().collect();
        params.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));

        params
            .into_iter()
            .fold(template.clone(), |text, (name, value)| {
                text.replace(&format!(":{name}"), value)
            })
    }
}

