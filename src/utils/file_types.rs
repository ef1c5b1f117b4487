//! # File Type Categories
//!
//! Expands a file type specification into the extensions it allows. A
//! specification is either the wildcard `"*"`, a category name such as
//! `"image"`, a pipe-delimited string (`"pdf|image|txt"`) or a list. Category
//! names expand to their configured extensions; anything else passes through
//! as a literal extension.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::utils::constant::IMAGE_EXTENSIONS;

/// Named groups of extensions, keyed by category name.
pub type Categories = BTreeMap<String, Vec<String>>;

/// The built-in categories.
pub fn default_categories() -> Categories {
    let mut categories = Categories::new();
    categories.insert(
        "image".to_string(),
        IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
    );
    categories.insert(
        "vector".to_string(),
        ["svg", "eps", "ai"].iter().map(|e| e.to_string()).collect(),
    );
    categories.insert(
        "audio".to_string(),
        ["mp3", "ogg", "wma", "wav"]
            .iter()
            .map(|e| e.to_string())
            .collect(),
    );
    categories.insert(
        "video".to_string(),
        ["mp4", "avi", "fla", "mov", "wmv"]
            .iter()
            .map(|e| e.to_string())
            .collect(),
    );
    categories
}

/// A file type specification as it appears in settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    Text(String),
    List(Vec<String>),
}

impl TypeSpec {
    fn entries(&self) -> Vec<String> {
        match self {
            TypeSpec::Text(text) => text
                .split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            TypeSpec::List(list) => list.iter().map(|s| s.trim().to_string()).collect(),
        }
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, TypeSpec::Text(text) if text.trim() == "*")
    }

    fn is_image_shorthand(&self) -> bool {
        matches!(self, TypeSpec::Text(text) if matches!(text.trim(), "image" | "images"))
    }
}

impl From<&str> for TypeSpec {
    fn from(value: &str) -> Self {
        TypeSpec::Text(value.to_string())
    }
}

/// The resolved set of allowed extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedTypes {
    /// Every extension is allowed.
    Any,
    /// Only the listed extensions (lowercase, in specification order).
    Only(Vec<String>),
}

impl AllowedTypes {
    /// Returns true when `extension` is allowed (case-insensitive).
    pub fn allows(&self, extension: &str) -> bool {
        match self {
            AllowedTypes::Any => true,
            AllowedTypes::Only(list) => {
                let extension = extension.to_ascii_lowercase();
                list.iter().any(|allowed| *allowed == extension)
            }
        }
    }

    /// Returns true when the allowed set is exactly the raster image set.
    ///
    /// Used to pick the "image required" message over the generic one.
    pub fn is_images_only(&self) -> bool {
        match self {
            AllowedTypes::Any => false,
            AllowedTypes::Only(list) => {
                let mut sorted: Vec<&str> = list.iter().map(String::as_str).collect();
                sorted.sort_unstable();
                sorted.dedup();
                let mut images = IMAGE_EXTENSIONS.to_vec();
                images.sort_unstable();
                sorted == images
            }
        }
    }

    /// Comma separated list for messages.
    pub fn describe(&self) -> String {
        match self {
            AllowedTypes::Any => "*".to_string(),
            AllowedTypes::Only(list) => list.join(", "),
        }
    }
}

/// Expands a specification against the given categories.
///
/// `"image"` and `"images"` always mean the fixed raster image set, regardless
/// of what the categories table holds.
pub fn resolve_types(spec: &TypeSpec, categories: &Categories) -> AllowedTypes {
    if spec.is_wildcard() {
        return AllowedTypes::Any;
    }

    if spec.is_image_shorthand() {
        return AllowedTypes::Only(IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect());
    }

    let mut resolved: Vec<String> = Vec::new();
    for entry in spec.entries() {
        match categories.get(&entry) {
            Some(extensions) => {
                resolved.extend(extensions.iter().map(|e| e.to_ascii_lowercase()));
            }
            None => resolved.push(entry.to_ascii_lowercase()),
        }
    }

    AllowedTypes::Only(resolved)
}

/// Returns the extension of `filename` (text after the last dot), if any.
///
/// A leading dot alone (`".env"`) does not count as an extension.
pub fn extension_of(filename: &str) -> Option<&str> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 == name.len() => None,
        Some(idx) => Some(&name[idx + 1..]),
    }
}

/// Returns true when `filename` has a raster image extension.
pub fn is_raster_image(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| {
        let ext = ext.to_ascii_lowercase();
        IMAGE_EXTENSIONS.contains(&ext.as_str())
    })
}

/// Returns true when `filename` has an image extension, vector images included.
pub fn is_image(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| {
        let ext = ext.to_ascii_lowercase();
        crate::utils::constant::DISPLAY_IMAGE_EXTENSIONS.contains(&ext.as_str())
    })
}
