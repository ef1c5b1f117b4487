//! # Filename Policy
//!
//! Derives the final, filesystem-safe name of an uploaded file from its
//! original name and the configured naming strategy.
//!
//! Every strategy except [`FilenameStrategy::Random`] is deterministic: the
//! same input always yields the same name.

use std::sync::LazyLock;

use rand::{Rng, distr::Alphanumeric};
use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::utils::{constant::RANDOM_FILENAME_LENGTH, file_types::extension_of};

/// Any run of characters other than ASCII letters, digits and dots.
static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.a-zA-Z0-9]+").expect("Failed to compile filename regex"));

/// How an uploaded file is renamed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilenameStrategy {
    /// The sanitized original name.
    #[default]
    Verbatim,
    Lowercase,
    /// Spaces and dashes become underscores.
    Underscored,
    LowercaseUnderscored,
    /// Spaces and underscores become dashes.
    Dashed,
    LowercaseDashed,
    /// A random alphanumeric token unrelated to the original name.
    Random,
    /// A literal name; `[FIELD]`, `[KEY]` and `.ext` are substituted.
    Template(String),
}

impl FilenameStrategy {
    /// Maps the settings spelling (`"[LOWERCASE-DASHED]"`, a template, or
    /// nothing) to a strategy.
    pub fn from_setting(setting: Option<&str>) -> Self {
        match setting.map(str::trim) {
            None | Some("") => FilenameStrategy::Verbatim,
            Some("[LOWERCASE]") => FilenameStrategy::Lowercase,
            Some("[UNDERSCORED]") => FilenameStrategy::Underscored,
            Some("[LOWERCASE-UNDERSCORED]") => FilenameStrategy::LowercaseUnderscored,
            Some("[DASHED]") => FilenameStrategy::Dashed,
            Some("[LOWERCASE-DASHED]") => FilenameStrategy::LowercaseDashed,
            Some("[RANDOM]") => FilenameStrategy::Random,
            Some(template) => FilenameStrategy::Template(template.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for FilenameStrategy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Setting {
            Flag(bool),
            Name(String),
        }

        // `false` and `null` both select the sanitized original name
        match Option::<Setting>::deserialize(deserializer)? {
            None | Some(Setting::Flag(false)) => Ok(FilenameStrategy::Verbatim),
            Some(Setting::Flag(true)) => Err(serde::de::Error::custom(
                "filename must be false, null, a strategy or a template",
            )),
            Some(Setting::Name(name)) => Ok(FilenameStrategy::from_setting(Some(&name))),
        }
    }
}

/// Values substituted into template names.
#[derive(Debug, Clone, Copy)]
pub struct Substitutions<'a> {
    pub field: &'a str,
    pub key: &'a str,
}

impl Substitutions<'_> {
    pub const NONE: Substitutions<'static> = Substitutions { field: "", key: "" };
}

/// Replaces accented Latin characters with their unaccented ASCII letter.
pub fn transliterate(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
            'Ç' => 'C',
            'È' | 'É' | 'Ê' | 'Ë' => 'E',
            'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
            'Ý' => 'Y',
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'ç' => 'c',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ð' | 'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'ý' | 'ÿ' => 'y',
            other => other,
        })
        .collect()
}

/// Transliterates, then collapses every unsafe run into one underscore.
pub fn sanitize(name: &str) -> String {
    UNSAFE_RUN
        .replace_all(&transliterate(name), "_")
        .into_owned()
}

/// Derives the final filename for an upload.
///
/// If the derived name has no extension, the original file's extension is
/// appended (with `jpeg` normalized to `jpg`).
///
/// # Examples
///
/// ```
/// use intake::utils::filename::{FilenameStrategy, Substitutions, derive_filename};
///
/// let strategy = FilenameStrategy::LowercaseDashed;
/// let name = derive_filename("Été à Paris.JPG", &strategy, Substitutions::NONE);
/// assert_eq!(name, "ete-a-paris.jpg");
/// ```
pub fn derive_filename(
    original: &str,
    strategy: &FilenameStrategy,
    subs: Substitutions<'_>,
) -> String {
    let original_extension = extension_of(original).unwrap_or("").to_string();

    let mut filename = match strategy {
        FilenameStrategy::Verbatim => sanitize(original),
        FilenameStrategy::Lowercase => sanitize(original).to_lowercase(),
        FilenameStrategy::Underscored => sanitize(original).replace([' ', '-'], "_"),
        FilenameStrategy::LowercaseUnderscored => {
            sanitize(original).replace([' ', '-'], "_").to_lowercase()
        }
        FilenameStrategy::Dashed => sanitize(original).replace([' ', '_'], "-"),
        FilenameStrategy::LowercaseDashed => {
            sanitize(original).replace([' ', '_'], "-").to_lowercase()
        }
        FilenameStrategy::Random => random_token(),
        FilenameStrategy::Template(template) => {
            let substituted = template
                .replace("[KEY]", subs.key)
                .replace("[FIELD]", subs.field);
            let mut name = sanitize(&substituted);
            if let Some(stem) = name.strip_suffix(".ext") {
                name = if original_extension.is_empty() {
                    stem.to_string()
                } else {
                    format!("{stem}.{original_extension}")
                };
            }
            name
        }
    };

    if extension_of(&filename).is_none() && !original_extension.is_empty() {
        filename.push('.');
        filename.push_str(&normalize_extension(&original_extension));
    }

    filename
}

/// Lowercases an extension and maps `jpeg` to `jpg`.
pub fn normalize_extension(extension: &str) -> String {
    let lower = extension.to_ascii_lowercase();
    if lower == "jpeg" { "jpg".to_string() } else { lower }
}

/// Splits a filename into its base name and extension.
///
/// ```
/// use intake::utils::filename::split_filename;
///
/// assert_eq!(split_filename("photo.small.png"), ("photo.small".to_string(), "png".to_string()));
/// assert_eq!(split_filename("README"), ("README".to_string(), String::new()));
/// ```
pub fn split_filename(filename: &str) -> (String, String) {
    match extension_of(filename) {
        Some(ext) => {
            let base = &filename[..filename.len() - ext.len() - 1];
            (base.to_string(), ext.to_string())
        }
        None => (filename.to_string(), String::new()),
    }
}

/// Inserts `suffix` before the extension: `photo.jpg` becomes `photo-small.jpg`.
pub fn insert_suffix(filename: &str, suffix: &str) -> String {
    let (base, ext) = split_filename(filename);
    if ext.is_empty() {
        format!("{base}{suffix}")
    } else {
        format!("{base}{suffix}.{ext}")
    }
}

/// Converts a URL-friendly name back to a filename: the last underscore
/// becomes the extension dot, so `my_photo_jpg` becomes `my_photo.jpg`.
pub fn uri_to_filename(uri: &str) -> String {
    match uri.rsplit_once('_') {
        Some((base, ext)) => format!("{base}.{ext}"),
        None => uri.to_string(),
    }
}

fn random_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_FILENAME_LENGTH)
        .map(char::from)
        .collect()
}
