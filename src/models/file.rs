use std::path::PathBuf;

use serde::Serialize;

/// One file from an upload batch, as handed over by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    /// Form field the file arrived under.
    pub field: String,
    /// Position within an array-style field (`photos[]`), if any.
    pub key: Option<usize>,
    /// Client-supplied filename, trimmed. Empty when no file was chosen.
    pub original_name: String,
    pub mime_type: Option<String>,
    /// Where the transport staged the bytes.
    pub temp_path: PathBuf,
    pub size: u64,
    /// Transport error code, `0` when the upload arrived intact.
    pub error_code: u32,
}

impl IncomingFile {
    pub fn new(
        field: impl Into<String>,
        original_name: impl Into<String>,
        temp_path: impl Into<PathBuf>,
        size: u64,
    ) -> Self {
        Self {
            field: field.into(),
            key: None,
            original_name: original_name.into().trim().to_string(),
            mime_type: None,
            temp_path: temp_path.into(),
            size,
            error_code: 0,
        }
    }

    pub fn with_key(mut self, key: usize) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_error_code(mut self, code: u32) -> Self {
        self.error_code = code;
        self
    }

    /// Returns true when the client actually selected a file.
    pub fn is_attempted(&self) -> bool {
        !self.original_name.is_empty()
    }

    /// The key used for `[KEY]` substitution: the array position, or `0`.
    pub fn key_text(&self) -> String {
        self.key.unwrap_or(0).to_string()
    }
}

/// Measured dimensions of an image and of its thumbnail.
///
/// Unknown values serialize as `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImageDimensions {
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub tw: Option<u32>,
    pub th: Option<u32>,
}

/// An [`IncomingFile`] plus everything derived for it while it moves through
/// the pipeline.
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub incoming: IncomingFile,
    /// Final filename on disk.
    pub filename: String,
    pub basename: String,
    /// Final extension, as derived (may differ from the original).
    pub extension: String,
    /// Lowercased extension of the client filename.
    pub original_extension: String,
    pub display_name: String,
    /// Directory, relative to the storage root, with a trailing slash.
    pub directory: String,
    /// Absolute location on storage.
    pub target: PathBuf,
    pub url: String,
    pub thumbnail_url: String,
    pub is_image: bool,
    pub dimensions: ImageDimensions,
}
