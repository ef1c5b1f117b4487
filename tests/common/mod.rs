#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once};

use image::{DynamicImage, ImageFormat, RgbImage};
use intake::{
    models::{AppState, IncomingFile, UploadConfig, default_settings, merge_settings},
    services::{
        messages::Messages,
        storage::{Storage, StorageError, StorageResult},
    },
    utils::glob::Glob,
};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio::net::TcpListener;
use uuid::Uuid;

pub fn init_tracing_once() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("intake=debug")
            .with_test_writer()
            .init();
    });
}

/// Settings overrides every test starts from: stable URLs and on-demand
/// directories.
pub fn test_overrides(overrides: Value) -> Value {
    let mut settings = json!({
        "no_cache_url": false,
        "create_directory": true,
    });
    merge_settings(&mut settings, overrides);
    settings
}

/// Builds a configuration over the defaults with [`test_overrides`] applied.
pub fn test_config(overrides: Value) -> UploadConfig {
    UploadConfig::with_overrides(test_overrides(overrides)).expect("Invalid test configuration")
}

/// A small RGB gradient so encoders have real content to work with.
fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

/// Encodes a `width` x `height` image in `format`.
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    gradient(width, height)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Failed to encode test image");
    bytes
}

/// Writes an image to `path`, format chosen by its extension.
pub fn write_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create image directory");
    }
    gradient(width, height)
        .save(path)
        .expect("Failed to write test image");
}

/// Reads the dimensions of the image stored at `path`.
pub fn dimensions_of(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).expect("Failed to read image dimensions")
}

/// Reads the format of the image stored at `path` from its content.
pub fn format_of(path: &Path) -> Option<ImageFormat> {
    image::ImageReader::open(path)
        .expect("Failed to open image")
        .with_guessed_format()
        .expect("Failed to guess image format")
        .format()
}

/// Stages `bytes` like the transport does and describes them as an upload.
pub fn incoming_bytes(
    staging: &Path,
    field: &str,
    original_name: &str,
    bytes: &[u8],
) -> IncomingFile {
    std::fs::create_dir_all(staging).expect("Failed to create staging directory");
    let temp_path = staging.join(format!("{}.part", Uuid::new_v4()));
    std::fs::write(&temp_path, bytes).expect("Failed to stage upload");
    IncomingFile::new(field, original_name, temp_path, bytes.len() as u64)
}

/// Stages an image upload whose format follows `original_name`.
pub fn incoming_image(
    staging: &Path,
    field: &str,
    original_name: &str,
    width: u32,
    height: u32,
) -> IncomingFile {
    let format = ImageFormat::from_path(original_name).unwrap_or(ImageFormat::Png);
    incoming_bytes(staging, field, original_name, &image_bytes(width, height, format))
}

/// Spawns the application over `root` and returns its address.
///
/// Returned address format: `http://127.0.0.1:8492`
pub async fn spawn_app(root: &Path) -> String {
    init_tracing_once();

    let mut settings = default_settings();
    merge_settings(&mut settings, test_overrides(json!({})));
    let state = AppState::new(root.to_path_buf(), settings, Messages::english())
        .expect("Failed to build application state");

    // Randomly choose an available port
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port at localhost");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, intake::app(Arc::new(state)))
            .await
            .unwrap();
    });

    let address = format!("http://127.0.0.1:{port}");

    // Wait for server to be ready
    let client = reqwest::Client::new();
    for _ in 0..10 {
        if client
            .get(format!("{address}/health-check"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    address
}

/// In-memory storage with controllable modification times.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<PathBuf, (u64, Option<OffsetDateTime>)>>,
    dirs: Mutex<BTreeSet<PathBuf>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        self.dirs.lock().unwrap().insert(path.into());
    }

    /// Adds a file, registering its parent directory.
    pub fn add_file(&self, path: impl Into<PathBuf>, size: u64, mtime: Option<OffsetDateTime>) {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.lock().unwrap().insert(path, (size, mtime));
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .keys()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect()
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.lock().unwrap().contains(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> StorageResult<()> {
        let mut files = self.files.lock().unwrap();
        let entry = files.remove(from).ok_or_else(|| StorageError::MoveFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: std::io::ErrorKind::NotFound.into(),
        })?;
        files.insert(to.to_path_buf(), entry);
        Ok(())
    }

    fn delete(&self, path: &Path) -> bool {
        self.files.lock().unwrap().remove(path).is_some()
    }

    fn mkdir(&self, path: &Path, _permissions: u32) -> StorageResult<usize> {
        let mut dirs = self.dirs.lock().unwrap();
        let mut created = 0;
        let mut partial = PathBuf::new();
        for component in path.components() {
            partial.push(component);
            if dirs.insert(partial.clone()) {
                created += 1;
            }
        }
        Ok(created)
    }

    fn size(&self, path: &Path) -> Option<u64> {
        self.files.lock().unwrap().get(path).map(|(size, _)| *size)
    }

    fn mtime(&self, path: &Path) -> Option<OffsetDateTime> {
        self.files.lock().unwrap().get(path).and_then(|(_, mtime)| *mtime)
    }

    fn list(&self, dir: &Path, pattern: Option<&str>) -> StorageResult<Vec<String>> {
        if !self.is_dir(dir) {
            return Err(StorageError::DirectoryNotFound(dir.to_path_buf()));
        }
        let glob = pattern
            .map(Glob::new)
            .transpose()
            .map_err(|e| StorageError::InvalidPattern(e.to_string()))?;

        let files = self.files.lock().unwrap();
        let dirs = self.dirs.lock().unwrap();
        let mut names: Vec<String> = files
            .keys()
            .chain(dirs.iter())
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .filter(|name| glob.as_ref().is_none_or(|g| g.matches(name)))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn remove_dir(&self, path: &Path) -> StorageResult<()> {
        self.dirs.lock().unwrap().remove(path);
        Ok(())
    }
}
