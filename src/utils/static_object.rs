use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde_json::Value;
use tracing::{error, warn};

use crate::models::{default_settings, load_settings, merge_settings};

/// Root directory of stored uploads.
///
/// Every relative path in settings and requests is resolved under it.
///
/// # Environment Variables
///
/// - `UPLOAD_ROOT` - Directory path (e.g., "/srv/uploads"), defaults to "."
pub static UPLOAD_ROOT: LazyLock<PathBuf> = LazyLock::new(|| {
    env::var("UPLOAD_ROOT").map(PathBuf::from).unwrap_or_else(|_| {
        warn!("Missing UPLOAD_ROOT env var, using fallback '.'");
        PathBuf::from(".")
    })
});

/// Base URL generated links start with. Empty means root-relative links.
pub static PUBLIC_URL: LazyLock<String> =
    LazyLock::new(|| env::var("PUBLIC_URL").unwrap_or_default());

/// The settings document: built-in defaults, merged with the optional JSON
/// file named by `UPLOAD_CONFIG`, then with `PUBLIC_URL` as `base_url`.
pub static UPLOAD_SETTINGS: LazyLock<Value> = LazyLock::new(|| {
    let mut settings = default_settings();

    if let Ok(path) = env::var("UPLOAD_CONFIG") {
        let overlay = load_settings(Path::new(&path)).unwrap_or_else(|e| {
            error!("Failed to load UPLOAD_CONFIG {}: {}", path, e);
            std::process::exit(1);
        });
        merge_settings(&mut settings, overlay);
    }

    if !PUBLIC_URL.is_empty() {
        merge_settings(&mut settings, serde_json::json!({ "base_url": PUBLIC_URL.as_str() }));
    }

    settings
});

pub static BIND_ADDR: LazyLock<String> = LazyLock::new(|| {
    env::var("BIND_ADDR").unwrap_or_else(|_| {
        warn!("Missing BIND_ADDR env var, using fallback '0.0.0.0:8090'");
        "0.0.0.0:8090".to_string()
    })
});

/// `json` switches the binary to JSON log lines.
pub static LOG_FORMAT: LazyLock<String> = LazyLock::new(|| {
    env::var("LOG_FORMAT")
        .map(|format| format.to_ascii_lowercase())
        .unwrap_or_else(|_| "pretty".to_string())
});
