//! # Directory Maintenance
//!
//! Retention limits per file type, directory removal, listings and single
//! file deletion. None of this is coordinated with concurrent writers to the
//! same directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::models::{UploadConfig, join_url_path};
use crate::services::{
    pipeline::public_url,
    storage::{Storage, StorageResult},
    thumbnail::thumbnail_path_for,
};
use crate::utils::{
    file_types::{
        AllowedTypes, Categories, TypeSpec, extension_of, is_image, is_raster_image, resolve_types,
    },
    size::human_size,
};

/// Deletes the oldest files of each type until every type is within its
/// limit. Keys are type specifications (`"jpg"`, `"image"`, `"pdf|txt"`).
///
/// Returns the deleted paths, oldest first per type. A missing directory
/// yields an empty list.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn directory_file_limits<S: Storage>(
    storage: &S,
    dir: &Path,
    limits: &BTreeMap<String, usize>,
    categories: &Categories,
) -> StorageResult<Vec<PathBuf>> {
    let mut deleted = Vec::new();
    if !storage.is_dir(dir) {
        debug!("Directory does not exist, nothing to limit");
        return Ok(deleted);
    }

    let entries = storage.list(dir, None)?;

    for (spec, &limit) in limits {
        let allowed = resolve_types(&TypeSpec::from(spec.as_str()), categories);

        let mut candidates: Vec<PathBuf> = entries
            .iter()
            .filter(|name| extension_of(name).is_some_and(|ext| allowed.allows(ext)))
            .map(|name| dir.join(name))
            .filter(|path| storage.exists(path) && !deleted.contains(path))
            .collect();

        while candidates.len() > limit {
            // missing mtimes sort first, so unknown files count as oldest
            let oldest = candidates
                .iter()
                .enumerate()
                .min_by_key(|(_, path)| storage.mtime(path))
                .map_or(0, |(index, _)| index);

            let path = candidates.remove(oldest);
            if !storage.delete(&path) {
                warn!(path = %path.display(), "Failed to delete file over limit");
                break;
            }
            deleted.push(path);
        }
    }

    if !deleted.is_empty() {
        info!(deleted = deleted.len(), "Applied directory file limits");
    }
    Ok(deleted)
}

/// Removes a directory.
///
/// With `delete_contents` every file and subdirectory goes too and the number
/// of deleted files is returned. Without it the directory is only removed
/// when already empty.
#[instrument(skip_all, fields(dir = %dir.display(), delete_contents))]
pub fn delete_directory<S: Storage>(
    storage: &S,
    dir: &Path,
    delete_contents: bool,
) -> StorageResult<usize> {
    if !storage.is_dir(dir) {
        return Ok(0);
    }

    let entries = storage.list(dir, None)?;
    if !delete_contents {
        if entries.is_empty() {
            storage.remove_dir(dir)?;
        }
        return Ok(0);
    }

    let mut deleted = 0;
    for name in entries {
        let path = dir.join(&name);
        if storage.is_dir(&path) {
            deleted += delete_directory(storage, &path, true)?;
        } else if storage.delete(&path) {
            deleted += 1;
        }
    }

    storage.remove_dir(dir)?;
    debug!(deleted, "Directory deleted");
    Ok(deleted)
}

/// Listing options for [`directory_files`] and [`directory_filenames`].
#[derive(Debug, Clone, Default)]
pub struct ListingOptions {
    /// Only include these types.
    pub file_types: Option<TypeSpec>,
    /// List by type in this order instead of alphabetically.
    pub type_order: Option<TypeSpec>,
}

/// A file in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    pub url: String,
    pub file_size: u64,
    pub is_image: bool,
    pub thumbnail_url: String,
}

/// Names of the regular files in `dir`, optionally grouped by type order.
pub fn directory_filenames<S: Storage>(
    storage: &S,
    dir: &Path,
    options: &ListingOptions,
    categories: &Categories,
) -> StorageResult<Vec<String>> {
    if !storage.is_dir(dir) {
        return Ok(Vec::new());
    }

    let names = match &options.type_order {
        Some(order) => match resolve_types(order, categories) {
            AllowedTypes::Any => storage.list(dir, None)?,
            AllowedTypes::Only(extensions) => {
                let mut names = Vec::new();
                for extension in extensions {
                    // one glob per type keeps the requested grouping
                    let pattern = format!("*.{extension}");
                    names.extend(storage.list(dir, Some(pattern.as_str()))?);
                }
                names
            }
        },
        None => storage.list(dir, None)?,
    };

    let filter = options
        .file_types
        .as_ref()
        .map(|spec| resolve_types(spec, categories))
        .unwrap_or(AllowedTypes::Any);

    let mut seen = Vec::new();
    for name in names {
        let allowed = match extension_of(&name) {
            Some(ext) => filter.allows(ext),
            None => matches!(filter, AllowedTypes::Any),
        };
        if allowed && storage.exists(&dir.join(&name)) && !seen.contains(&name) {
            seen.push(name);
        }
    }

    Ok(seen)
}

/// Detailed listing of the files in `relative_dir` (under `root`).
#[instrument(skip_all, fields(dir = %relative_dir))]
pub fn directory_files<S: Storage>(
    storage: &S,
    root: &Path,
    relative_dir: &str,
    options: &ListingOptions,
    config: &UploadConfig,
) -> StorageResult<Vec<DirectoryEntry>> {
    let dir = root.join(relative_dir);
    let names = directory_filenames(storage, &dir, options, &config.categories)?;

    let entries = names
        .into_iter()
        .map(|name| {
            let path = dir.join(&name);
            let url = public_url(config, &join_url_path(relative_dir, &name));
            let image = is_image(&name);

            let thumbnail_url = if image {
                thumbnail_path_for(&path, config.thumbnail_placement.as_ref())
                    .filter(|thumb| storage.exists(thumb))
                    .and_then(|thumb| {
                        let relative =
                            thumb.strip_prefix(root).ok()?.to_string_lossy().into_owned();
                        Some(public_url(config, &relative))
                    })
                    .unwrap_or_else(|| url.clone())
            } else {
                config
                    .default_thumb
                    .as_deref()
                    .map(|thumb| public_url(config, thumb))
                    .unwrap_or_default()
            };

            DirectoryEntry {
                file_size: storage.size(&path).unwrap_or(0),
                name,
                url,
                is_image: image,
                thumbnail_url,
            }
        })
        .collect();

    Ok(entries)
}

/// Deletes a file and, for raster images, its thumbnail.
///
/// `__` in the name decodes to a space, matching URL-friendly names.
#[instrument(skip_all, fields(path = %path))]
pub fn delete_file<S: Storage>(storage: &S, path: &str, config: &UploadConfig) -> bool {
    let path = PathBuf::from(path.replace("__", " "));
    let deleted = storage.delete(&path);

    if is_raster_image(&path.to_string_lossy())
        && let Some(thumbnail) = thumbnail_path_for(&path, config.thumbnail_placement.as_ref())
        && storage.delete(&thumbnail)
    {
        debug!(thumbnail = %thumbnail.display(), "Thumbnail deleted");
    }

    deleted
}

/// Human readable size of the file at `path`.
pub fn file_size<S: Storage>(storage: &S, path: &Path) -> Option<String> {
    storage.size(path).map(human_size)
}
