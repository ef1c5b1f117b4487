//! # Storage Capability
//!
//! The pipeline never touches the filesystem directly; it goes through the
//! [`Storage`] trait. [`LocalStorage`] is the `std::fs` implementation used in
//! production and in most tests.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, trace, warn};

use crate::utils::glob::Glob;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("move failed from {from} to {to}: {source}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("invalid list pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// File storage abstraction.
///
/// Paths are passed through as given; implementations decide how they map to
/// real locations. All operations are blocking.
pub trait Storage: Send + Sync {
    /// Returns true when a regular file exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true when a directory exists at `path`.
    fn is_dir(&self, path: &Path) -> bool;

    /// Moves a file, replacing any file already at `to`.
    fn move_file(&self, from: &Path, to: &Path) -> StorageResult<()>;

    /// Deletes a file. Returns false when nothing was deleted.
    fn delete(&self, path: &Path) -> bool;

    /// Creates every missing component of `path` with `permissions` and
    /// returns how many directories were created.
    fn mkdir(&self, path: &Path, permissions: u32) -> StorageResult<usize>;

    /// Size of a file in bytes.
    fn size(&self, path: &Path) -> Option<u64>;

    /// Last modification time of a file.
    fn mtime(&self, path: &Path) -> Option<OffsetDateTime>;

    /// Names of the entries of `dir` (files and directories), sorted,
    /// optionally filtered by a glob pattern.
    fn list(&self, dir: &Path, pattern: Option<&str>) -> StorageResult<Vec<String>>;

    /// Removes an empty directory.
    fn remove_dir(&self, path: &Path) -> StorageResult<()>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> StorageResult<()> {
        (**self).move_file(from, to)
    }

    fn delete(&self, path: &Path) -> bool {
        (**self).delete(path)
    }

    fn mkdir(&self, path: &Path, permissions: u32) -> StorageResult<usize> {
        (**self).mkdir(path, permissions)
    }

    fn size(&self, path: &Path) -> Option<u64> {
        (**self).size(path)
    }

    fn mtime(&self, path: &Path) -> Option<OffsetDateTime> {
        (**self).mtime(path)
    }

    fn list(&self, dir: &Path, pattern: Option<&str>) -> StorageResult<Vec<String>> {
        (**self).list(dir, pattern)
    }

    fn remove_dir(&self, path: &Path) -> StorageResult<()> {
        (**self).remove_dir(path)
    }
}

/// Local filesystem storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for LocalStorage {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn move_file(&self, from: &Path, to: &Path) -> StorageResult<()> {
        trace!(from = %from.display(), to = %to.display(), "Moving file");

        let moved = fs::rename(from, to).or_else(|e| {
            // rename cannot cross filesystems; copy and remove instead
            if from.is_file() {
                debug!(error = %e, "Rename failed, falling back to copy");
                fs::copy(from, to).and_then(|_| fs::remove_file(from))
            } else {
                Err(e)
            }
        });

        moved.map_err(|source| StorageError::MoveFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
    }

    fn delete(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "File deleted");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to delete file");
                false
            }
        }
    }

    fn mkdir(&self, path: &Path, permissions: u32) -> StorageResult<usize> {
        let mut created = 0;
        let mut partial = PathBuf::new();

        for component in path.components() {
            partial.push(component);
            if partial.is_dir() {
                continue;
            }

            fs::create_dir(&partial).map_err(|source| StorageError::CreateDirFailed {
                path: partial.clone(),
                source,
            })?;
            set_permissions(&partial, permissions)?;
            created += 1;
        }

        if created > 0 {
            debug!(path = %path.display(), created, "Created directories");
        }
        Ok(created)
    }

    fn size(&self, path: &Path) -> Option<u64> {
        fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len())
    }

    fn mtime(&self, path: &Path) -> Option<OffsetDateTime> {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(OffsetDateTime::from)
    }

    fn list(&self, dir: &Path, pattern: Option<&str>) -> StorageResult<Vec<String>> {
        if !dir.is_dir() {
            return Err(StorageError::DirectoryNotFound(dir.to_path_buf()));
        }

        let glob = pattern
            .map(Glob::new)
            .transpose()
            .map_err(|e| StorageError::InvalidPattern(e.to_string()))?;

        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!(path = ?entry.path(), "Skipping entry with invalid UTF-8 name");
                continue;
            };
            if glob.as_ref().is_none_or(|g| g.matches(&name)) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    fn remove_dir(&self, path: &Path) -> StorageResult<()> {
        fs::remove_dir(path)?;
        debug!(path = %path.display(), "Directory removed");
        Ok(())
    }
}

#[cfg(unix)]
fn set_permissions(path: &Path, permissions: u32) -> StorageResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(permissions))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _permissions: u32) -> StorageResult<()> {
    Ok(())
}
