//! Image deletion that keeps the fingerprint cache consistent.
//!
//! # Overview
//!
//! - Paths with `..` components are refused outright
//! - Permanent deletion by default, or the system trash with [`DeleteConfig::trash`]
//! - Every cached fingerprint for the path is dropped after the file is gone
//!
//! # Example
//!
//! ```no_run
//! use simdupe::actions::delete::{delete_image, DeleteConfig};
//! use std::path::Path;
//!
//! match delete_image(Path::new("/photos/copy.jpg"), &DeleteConfig::default(), None) {
//!     Ok(result) => println!("Deleted: {}", result.path.display()),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::cache::FingerprintCache;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// The path contains a parent-directory component.
    #[error("refusing path with '..' component: {0}")]
    InvalidPath(PathBuf),

    /// File was not found.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// The path exists but is not a regular file.
    #[error("not a file: {0}")]
    NotAFile(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::InvalidPath(p)
            | Self::NotFound(p)
            | Self::NotAFile(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone)]
pub struct DeleteResult {
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
    /// Cache rows removed for the path.
    pub cache_entries_removed: usize,
}

/// Results of deleting several files.
#[derive(Debug, Default)]
pub struct BatchDeleteResult {
    pub successes: Vec<DeleteResult>,
    pub failures: Vec<DeleteError>,
}

impl BatchDeleteResult {
    /// Total bytes freed.
    #[must_use]
    pub fn bytes_freed(&self) -> u64 {
        self.successes.iter().map(|r| r.size).sum()
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteConfig {
    /// Move to the system trash instead of deleting permanently.
    pub trash: bool,
}

impl DeleteConfig {
    /// Config that moves files to the system trash.
    #[must_use]
    pub fn trash() -> Self {
        Self { trash: true }
    }
}

/// Whether `path` contains a `..` component.
#[must_use]
pub fn has_parent_traversal(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::ParentDir))
}

/// Delete one image and forget its cached fingerprints.
///
/// # Errors
///
/// - `InvalidPath` if the path contains `..`
/// - `NotFound` if nothing exists at the path
/// - `NotAFile` for directories
/// - `PermissionDenied`, `TrashFailed` or `Io` if removal fails
///
/// A failure to update the cache is logged and does not fail the delete.
pub fn delete_image(
    path: &Path,
    config: &DeleteConfig,
    cache: Option<&FingerprintCache>,
) -> Result<DeleteResult, DeleteError> {
    if has_parent_traversal(path) {
        log::warn!("Rejected delete of {}: parent traversal", path.display());
        return Err(DeleteError::InvalidPath(path.to_path_buf()));
    }

    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
    if metadata.is_dir() {
        return Err(DeleteError::NotAFile(path.to_path_buf()));
    }
    let size = metadata.len();

    if config.trash {
        trash::delete(path).map_err(|e| {
            log::error!("Trash operation failed for {}: {}", path.display(), e);
            DeleteError::TrashFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
    } else {
        fs::remove_file(path).map_err(|e| {
            log::error!("Delete failed for {}: {}", path.display(), e);
            DeleteError::from_io(path, e)
        })?;
        log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);
    }

    let cache_entries_removed = match cache.map(|c| c.remove(path)) {
        Some(Ok(removed)) => removed,
        Some(Err(e)) => {
            log::warn!("Deleted {} but could not update cache: {}", path.display(), e);
            0
        }
        None => 0,
    };

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        permanent: !config.trash,
        cache_entries_removed,
    })
}

/// Delete every path, continuing past failures.
pub fn delete_batch(
    paths: &[PathBuf],
    config: &DeleteConfig,
    cache: Option<&FingerprintCache>,
) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();
    for path in paths {
        match delete_image(path, config, cache) {
            Ok(deleted) => result.successes.push(deleted),
            Err(e) => result.failures.push(e),
        }
    }
    log::info!(
        "Deleted {} file(s), {} failed",
        result.successes.len(),
        result.failures.len()
    );
    result
}
