//! Scanner module for image discovery and fingerprint computation.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk, filtered to image extensions
//! - Perceptual hashing through `image_hasher`
//! - A bounded worker pool that fingerprints cache misses in parallel
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and image discovery
//! - [`perceptual`]: The hash algorithms and per-file fingerprinting
//! - [`fingerprint`]: The bit-vector type and its encodings
//! - [`pool`]: Parallel batch computation with completion-order results
//! - [`path_utils`]: Absolute, NFC-normalized cache keys
//!
//! # Example
//!
//! ```no_run
//! use simdupe::scanner::{PerceptualAlgorithm, PerceptualHasher, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let hasher = PerceptualHasher::new(PerceptualAlgorithm::Perceptual);
//! for path in walker.walk().filter_map(Result::ok) {
//!     match hasher.fingerprint_file(&path) {
//!         Ok(record) => println!("{}: {}", path.display(), record.hash_hex()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod fingerprint;
pub mod path_utils;
pub mod perceptual;
pub mod pool;
pub mod walker;

use std::path::{Path, PathBuf};

pub use fingerprint::{
    max_distance_for, meets_threshold, mtime_seconds, similarity_percent, Fingerprint,
    FingerprintError, FingerprintRecord, Resolution, HASH_BITS, HASH_SIDE,
};
pub use perceptual::{PerceptualAlgorithm, PerceptualHasher};
pub use pool::{BatchOutcome, HashPool};
pub use walker::Walker;

/// Extensions recognised as images when no override is configured.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "bmp", "gif", "tiff", "tif", "webp"];

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Lowercase extensions (without the dot) that count as images.
    pub extensions: Vec<String>,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            skip_hidden: false,
            extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            ignore_patterns: Vec::new(),
        }
    }
}

impl WalkerConfig {
    /// Replace the recognised extensions. Leading dots and case are ignored.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Add gitignore-style patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while fingerprinting a single file.
///
/// These never abort a batch: the pool logs them and drops the file.
#[derive(thiserror::Error, Debug)]
pub enum ComputeError {
    /// The file vanished before it could be read.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is corrupt or in an unsupported format.
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The hasher returned a vector of the wrong width.
    #[error("Unexpected {bits}-bit hash for {path}")]
    UnexpectedWidth { path: PathBuf, bits: u32 },

    /// The worker panicked while processing the file.
    #[error("Worker panicked while hashing {path}: {message}")]
    Panicked { path: PathBuf, message: String },
}

impl ComputeError {
    /// Classify an I/O error for `path`.
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::Io { path, .. }
            | Self::Decode { path, .. }
            | Self::UnexpectedWidth { path, .. }
            | Self::Panicked { path, .. } => path,
        }
    }
}
