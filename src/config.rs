//! Application configuration management.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. `config.toml` in the platform configuration directory
//! 3. `SIMDUPE_*` environment variables (e.g. `SIMDUPE_THRESHOLD=95`)
//! 4. Command-line flags, applied by the caller
//!
//! ```toml
//! algorithm = "difference"
//! threshold = 95
//! threads = 4
//! extensions = ["png", "jpg"]
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::scanner::pool::DEFAULT_PROGRESS_INTERVAL;
use crate::scanner::{PerceptualAlgorithm, DEFAULT_IMAGE_EXTENSIONS};
use crate::similarity::{DEFAULT_MAX_BUCKET_SIZE, DEFAULT_THRESHOLD};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "SIMDUPE_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hash algorithm for scans.
    pub algorithm: PerceptualAlgorithm,
    /// Minimum similarity percentage.
    pub threshold: u8,
    /// Hashing threads; 0 means available parallelism.
    pub threads: usize,
    /// Fingerprint cache location; unset means the platform cache directory.
    pub cache_path: Option<PathBuf>,
    /// File extensions treated as images.
    pub extensions: Vec<String>,
    pub follow_symlinks: bool,
    pub skip_hidden: bool,
    /// Completions between hashing progress reports.
    pub progress_interval: usize,
    /// Buckets larger than this are logged as oversized.
    pub max_bucket_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: PerceptualAlgorithm::default(),
            threshold: DEFAULT_THRESHOLD,
            threads: 0,
            cache_path: None,
            extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            follow_symlinks: false,
            skip_hidden: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            max_bucket_size: DEFAULT_MAX_BUCKET_SIZE,
        }
    }
}

impl Config {
    /// Load from the default file and the environment.
    ///
    /// An unreadable or invalid configuration is logged and replaced by
    /// the defaults.
    #[must_use]
    pub fn load() -> Self {
        let figment = match Self::config_path() {
            Some(path) => Self::figment_for(&path),
            None => Self::base_figment().merge(Env::prefixed(ENV_PREFIX)),
        };
        match figment.extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load from an explicit file plus the environment.
    ///
    /// # Errors
    ///
    /// Returns the figment error if the file or an environment value is
    /// invalid. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, figment::Error> {
        Self::figment_for(path).extract()
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }

    fn figment_for(path: &Path) -> Figment {
        Self::base_figment()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Default platform-specific configuration file.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "simdupe", "simdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
