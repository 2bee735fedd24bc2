//! Command-line interface definitions for simdupe.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Scan options left unset fall back to the configuration file and environment
//! (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Scan a directory with the default perceptual hash at 90%
//! simdupe scan ~/Pictures
//!
//! # Stricter match with difference hashing, as JSON
//! simdupe scan ~/Pictures --algorithm difference --threshold 95 --output json
//!
//! # Delete one copy and forget its cached fingerprints
//! simdupe delete ~/Pictures/copy.jpg --trash
//!
//! # Trash the lower-resolution image of every pair
//! simdupe scan ~/Pictures --select smaller-resolution | xargs -d '\n' simdupe delete --trash
//!
//! # Verbose mode for debugging
//! simdupe -v scan ~/Pictures
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::actions::SelectRule;
use crate::scanner::PerceptualAlgorithm;

/// Near-duplicate image finder.
///
/// simdupe fingerprints images with a perceptual hash, caches the
/// fingerprints between runs, and reports pairs of images whose hashes are
/// at least THRESHOLD percent similar.
#[derive(Debug, Parser)]
#[command(name = "simdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for simdupe.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for similar images
    Scan(ScanArgs),
    /// Delete images and drop their cached fingerprints
    Delete(DeleteArgs),
    /// Inspect or maintain the fingerprint cache
    Cache(CacheArgs),
}

/// Where the fingerprint cache lives.
#[derive(Debug, Clone, Args)]
pub struct CacheLocation {
    /// Path to the fingerprint cache database
    ///
    /// If not specified, the configured or platform-specific default is used.
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Disable fingerprint caching
    #[arg(long, conflicts_with = "cache")]
    pub no_cache: bool,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory path to scan for similar images
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Perceptual hash algorithm
    #[arg(short, long, value_enum)]
    pub algorithm: Option<AlgorithmArg>,

    /// Minimum similarity in percent (0-100)
    #[arg(short, long, value_name = "PERCENT", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub threshold: Option<u8>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Print the image to delete from each pair instead of the report
    ///
    /// Rules are tried in the order resolution, size, age; the first one
    /// that differs decides. Ties keep the second image of the pair. Each
    /// path is printed once, ready for `simdupe delete`.
    #[arg(long = "select", value_enum, value_name = "RULE", conflicts_with = "output")]
    pub select: Vec<SelectArg>,

    #[command(flatten)]
    pub cache: CacheLocation,

    /// Clear the fingerprint cache before scanning
    #[arg(long, conflicts_with = "no_cache")]
    pub clear_cache: bool,

    /// Number of hashing threads (0 = all cores)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Glob patterns to ignore (can be specified multiple times)
    ///
    /// These patterns are added to any .gitignore patterns found.
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links during scan
    ///
    /// Warning: May cause infinite loops if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,
}

/// Arguments for the delete subcommand.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Image files to delete
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Move to the system trash instead of deleting permanently
    #[arg(long)]
    pub trash: bool,

    #[command(flatten)]
    pub cache: CacheLocation,
}

/// Arguments for the cache subcommand.
#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,

    /// Path to the fingerprint cache database
    #[arg(long, value_name = "PATH", global = true)]
    pub cache: Option<PathBuf>,
}

/// Cache maintenance actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum CacheAction {
    /// Show entry counts per algorithm
    Stats,
    /// Remove every entry
    Clear,
    /// Remove entries whose file no longer exists
    Prune,
}

/// Hash algorithm as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    /// Mean-threshold average hash
    #[value(alias = "ahash")]
    Average,
    /// Gradient (difference) hash
    #[value(alias = "dhash")]
    Difference,
    /// DCT-based perceptual hash
    #[value(alias = "phash")]
    Perceptual,
}

impl From<AlgorithmArg> for PerceptualAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Average => Self::Average,
            AlgorithmArg::Difference => Self::Difference,
            AlgorithmArg::Perceptual => Self::Perceptual,
        }
    }
}

/// Auto-select rule as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SelectArg {
    /// Delete the image with fewer pixels
    SmallerResolution,
    /// Delete the smaller file
    SmallerSize,
    /// Delete the image modified earlier
    Older,
}

impl From<SelectArg> for SelectRule {
    fn from(arg: SelectArg) -> Self {
        match arg {
            SelectArg::SmallerResolution => Self::SmallerResolution,
            SelectArg::SmallerSize => Self::SmallerSize,
            SelectArg::Older => Self::Older,
        }
    }
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    Text,
    /// JSON document `{"pairs": [...]}`
    Json,
    /// CSV, one row per pair
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
