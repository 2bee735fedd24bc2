//! Scan pipeline orchestration.
//!
//! A scan runs six phases:
//! 1. **Discover** - walk the root for image files
//! 2. **Lookup** - split files into cache hits and misses
//! 3. **Hash** - fingerprint the misses on the worker pool
//! 4. **Persist** - commit new fingerprints to the cache
//! 5. **Index** - build a BK-tree over the unique fingerprints
//! 6. **Compare** - extract and verify similar pairs
//!
//! Phases 1, 2, 4, 5 and 6 run on the calling thread. Phase 4 starts only
//! after every phase 3 task has reported.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::buckets::{HashBuckets, DEFAULT_MAX_BUCKET_SIZE};
use super::index::SimilarityIndex;
use super::pairs::{PairExtractor, SimilarPair};
use crate::cache::FingerprintCache;
use crate::progress::{ProgressCallback, PHASE_COMPARE, PHASE_DISCOVER};
use crate::scanner::pool::DEFAULT_PROGRESS_INTERVAL;
use crate::scanner::{
    ComputeError, FingerprintRecord, HashPool, PerceptualAlgorithm, PerceptualHasher, Walker,
    WalkerConfig,
};
use crate::signal::CancelToken;

/// Default similarity threshold in percent.
pub const DEFAULT_THRESHOLD: u8 = 90;

/// Configuration for the similarity finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Hash algorithm used for every file in the scan.
    pub algorithm: PerceptualAlgorithm,
    /// Minimum similarity percentage, 0 to 100.
    pub threshold: u8,
    /// Worker threads for hashing; 0 means available parallelism.
    pub threads: usize,
    /// Optional fingerprint cache.
    pub cache: Option<Arc<FingerprintCache>>,
    /// Optional cancellation token.
    pub cancel: Option<CancelToken>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Walker configuration for discovery.
    pub walker_config: WalkerConfig,
    /// Buckets larger than this are logged as oversized.
    pub max_bucket_size: usize,
    /// Completions between hash progress reports.
    pub progress_interval: usize,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("algorithm", &self.algorithm)
            .field("threshold", &self.threshold)
            .field("threads", &self.threads)
            .field("cache", &self.cache.as_ref().map(|_| "<cache>"))
            .field("cancel", &self.cancel)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field("walker_config", &self.walker_config)
            .field("max_bucket_size", &self.max_bucket_size)
            .field("progress_interval", &self.progress_interval)
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            algorithm: PerceptualAlgorithm::default(),
            threshold: DEFAULT_THRESHOLD,
            threads: 0,
            cache: None,
            cancel: None,
            progress_callback: None,
            walker_config: WalkerConfig::default(),
            max_bucket_size: DEFAULT_MAX_BUCKET_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl FinderConfig {
    /// Check the threshold and that `root` is an existing directory.
    ///
    /// [`SimilarityFinder::scan`] runs this first; callers that touch the
    /// cache or install handlers before scanning should run it earlier.
    ///
    /// # Errors
    ///
    /// [`FinderError::InvalidThreshold`], [`FinderError::PathNotFound`] or
    /// [`FinderError::NotADirectory`].
    pub fn validate(&self, root: &Path) -> Result<(), FinderError> {
        self.validate_threshold()?;
        if !root.exists() {
            return Err(FinderError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(FinderError::NotADirectory(root.to_path_buf()));
        }
        Ok(())
    }

    fn validate_threshold(&self) -> Result<(), FinderError> {
        if self.threshold > 100 {
            return Err(FinderError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: PerceptualAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the threshold. Values above 100 are rejected when the scan starts.
    #[must_use]
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the fingerprint cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<FingerprintCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    #[must_use]
    pub fn with_max_bucket_size(mut self, size: usize) -> Self {
        self.max_bucket_size = size;
        self
    }

    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// Counters and timings from one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Image files discovered (or given explicitly).
    pub files_discovered: usize,
    /// Directory entries that could not be read during discovery.
    pub walk_errors: usize,
    /// Files served from the cache.
    pub cache_hits: usize,
    /// Files with no valid cache entry.
    pub cache_misses: usize,
    /// Fingerprints computed in this scan.
    pub computed: usize,
    /// Files that could not be fingerprinted.
    pub failed: usize,
    /// Computed fingerprints that could not be written to the cache.
    pub cache_write_failures: usize,
    /// Distinct fingerprints in the index.
    pub unique_hashes: usize,
    /// Index query radius.
    pub max_distance: u32,
    /// Distinct candidate pairs examined.
    pub candidate_pairs: usize,
    /// Pairs emitted.
    pub pairs: usize,
    /// Buckets above the configured size limit.
    pub oversized_buckets: usize,
    pub discover_duration: Duration,
    pub hash_duration: Duration,
    pub compare_duration: Duration,
    pub total_duration: Duration,
}

impl ScanSummary {
    /// Fraction of looked-up files that were cache hits, 0.0 to 1.0.
    #[must_use]
    pub fn cache_hit_rate(&self) -> f64 {
        let looked_up = self.cache_hits + self.cache_misses;
        if looked_up == 0 {
            0.0
        } else {
            self.cache_hits as f64 / looked_up as f64
        }
    }

    fn log(&self) {
        log::info!(
            "Scan complete: {} images, {} cached, {} computed, {} failed, {} pairs in {:.2?}",
            self.files_discovered,
            self.cache_hits,
            self.computed,
            self.failed,
            self.pairs,
            self.total_duration
        );
        log::debug!(
            "Index: {} unique hashes, radius {}, {} candidates, {} oversized buckets",
            self.unique_hashes,
            self.max_distance,
            self.candidate_pairs,
            self.oversized_buckets
        );
        log::debug!(
            "Timings: discover {:.2?}, hash {:.2?}, compare {:.2?}",
            self.discover_duration,
            self.hash_duration,
            self.compare_duration
        );
    }
}

/// Result of a completed scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Verified pairs, in extraction order.
    pub pairs: Vec<SimilarPair>,
    pub summary: ScanSummary,
    /// Files that could not be fingerprinted.
    pub failures: Vec<ComputeError>,
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The threshold is outside 0 to 100.
    #[error("Invalid threshold {0}: must be between 0 and 100")]
    InvalidThreshold(u8),

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The scan was cancelled. Fingerprints computed before cancellation
    /// have already been committed to the cache.
    #[error("Scan interrupted by user")]
    Interrupted,
}

/// Near-duplicate image finder.
///
/// # Example
///
/// ```no_run
/// use simdupe::similarity::{FinderConfig, SimilarityFinder};
/// use std::path::Path;
///
/// let finder = SimilarityFinder::new(FinderConfig::default().with_threshold(95));
/// let report = finder.scan(Path::new("/home/user/Pictures")).unwrap();
/// for pair in &report.pairs {
///     println!("{} ~ {} ({}%)", pair.first.path.display(), pair.second.path.display(), pair.similarity);
/// }
/// ```
pub struct SimilarityFinder {
    config: FinderConfig,
    hasher: Arc<PerceptualHasher>,
}

impl SimilarityFinder {
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let hasher = Arc::new(PerceptualHasher::new(config.algorithm));
        Self { config, hasher }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    fn progress(&self) -> Option<&dyn ProgressCallback> {
        self.config.progress_callback.as_deref()
    }

    /// Scan the directory tree under `root`.
    ///
    /// # Errors
    ///
    /// Fails before doing any work if the threshold is out of range or
    /// `root` is not an existing directory, and with
    /// [`FinderError::Interrupted`] if the cancel token fires.
    pub fn scan(&self, root: &Path) -> Result<ScanReport, FinderError> {
        self.config.validate(root)?;
        if self.config.is_cancelled() {
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Starting {} scan of {} at {}%",
            self.config.algorithm,
            root.display(),
            self.config.threshold
        );

        let started = Instant::now();
        if let Some(callback) = self.progress() {
            callback.on_phase_start(PHASE_DISCOVER, 0);
            callback.on_message(&format!("Walking {}", root.display()));
        }

        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(token) = &self.config.cancel {
            walker = walker.with_cancel_token(token.clone());
        }

        let mut paths = Vec::new();
        let mut walk_errors = 0;
        for result in walker.walk() {
            match result {
                Ok(path) => {
                    paths.push(path);
                    if let Some(callback) = self.progress() {
                        callback.on_progress(PHASE_DISCOVER, paths.len(), 0);
                    }
                }
                Err(e) => {
                    log::warn!("Skipping entry (discover phase): {}", e);
                    walk_errors += 1;
                }
            }
        }

        if let Some(callback) = self.progress() {
            callback.on_phase_end(PHASE_DISCOVER);
        }
        if self.config.is_cancelled() {
            return Err(FinderError::Interrupted);
        }
        log::info!("Discovered {} images", paths.len());

        let discover_duration = started.elapsed();
        let mut report = self.run_pipeline(paths)?;
        report.summary.walk_errors = walk_errors;
        report.summary.discover_duration = discover_duration;
        report.summary.total_duration = started.elapsed();
        report.summary.log();
        Ok(report)
    }

    /// Run every phase after discovery over an explicit list of files.
    ///
    /// Duplicate paths are collapsed.
    pub fn scan_paths(&self, paths: Vec<PathBuf>) -> Result<ScanReport, FinderError> {
        self.config.validate_threshold()?;
        let started = Instant::now();
        let mut report = self.run_pipeline(paths)?;
        report.summary.total_duration = started.elapsed();
        report.summary.log();
        Ok(report)
    }

    fn run_pipeline(&self, paths: Vec<PathBuf>) -> Result<ScanReport, FinderError> {
        let paths: BTreeSet<PathBuf> = paths.into_iter().collect();
        let mut summary = ScanSummary {
            files_discovered: paths.len(),
            ..ScanSummary::default()
        };

        let (cached, misses) = self.split_cached(paths);
        summary.cache_hits = cached.len();
        summary.cache_misses = misses.len();

        let hash_started = Instant::now();
        let outcome = HashPool::new(self.config.threads)
            .with_progress_interval(self.config.progress_interval)
            .run_batch(
                misses,
                Arc::clone(&self.hasher),
                self.config.cancel.as_ref(),
                self.progress(),
            );
        summary.hash_duration = hash_started.elapsed();
        summary.computed = outcome.records.len();
        summary.failed = outcome.failures.len();

        summary.cache_write_failures = self.persist(&outcome.records);

        if outcome.was_cancelled() {
            log::info!(
                "Scan cancelled with {} images not hashed; {} new fingerprints kept",
                outcome.skipped,
                outcome.records.len()
            );
            return Err(FinderError::Interrupted);
        }

        let compare_started = Instant::now();
        let buckets = HashBuckets::from_records(cached.into_iter().chain(outcome.records));
        let index: SimilarityIndex = buckets.fingerprints().cloned().collect();
        summary.unique_hashes = index.len();

        if let Some(callback) = self.progress() {
            callback.on_phase_start(PHASE_COMPARE, buckets.len());
        }
        let extractor = PairExtractor::new(self.config.threshold)
            .with_max_bucket_size(self.config.max_bucket_size);
        summary.max_distance = extractor.max_distance();
        let extraction = extractor.extract(&buckets, &index);
        if let Some(callback) = self.progress() {
            callback.on_progress(PHASE_COMPARE, buckets.len(), buckets.len());
            callback.on_phase_end(PHASE_COMPARE);
        }

        summary.candidate_pairs = extraction.candidates;
        summary.oversized_buckets = extraction.oversized_buckets;
        summary.pairs = extraction.pairs.len();
        summary.compare_duration = compare_started.elapsed();
        log::info!(
            "Compared {} unique hashes: {} pairs at {}% or above",
            summary.unique_hashes,
            summary.pairs,
            self.config.threshold
        );

        Ok(ScanReport {
            pairs: extraction.pairs,
            summary,
            failures: outcome.failures,
        })
    }

    /// Split `paths` into valid cached records and files to compute.
    fn split_cached(
        &self,
        paths: BTreeSet<PathBuf>,
    ) -> (Vec<FingerprintRecord>, Vec<PathBuf>) {
        let Some(cache) = &self.config.cache else {
            return (Vec::new(), paths.into_iter().collect());
        };

        let mut cached = Vec::new();
        let mut misses = Vec::new();
        for path in paths {
            match cache.lookup(&path, self.config.algorithm) {
                Ok(Some(record)) => {
                    log::trace!("Cache hit: {}", path.display());
                    cached.push(record);
                }
                Ok(None) => {
                    log::trace!("Cache miss: {}", path.display());
                    misses.push(path);
                }
                Err(e) => {
                    log::warn!("Cache lookup failed for {} (lookup phase): {}", path.display(), e);
                    misses.push(path);
                }
            }
        }
        log::info!("Cache: {} hits, {} misses", cached.len(), misses.len());
        (cached, misses)
    }

    /// Commit new records. Returns the number that failed to persist.
    fn persist(&self, records: &[FingerprintRecord]) -> usize {
        let Some(cache) = &self.config.cache else {
            return 0;
        };
        match cache.commit_batch(records) {
            Ok(report) => report.failed.len(),
            Err(e) => {
                log::warn!(
                    "Failed to persist {} fingerprints (persist phase): {}",
                    records.len(),
                    e
                );
                records.len()
            }
        }
    }
}
