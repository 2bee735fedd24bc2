//! Bounded worker pool for fingerprint computation.
//!
//! Every path becomes one task on a dedicated rayon pool. Workers share no
//! mutable state; each sends its outcome over a channel, and the calling
//! thread drains that channel in completion order until every task has
//! reported. A panic inside a worker is caught and reported as a
//! [`ComputeError::Panicked`] for that file alone.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

use super::{ComputeError, FingerprintRecord, PerceptualHasher};
use crate::progress::{should_report, ProgressCallback, PHASE_HASH};
use crate::signal::CancelToken;

/// Default number of completions between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 50;

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Successfully computed records, in completion order.
    pub records: Vec<FingerprintRecord>,
    /// Files that could not be fingerprinted.
    pub failures: Vec<ComputeError>,
    /// Files skipped because the batch was cancelled.
    pub skipped: usize,
}

impl BatchOutcome {
    /// Whether any file was skipped due to cancellation.
    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.skipped > 0
    }
}

enum Completion {
    Done(Result<FingerprintRecord, ComputeError>),
    Skipped(PathBuf),
}

/// Parallel fingerprint computation.
#[derive(Debug, Clone)]
pub struct HashPool {
    threads: usize,
    progress_interval: usize,
}

impl Default for HashPool {
    fn default() -> Self {
        Self::new(0)
    }
}

impl HashPool {
    /// Create a pool with `threads` workers; 0 means available parallelism.
    #[must_use]
    pub fn new(threads: usize) -> Self {
        let threads = if threads == 0 {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        } else {
            threads
        };
        Self {
            threads,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Report progress every `interval` completions (and on the last one).
    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Fingerprint every path, blocking until all of them have completed,
    /// failed, or been skipped.
    pub fn run_batch(
        &self,
        paths: Vec<PathBuf>,
        hasher: Arc<PerceptualHasher>,
        cancel: Option<&CancelToken>,
        progress: Option<&dyn ProgressCallback>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let total = paths.len();
        if total == 0 {
            return outcome;
        }

        log::info!(
            "Hashing {} images with {} ({} workers)",
            total,
            hasher.algorithm(),
            self.threads
        );
        if let Some(callback) = progress {
            callback.on_phase_start(PHASE_HASH, total);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("simdupe-hash-{i}"))
            .build()
            .map_err(|e| log::warn!("Failed to create hashing pool, using global pool: {}", e))
            .ok();

        let (tx, rx) = mpsc::channel::<Completion>();
        for path in paths {
            let tx = tx.clone();
            let hasher = Arc::clone(&hasher);
            let cancel = cancel.cloned();
            let job = move || {
                let _ = tx.send(compute_one(&hasher, path, cancel.as_ref()));
            };
            match &pool {
                Some(pool) => pool.spawn(job),
                None => rayon::spawn(job),
            }
        }
        drop(tx);

        for (index, completion) in rx.iter().enumerate() {
            let completed = index + 1;
            match completion {
                Completion::Done(Ok(record)) => {
                    log::trace!("Hashed {}: {}", record.path.display(), record.fingerprint);
                    outcome.records.push(record);
                }
                Completion::Done(Err(e)) => {
                    log::warn!("Skipping {} (hash phase): {}", e.path().display(), e);
                    outcome.failures.push(e);
                }
                Completion::Skipped(path) => {
                    log::trace!("Skipped after cancellation: {}", path.display());
                    outcome.skipped += 1;
                }
            }

            if should_report(completed, total, self.progress_interval) {
                log::debug!("Hashed {} of {} new images", completed, total);
                if let Some(callback) = progress {
                    callback.on_progress(PHASE_HASH, completed, total);
                }
            }
        }

        if let Some(callback) = progress {
            callback.on_phase_end(PHASE_HASH);
        }
        log::info!(
            "Hashing complete: {} computed, {} failed, {} skipped",
            outcome.records.len(),
            outcome.failures.len(),
            outcome.skipped
        );

        outcome
    }
}

fn compute_one(
    hasher: &PerceptualHasher,
    path: PathBuf,
    cancel: Option<&CancelToken>,
) -> Completion {
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Completion::Skipped(path);
    }

    match panic::catch_unwind(AssertUnwindSafe(|| hasher.fingerprint_file(&path))) {
        Ok(result) => Completion::Done(result),
        Err(payload) => Completion::Done(Err(ComputeError::Panicked {
            message: panic_message(payload.as_ref()),
            path,
        })),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
