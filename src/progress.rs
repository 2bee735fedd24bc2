//! Progress reporting.
//!
//! The scan pipeline reports through the [`ProgressCallback`] trait. It is an
//! observability hook only: nothing in the pipeline waits on it or changes
//! behaviour based on it. [`Progress`] renders the callbacks as `indicatif`
//! bars on stderr.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Phase name used while walking the directory tree.
pub const PHASE_DISCOVER: &str = "discover";
/// Phase name used while fingerprinting cache misses.
pub const PHASE_HASH: &str = "hash";
/// Phase name used while querying the similarity index.
pub const PHASE_COMPARE: &str = "compare";

/// Progress callback for the scan phases.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts. `total` is 0 when unknown.
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called with a monotonically increasing completion count.
    fn on_progress(&self, phase: &str, completed: usize, total: usize);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Free-form status message.
    fn on_message(&self, _message: &str) {}
}

/// Whether a completion count should be reported, given a reporting interval.
///
/// Reports every `interval` completions and always on the final item.
#[must_use]
pub fn should_report(completed: usize, total: usize, interval: usize) -> bool {
    completed == total || (interval > 0 && completed % interval == 0)
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter. A quiet reporter draws nothing.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = MultiProgress::new();
        if quiet {
            multi.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
            quiet,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} images")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn label(phase: &str) -> &'static str {
        match phase {
            PHASE_DISCOVER => "Discovering images",
            PHASE_HASH => "Hashing",
            PHASE_COMPARE => "Comparing",
            _ => "Working",
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = if total == 0 {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::bar_style());
            pb
        };
        pb.set_message(Self::label(phase));

        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(phase.to_string(), pb);
        }
    }

    fn on_progress(&self, phase: &str, completed: usize, _total: usize) {
        if let Ok(bars) = self.bars.lock() {
            if let Some(pb) = bars.get(phase) {
                pb.set_position(completed as u64);
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if let Ok(mut bars) = self.bars.lock() {
            if let Some(pb) = bars.remove(phase) {
                pb.finish_and_clear();
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        let _ = self.multi.println(message);
    }
}
