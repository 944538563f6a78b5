//! Progress reporter implementation
//!
//! Uses indicatif for a status line plus a per-task bar. The total task
//! count is only known once the walk finishes, so the bar starts unbounded.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress reporter for sort runs
pub struct ProgressReporter {
    /// Multi-progress container
    multi: MultiProgress,
    /// Finished task bar
    tasks_bar: ProgressBar,
    /// Current status message
    status: ProgressBar,
    /// Start time
    start_time: Instant,
    /// Tasks that finished (either way)
    tasks_finished: AtomicU64,
    /// Tasks that failed
    tasks_failed: AtomicU64,
    /// Bytes copied so far
    bytes_copied: AtomicU64,
    /// Is progress enabled
    enabled: AtomicBool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let status = multi.add(ProgressBar::new_spinner());
        status.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        let tasks_bar = multi.add(ProgressBar::new(0));
        tasks_bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        tasks_bar.set_prefix("Files");

        Self {
            multi,
            tasks_bar,
            status,
            start_time: Instant::now(),
            tasks_finished: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            bytes_copied: AtomicU64::new(0),
            enabled: AtomicBool::new(true),
        }
    }

    /// Create a disabled progress reporter (for quiet mode)
    pub fn disabled() -> Self {
        let reporter = Self::new();
        reporter.enabled.store(false, Ordering::SeqCst);
        reporter.multi.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    /// Set total number of copy tasks
    pub fn set_total_tasks(&self, total: u64) {
        self.tasks_bar.set_length(total);
    }

    /// Record a finished copy task
    pub fn task_finished(&self, bytes: u64, failed: bool) {
        self.tasks_finished.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        }
        let total = self.bytes_copied.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.tasks_bar.inc(1);
        self.tasks_bar
            .set_message(humansize::format_size(total, humansize::BINARY));
    }

    /// Set current status message
    pub fn set_status(&self, msg: &str) {
        self.status.set_message(msg.to_string());
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Tasks finished so far
    pub fn tasks_finished(&self) -> u64 {
        self.tasks_finished.load(Ordering::Relaxed)
    }

    /// Tasks failed so far
    pub fn tasks_failed(&self) -> u64 {
        self.tasks_failed.load(Ordering::Relaxed)
    }

    /// Bytes copied so far
    pub fn bytes_copied(&self) -> u64 {
        self.bytes_copied.load(Ordering::Relaxed)
    }

    /// Finish progress with success message
    pub fn finish_success(&self, message: &str) {
        self.status.finish_with_message(format!("✓ {}", message));
        self.tasks_bar.finish();
    }

    /// Finish progress with error message
    pub fn finish_error(&self, message: &str) {
        self.status.finish_with_message(format!("✗ {}", message));
        self.tasks_bar.abandon();
    }

    /// Check if progress is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
