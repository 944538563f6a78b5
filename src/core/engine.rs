//! Sort engine
//!
//! Runs one walk over the source tree, then waits for every copy task the
//! walk spawned. Individual copy failures do not fail the run.

use crate::config::SortConfig;
use crate::core::{CopyContext, CopyOutcome, DirectoryWalker, TaskStatus};
use crate::error::{Result, SortCopyError};
use crate::fs::{absolute_path, BucketResolver, DirLister, FsLister, StreamCopier};
use crate::progress::ProgressReporter;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// A failed copy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Source file
    pub source: PathBuf,
    /// Error description
    pub error: String,
}

/// Result of a sort run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Whether the walk found any file to copy
    pub files_found: bool,
    /// Copy tasks spawned
    pub tasks_spawned: usize,
    /// Tasks that succeeded
    pub succeeded: u64,
    /// Tasks that failed
    pub failed: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Total duration
    pub duration: Duration,
    /// Failed copies
    pub failures: Vec<TaskFailure>,
}

impl RunSummary {
    fn from_outcomes(outcomes: Vec<CopyOutcome>, duration: Duration) -> Self {
        let mut summary = Self {
            files_found: !outcomes.is_empty(),
            tasks_spawned: outcomes.len(),
            duration,
            ..Default::default()
        };

        for outcome in outcomes {
            match outcome.status {
                TaskStatus::Succeeded { bytes_copied } => {
                    summary.succeeded += 1;
                    summary.bytes_copied += bytes_copied;
                }
                TaskStatus::Failed { error } => {
                    summary.failed += 1;
                    summary.failures.push(TaskFailure {
                        source: outcome.source,
                        error,
                    });
                }
            }
        }

        summary
    }

    /// Check if every copy succeeded
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Average throughput in bytes/second
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.bytes_copied as f64 / secs
        } else {
            0.0
        }
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!("\n=== Sort Summary ===");
        if !self.files_found {
            println!("No files found.");
            return;
        }
        println!("Files found:     {}", self.tasks_spawned);
        println!("Files copied:    {}", self.succeeded);
        println!("Bytes copied:    {}", humansize::format_size(self.bytes_copied, humansize::BINARY));
        println!("Duration:        {:.2?}", self.duration);
        println!("Throughput:      {}/s", humansize::format_size(self.throughput() as u64, humansize::BINARY));

        if !self.failures.is_empty() {
            println!("\nFailures: {}", self.failures.len());
            for failure in &self.failures {
                println!("  {} - {}", failure.source.display(), failure.error);
            }
        }
    }
}

/// Orchestrates a sort run
pub struct SortEngine {
    /// Configuration
    config: SortConfig,
    /// Directory lister used by the walker
    lister: Arc<dyn DirLister>,
    /// Progress reporter
    progress: Option<Arc<ProgressReporter>>,
}

impl SortEngine {
    /// Create a new engine. Preconditions (see [`SortConfig::validate`]) are
    /// the caller's responsibility.
    pub fn new(config: SortConfig) -> Self {
        let lister = Arc::new(FsLister::new(config.follow_symlinks));
        Self {
            config,
            lister,
            progress: None,
        }
    }

    /// Replace the directory lister
    pub fn with_lister(mut self, lister: Arc<dyn DirLister>) -> Self {
        self.lister = lister;
        self
    }

    /// Set progress reporter
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Execute one run and wait for every spawned copy to finish
    pub async fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        info!(
            "Start sorting from '{}' to '{}'",
            self.config.source.display(),
            self.config.destination.display()
        );

        // The destination root is created by the first copy that needs a bucket
        let source = absolute_path(&self.config.source)?;
        let destination = absolute_path(&self.config.destination)?;

        if let Some(progress) = &self.progress {
            progress.set_status("Scanning source directory...");
        }

        let mut context = CopyContext::new(
            BucketResolver::new(&destination),
            StreamCopier::new(self.config.buffer_size),
        )
        .with_max_concurrent(self.config.max_concurrent);
        if let Some(progress) = &self.progress {
            context = context.with_progress(Arc::clone(progress));
        }

        let walker = DirectoryWalker::new(Arc::clone(&self.lister), Arc::new(context))
            .with_skip_names(self.config.skip_names.clone())
            .with_excluded_dir(destination);

        let tasks = walker.walk(source).await;

        if tasks.is_empty() {
            info!("No files found in '{}'", self.config.source.display());
            if let Some(progress) = &self.progress {
                progress.finish_success("No files found");
            }
            return Ok(RunSummary {
                duration: start_time.elapsed(),
                ..Default::default()
            });
        }

        if let Some(progress) = &self.progress {
            progress.set_total_tasks(tasks.len() as u64);
            progress.set_status("Copying files...");
        }

        let outcomes = tasks.join_all().await;
        let summary = RunSummary::from_outcomes(outcomes, start_time.elapsed());

        info!(
            "All tasks completed: {} copied, {} failed",
            summary.succeeded, summary.failed
        );
        if let Some(progress) = &self.progress {
            progress.finish_success("Sorting complete");
        }

        Ok(summary)
    }

    /// Execute one run, abandoning it when `shutdown` resolves first.
    ///
    /// Copies still in flight at that point are not waited for and may leave
    /// partially written files behind.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = shutdown => {
                warn!("Sorting was interrupted");
                if let Some(progress) = &self.progress {
                    progress.finish_error("Interrupted");
                }
                Err(SortCopyError::Cancelled)
            }
            result = self.run() => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(src: &TempDir, dst: &TempDir) -> SortConfig {
        SortConfig {
            source: src.path().to_path_buf(),
            destination: dst.path().join("sorted"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_empty_source() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::create_dir(src.path().join("empty_sub")).unwrap();
        std::fs::write(src.path().join("sorting.log"), b"log").unwrap();

        let summary = SortEngine::new(config(&src, &dst)).run().await.unwrap();

        assert!(!summary.files_found);
        assert_eq!(summary.tasks_spawned, 0);
        assert!(summary.is_success());
        assert!(!dst.path().join("sorted").exists());
    }

    #[tokio::test]
    async fn test_run_counts_outcomes() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join("a.txt"), b"hello").unwrap();
        std::fs::write(src.path().join("b.csv"), b"1,2,3").unwrap();

        let engine = SortEngine::new(config(&src, &dst)).with_progress(ProgressReporter::disabled());
        let summary = engine.run().await.unwrap();

        assert!(summary.files_found);
        assert_eq!(summary.tasks_spawned, 2);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.bytes_copied, 10);
        assert!(dst.path().join("sorted/txt/a.txt").is_file());
        assert!(dst.path().join("sorted/csv/b.csv").is_file());
    }

    #[tokio::test]
    async fn test_run_keeps_going_after_failed_copy() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join("a.txt"), b"blocked").unwrap();
        std::fs::write(src.path().join("b.csv"), b"1,2").unwrap();
        std::fs::write(src.path().join("c.md"), b"# c").unwrap();
        // A plain file where the txt bucket should go
        std::fs::create_dir_all(dst.path().join("sorted")).unwrap();
        std::fs::write(dst.path().join("sorted/txt"), b"").unwrap();

        let summary = SortEngine::new(config(&src, &dst)).run().await.unwrap();

        assert_eq!(summary.tasks_spawned, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert!(summary.failures[0].source.ends_with("a.txt"));
        assert_eq!(std::fs::read(dst.path().join("sorted/csv/b.csv")).unwrap(), b"1,2");
        assert_eq!(std::fs::read(dst.path().join("sorted/md/c.md")).unwrap(), b"# c");
    }

    #[tokio::test]
    async fn test_run_until_interrupted() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join("a.txt"), b"hello").unwrap();

        let engine = SortEngine::new(config(&src, &dst));
        let result = engine.run_until(std::future::ready(())).await;

        assert!(matches!(result, Err(SortCopyError::Cancelled)));
    }

    #[tokio::test]
    async fn test_run_until_completes() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join("a.txt"), b"hello").unwrap();

        let engine = SortEngine::new(config(&src, &dst));
        let summary = engine
            .run_until(std::future::pending::<()>())
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 1);
    }

    #[test]
    fn test_summary_from_outcomes() {
        let outcomes = vec![
            CopyOutcome {
                source: PathBuf::from("/s/a.txt"),
                destination: PathBuf::from("/d/txt/a.txt"),
                status: TaskStatus::Succeeded { bytes_copied: 42 },
            },
            CopyOutcome {
                source: PathBuf::from("/s/b.txt"),
                destination: PathBuf::from("/d/txt/b.txt"),
                status: TaskStatus::Failed {
                    error: "denied".to_string(),
                },
            },
        ];

        let summary = RunSummary::from_outcomes(outcomes, Duration::from_secs(1));

        assert!(summary.files_found);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.bytes_copied, 42);
        assert!(!summary.is_success());
        assert_eq!(summary.failures[0].source, PathBuf::from("/s/b.txt"));
        assert_eq!(summary.throughput(), 42.0);

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"tasks_spawned\":2"));
    }
}
