//! Copy tasks and task collections
//!
//! A [`CopyTask`] is spawned on the tokio runtime for every regular file the
//! walker finds. Handles are gathered in a [`TaskCollection`] which the
//! engine joins once the walk is done.

use crate::error::{Result, SortCopyError};
use crate::fs::{ensure_bucket, BucketResolver, CopyStats, StreamCopier};
use crate::progress::ProgressReporter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// State shared by every copy task of a run
pub struct CopyContext {
    /// Bucket resolver for the destination root
    pub resolver: BucketResolver,
    /// Streamed copier
    pub copier: StreamCopier,
    /// Optional cap on concurrently running copies
    pub limiter: Option<Arc<Semaphore>>,
    /// Optional progress display
    pub progress: Option<Arc<ProgressReporter>>,
}

impl CopyContext {
    /// Create a context with no concurrency cap and no progress display
    pub fn new(resolver: BucketResolver, copier: StreamCopier) -> Self {
        Self {
            resolver,
            copier,
            limiter: None,
            progress: None,
        }
    }

    /// Limit concurrently running copies (0 = unbounded)
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.limiter = (max > 0).then(|| Arc::new(Semaphore::new(max)));
        self
    }

    /// Set progress reporter
    pub fn with_progress(mut self, progress: Arc<ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Terminal status of a copy task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// File copied completely
    Succeeded {
        /// Bytes written to the destination
        bytes_copied: u64,
    },
    /// Copy failed; the destination may be missing or partial
    Failed {
        /// Error description
        error: String,
    },
}

/// Result of one copy task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyOutcome {
    /// Source file
    pub source: PathBuf,
    /// Destination file (bucket directory joined with the file name)
    pub destination: PathBuf,
    /// Terminal status
    pub status: TaskStatus,
}

impl CopyOutcome {
    /// Check whether the copy succeeded
    pub fn is_success(&self) -> bool {
        matches!(self.status, TaskStatus::Succeeded { .. })
    }

    /// Bytes copied (0 for failed tasks)
    pub fn bytes_copied(&self) -> u64 {
        match self.status {
            TaskStatus::Succeeded { bytes_copied } => bytes_copied,
            TaskStatus::Failed { .. } => 0,
        }
    }
}

/// One file to copy into its bucket
#[derive(Debug, Clone)]
pub struct CopyTask {
    /// Source file
    pub source: PathBuf,
    /// Resolved destination file
    pub destination: PathBuf,
}

impl CopyTask {
    /// Create a task for `source`, or `None` if the path has no file name
    pub fn new(source: PathBuf, resolver: &BucketResolver) -> Option<Self> {
        let destination = resolver.destination(source.file_name()?);
        Some(Self {
            source,
            destination,
        })
    }

    /// Spawn the task on the current tokio runtime
    pub fn spawn(self, context: Arc<CopyContext>) -> PendingTask {
        let source = self.source.clone();
        let destination = self.destination.clone();
        let handle = tokio::spawn(self.run(context));
        PendingTask {
            source,
            destination,
            handle,
        }
    }

    /// Run the copy to completion. Failures are logged and reported in the
    /// outcome, never returned as errors.
    pub async fn run(self, context: Arc<CopyContext>) -> CopyOutcome {
        let status = match self.execute(&context).await {
            Ok(stats) => {
                info!(
                    "File '{}' copied to '{}'",
                    self.source.display(),
                    self.destination.display()
                );
                TaskStatus::Succeeded {
                    bytes_copied: stats.bytes_copied,
                }
            }
            Err(e) => {
                error!("Error copying file '{}': {}", self.source.display(), e);
                TaskStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        let outcome = CopyOutcome {
            source: self.source,
            destination: self.destination,
            status,
        };

        if let Some(progress) = &context.progress {
            progress.task_finished(outcome.bytes_copied(), !outcome.is_success());
        }

        outcome
    }

    async fn execute(&self, context: &CopyContext) -> Result<CopyStats> {
        let _permit = match &context.limiter {
            Some(limiter) => Some(
                Arc::clone(limiter)
                    .acquire_owned()
                    .await
                    .map_err(|e| SortCopyError::TaskFailed(format!("Semaphore error: {}", e)))?,
            ),
            None => None,
        };

        if let Some(bucket) = self.destination.parent() {
            ensure_bucket(bucket).await?;
        }
        context.copier.copy(&self.source, &self.destination).await
    }
}

/// A spawned copy task that has not been joined yet
#[derive(Debug)]
pub struct PendingTask {
    source: PathBuf,
    destination: PathBuf,
    handle: JoinHandle<CopyOutcome>,
}

impl PendingTask {
    /// Source file of the task
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Wait for the task to reach a terminal state.
    ///
    /// A task that panicked or was aborted is reported as failed.
    pub async fn join(self) -> CopyOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    "Copy task for '{}' did not finish: {}",
                    self.source.display(),
                    e
                );
                CopyOutcome {
                    source: self.source,
                    destination: self.destination,
                    status: TaskStatus::Failed {
                        error: SortCopyError::TaskFailed(e.to_string()).to_string(),
                    },
                }
            }
        }
    }
}

/// All copy tasks spawned during one walk.
///
/// Append-only; the order of tasks carries no meaning.
#[derive(Debug, Default)]
pub struct TaskCollection {
    tasks: Vec<PendingTask>,
}

impl TaskCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a spawned task
    pub fn push(&mut self, task: PendingTask) {
        self.tasks.push(task);
    }

    /// Move every task of `other` into this collection
    pub fn merge(&mut self, other: TaskCollection) {
        self.tasks.extend(other.tasks);
    }

    /// Number of tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if no task was spawned
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate over the source files of the tasks
    pub fn sources(&self) -> impl Iterator<Item = &Path> {
        self.tasks.iter().map(PendingTask::source)
    }

    /// Wait for every task to reach a terminal state
    pub async fn join_all(self) -> Vec<CopyOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for task in self.tasks {
            outcomes.push(task.join().await);
        }
        outcomes
    }
}
