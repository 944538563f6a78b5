//! Recursive directory walker
//!
//! Lists one directory at a time on a blocking worker, spawns a copy task
//! for every regular file and recurses into subdirectories. Copies start
//! while the walk is still running.

use crate::core::{CopyContext, CopyTask, TaskCollection};
use crate::error::SortCopyError;
use crate::fs::{DirLister, DirListing, EntryKind, FileEntry};
use futures::future::{BoxFuture, FutureExt};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

/// Walks a source tree and fans out copy tasks
pub struct DirectoryWalker {
    lister: Arc<dyn DirLister>,
    context: Arc<CopyContext>,
    skip_names: Vec<String>,
    excluded_dir: Option<PathBuf>,
}

impl DirectoryWalker {
    /// Create a walker that spawns tasks with `context`
    pub fn new(lister: Arc<dyn DirLister>, context: Arc<CopyContext>) -> Self {
        Self {
            lister,
            context,
            skip_names: Vec::new(),
            excluded_dir: None,
        }
    }

    /// File names that never get a copy task
    pub fn with_skip_names(mut self, names: Vec<String>) -> Self {
        self.skip_names = names;
        self
    }

    /// Directory that is never descended (the destination root)
    pub fn with_excluded_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded_dir = Some(dir.into());
        self
    }

    /// Walk `dir` and return every task spawned for its subtree.
    ///
    /// A directory that cannot be listed is logged and abandoned; tasks
    /// already spawned for its siblings are kept.
    pub fn walk(&self, dir: PathBuf) -> BoxFuture<'_, TaskCollection> {
        async move {
            let mut tasks = TaskCollection::new();
            let listing = self.list(&dir).await;

            for entry in listing.entries {
                match entry.kind {
                    EntryKind::Directory => {
                        if self.is_excluded(&entry.path) {
                            debug!("Skipping destination directory '{}'", entry.path.display());
                            continue;
                        }
                        tasks.merge(self.walk(entry.path).await);
                    }
                    EntryKind::File => {
                        if self.is_skipped(&entry) {
                            debug!("Skipping '{}'", entry.path.display());
                            continue;
                        }
                        if let Some(task) = CopyTask::new(entry.path, &self.context.resolver) {
                            tasks.push(task.spawn(Arc::clone(&self.context)));
                        }
                    }
                    EntryKind::Other => {}
                }
            }

            if let Some(e) = listing.error {
                error!("Error accessing directory '{}': {}", dir.display(), e);
            }

            tasks
        }
        .boxed()
    }

    async fn list(&self, dir: &Path) -> DirListing {
        let lister = Arc::clone(&self.lister);
        let path = dir.to_path_buf();
        match tokio::task::spawn_blocking(move || lister.list(&path)).await {
            Ok(listing) => listing,
            Err(e) => DirListing::failed(SortCopyError::TaskFailed(format!(
                "directory listing task failed: {}",
                e
            ))),
        }
    }

    fn is_skipped(&self, entry: &FileEntry) -> bool {
        entry.path.file_name().map_or(false, |name| {
            self.skip_names.iter().any(|skip| name == OsStr::new(skip))
        })
    }

    fn is_excluded(&self, dir: &Path) -> bool {
        self.excluded_dir.as_deref() == Some(dir)
    }
}
