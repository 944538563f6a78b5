//! Extension buckets
//!
//! Every copied file lands in `destination/<bucket>/<file name>`, where the
//! bucket is the lowercased extension of the file name.

use crate::error::{IoResultExt, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Bucket used for files without an extension
pub const FALLBACK_BUCKET: &str = "other";

/// Derive the bucket name for a file name.
///
/// The extension is whatever follows the last `.`, lowercased. Names without
/// a dot, names ending in a dot and dot-files such as `.bashrc` fall back to
/// [`FALLBACK_BUCKET`].
pub fn bucket_name(file_name: &OsStr) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| FALLBACK_BUCKET.to_string())
}

/// Maps file names to bucket directories under a destination root
#[derive(Debug, Clone)]
pub struct BucketResolver {
    root: PathBuf,
}

impl BucketResolver {
    /// Create a resolver for the given destination root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Bucket directory for a file name, without touching the filesystem
    pub fn bucket_dir(&self, file_name: &OsStr) -> PathBuf {
        self.root.join(bucket_name(file_name))
    }

    /// Destination file for a file name: its bucket directory joined with
    /// the unchanged name
    pub fn destination(&self, file_name: &OsStr) -> PathBuf {
        self.bucket_dir(file_name).join(file_name)
    }
}

/// Ensure a bucket directory exists, creating missing parents (including the
/// destination root).
///
/// Safe to call from many tasks for the same bucket at once; a directory that
/// already exists is not an error.
pub async fn ensure_bucket(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await.with_path(dir)
}
