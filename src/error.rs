//! Error types for SortCopy
//!
//! Per-file and per-directory failures are turned into log entries by the
//! walker and the copy tasks; only run-level errors travel through `Result`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for SortCopy operations
#[derive(Error, Debug)]
pub enum SortCopyError {
    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path the operation was working on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File or directory not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Source and destination are the same
    #[error("Source and destination are the same: {0}")]
    SameSourceAndDestination(PathBuf),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A spawned copy task panicked or was aborted
    #[error("Copy task failed: {0}")]
    TaskFailed(String),

    /// Operation cancelled by user
    #[error("Operation cancelled")]
    Cancelled,
}

impl SortCopyError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. }
            | Self::NotFound(path)
            | Self::NotADirectory(path)
            | Self::SameSourceAndDestination(path) => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for SortCopy operations
pub type Result<T> = std::result::Result<T, SortCopyError>;

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| SortCopyError::io(path, e))
    }
}
