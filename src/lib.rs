//! # SortCopy - Concurrent Copy into Extension Buckets
//!
//! SortCopy walks a source directory tree and copies every regular file into
//! `destination/<extension>/<file name>`, running all copies concurrently on
//! a tokio runtime.
//!
//! ## Features
//!
//! - **Concurrent Fan-out**: one copy task per file, started while the walk runs
//! - **Blocking Offload**: directory listings run on blocking worker threads
//! - **Error Isolation**: unreadable directories and failed copies are logged,
//!   never fatal to the rest of the run
//! - **Streamed I/O**: fixed-size chunks keep memory flat for any file size
//!
//! ## Quick Start
//!
//! ```no_run
//! use sortcopy::config::SortConfig;
//! use sortcopy::core::SortEngine;
//! use std::path::PathBuf;
//!
//! # async fn demo() -> sortcopy::Result<()> {
//! let config = SortConfig {
//!     source: PathBuf::from("/downloads"),
//!     destination: PathBuf::from("/sorted"),
//!     ..Default::default()
//! };
//! config.validate()?;
//!
//! let summary = SortEngine::new(config).run().await?;
//! summary.print_summary();
//! # Ok(())
//! # }
//! ```
//!
//! Files land in buckets named after their lowercased extension:
//!
//! ```
//! use sortcopy::fs::bucket_name;
//! use std::ffi::OsStr;
//!
//! assert_eq!(bucket_name(OsStr::new("Photo.JPG")), "jpg");
//! assert_eq!(bucket_name(OsStr::new("Makefile")), "other");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod fs;
pub mod progress;

// Re-export commonly used types
pub use config::SortConfig;
pub use core::{RunSummary, SortEngine};
pub use error::{Result, SortCopyError};
pub use progress::ProgressReporter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use sortcopy::prelude::*;
    //! ```

    pub use crate::config::SortConfig;
    pub use crate::core::{CopyOutcome, RunSummary, SortEngine, TaskCollection};
    pub use crate::error::{Result, SortCopyError};
    pub use crate::fs::{bucket_name, BucketResolver, StreamCopier};
    pub use crate::progress::ProgressReporter;
}
