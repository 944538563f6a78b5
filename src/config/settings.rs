//! Configuration settings for SortCopy
//!
//! Defines CLI arguments, the runtime configuration and the preconditions a
//! run relies on.

use crate::error::{Result, SortCopyError};
use crate::fs::{absolute_path, CHUNK_SIZE};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the default log file, never copied by a run
pub const DEFAULT_LOG_FILE: &str = "sorting.log";

/// Largest accepted copy chunk size (64 MiB); every task allocates one chunk
pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// SortCopy - copy a directory tree into per-extension folders
#[derive(Parser, Debug, Clone)]
#[command(name = "sortcopy")]
#[command(author = "SortCopy Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Concurrently copy files into folders named after their extension")]
#[command(long_about = r#"
SortCopy walks SOURCE recursively and copies every regular file into
DESTINATION/<extension>/<file name>. Extensions are lowercased; files without
one go to DESTINATION/other. DESTINATION is deleted before the run starts.

Examples:
  sortcopy ~/Downloads ~/sorted                 # Basic sort
  sortcopy ./photos ./by-type --max-concurrent 64
  RUST_LOG=debug sortcopy ./src ./out --progress
"#)]
pub struct CliArgs {
    /// Source directory
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Destination directory (removed before the run if it exists)
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,

    /// Chunk size for streamed copies (e.g., 8K, 1M)
    #[arg(short = 'b', long, default_value = "8K", value_name = "SIZE")]
    pub buffer_size: String,

    /// Maximum number of files copied at once (0 = unbounded)
    #[arg(short = 'j', long, default_value = "0", value_name = "NUM")]
    pub max_concurrent: usize,

    /// Copy files reached through symbolic links
    #[arg(short = 'L', long)]
    pub follow_symlinks: bool,

    /// Log file path
    #[arg(long, default_value = DEFAULT_LOG_FILE, value_name = "PATH")]
    pub log_file: PathBuf,

    /// Show a progress bar
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only warnings and errors are logged, no summary)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Output format for the run summary
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

/// Output format for the run summary
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Runtime configuration for a sort run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortConfig {
    /// Source directory
    pub source: PathBuf,
    /// Destination root
    pub destination: PathBuf,
    /// Chunk size for streamed copies
    pub buffer_size: usize,
    /// Maximum number of concurrent copies (0 = unbounded)
    pub max_concurrent: usize,
    /// Copy files reached through symbolic links
    pub follow_symlinks: bool,
    /// File names that are never copied
    pub skip_names: Vec<String>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            buffer_size: CHUNK_SIZE,
            max_concurrent: 0,
            follow_symlinks: false,
            skip_names: vec![DEFAULT_LOG_FILE.to_string()],
        }
    }
}

/// Parse human-readable size string to bytes
pub fn parse_size(size: &str) -> std::result::Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("TB") || size.ends_with('T') {
        (size.trim_end_matches(|c| c == 'T' || c == 'B'), 1024u64 * 1024 * 1024 * 1024)
    } else if size.ends_with("GB") || size.ends_with('G') {
        (size.trim_end_matches(|c| c == 'G' || c == 'B'), 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        (size.trim_end_matches(|c| c == 'M' || c == 'B'), 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        (size.trim_end_matches(|c| c == 'K' || c == 'B'), 1024u64)
    } else if size.ends_with('B') {
        (size.trim_end_matches('B'), 1u64)
    } else {
        (size.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    if !num.is_finite() {
        return Err(format!("Size is not a finite number: {}", num_str));
    }
    if num < 0.0 {
        return Err(format!("Negative size: {}", num_str));
    }

    let bytes = num * multiplier as f64;
    if bytes >= u64::MAX as f64 {
        return Err(format!("Size too large: {}", size));
    }

    Ok(bytes as u64)
}

impl SortConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> std::result::Result<Self, String> {
        let mut config = Self {
            source: args.source.clone(),
            destination: args.destination.clone(),
            buffer_size: parse_size(&args.buffer_size)
                .map_err(|e| format!("Invalid buffer size: {}", e))?
                .try_into()
                .map_err(|_| format!("Invalid buffer size: {}", args.buffer_size))?,
            max_concurrent: args.max_concurrent,
            follow_symlinks: args.follow_symlinks,
            ..Default::default()
        };

        if let Some(name) = args.log_file.file_name() {
            let name = name.to_string_lossy().to_string();
            if !config.skip_names.contains(&name) {
                config.skip_names.push(name);
            }
        }

        Ok(config)
    }

    /// Check the preconditions of a run.
    ///
    /// The source must be an existing directory, and it must be neither the
    /// destination nor inside it (the destination is deleted before a run).
    pub fn validate(&self) -> Result<()> {
        if !self.source.exists() {
            return Err(SortCopyError::NotFound(self.source.clone()));
        }
        if !self.source.is_dir() {
            return Err(SortCopyError::NotADirectory(self.source.clone()));
        }
        if self.buffer_size == 0 {
            return Err(SortCopyError::config("buffer size must be greater than zero"));
        }
        if self.buffer_size > MAX_BUFFER_SIZE {
            return Err(SortCopyError::config(format!(
                "buffer size {} exceeds the maximum of {} bytes",
                self.buffer_size, MAX_BUFFER_SIZE
            )));
        }

        let source = absolute_path(&self.source)?;
        let destination = absolute_path(&self.destination)?;

        if source == destination {
            return Err(SortCopyError::SameSourceAndDestination(source));
        }
        if source.starts_with(&destination) {
            return Err(SortCopyError::config(format!(
                "source '{}' is inside destination '{}'",
                source.display(),
                destination.display()
            )));
        }

        Ok(())
    }
}
