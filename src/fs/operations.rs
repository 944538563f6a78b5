//! Streamed file operations
//!
//! Copies file contents through a fixed-size buffer so memory use stays
//! bounded regardless of file size.

use crate::error::{IoResultExt, Result, SortCopyError};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Default chunk size for streamed copies
pub const CHUNK_SIZE: usize = 8192;

/// Copy operation statistics
#[derive(Debug, Clone, Default)]
pub struct CopyStats {
    /// Bytes copied
    pub bytes_copied: u64,
    /// Duration of the copy
    pub duration: Duration,
    /// Throughput in bytes/second
    pub throughput: f64,
}

impl CopyStats {
    /// Calculate throughput from bytes and duration
    pub fn calculate_throughput(&mut self) {
        if self.duration.as_secs_f64() > 0.0 {
            self.throughput = self.bytes_copied as f64 / self.duration.as_secs_f64();
        }
    }
}

/// Chunked async file copier
#[derive(Debug, Clone, Copy)]
pub struct StreamCopier {
    chunk_size: usize,
}

impl Default for StreamCopier {
    fn default() -> Self {
        Self::new(CHUNK_SIZE)
    }
}

impl StreamCopier {
    /// Create a copier with the given chunk size (0 falls back to [`CHUNK_SIZE`])
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 { CHUNK_SIZE } else { chunk_size };
        Self { chunk_size }
    }

    /// Chunk size in bytes
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Copy `source` into `dest`, creating or truncating `dest`.
    ///
    /// Both handles are closed when this returns, on success or error. A
    /// failure part way through leaves a partially written `dest`.
    pub async fn copy(&self, source: &Path, dest: &Path) -> Result<CopyStats> {
        let start = Instant::now();

        let mut reader = File::open(source).await.with_path(source)?;
        let mut writer = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(dest)
            .await
            .with_path(dest)?;

        let mut buffer = vec![0u8; self.chunk_size];
        let mut bytes_copied = 0u64;

        loop {
            let read = reader.read(&mut buffer).await.with_path(source)?;
            if read == 0 {
                break;
            }
            writer.write_all(&buffer[..read]).await.with_path(dest)?;
            bytes_copied += read as u64;
        }

        // tokio completes writes in the background; flush before the handle drops
        writer.flush().await.with_path(dest)?;

        let mut stats = CopyStats {
            bytes_copied,
            duration: start.elapsed(),
            throughput: 0.0,
        };
        stats.calculate_throughput();

        Ok(stats)
    }
}

/// Remove a file or directory tree
pub fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path).with_path(path)
    } else {
        std::fs::remove_file(path).with_path(path)
    }
}

/// Resolve a path to absolute form.
///
/// The longest existing ancestor is canonicalized and the missing remainder
/// appended, so paths that do not exist yet still compare reliably.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().with_path(path)?.join(path)
    };

    let mut existing = path.as_path();
    let mut missing = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(resolved) => {
                return Ok(missing
                    .iter()
                    .rev()
                    .fold(resolved, |acc: PathBuf, part| acc.join(part)));
            }
            Err(e) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = parent;
                }
                _ => return Err(SortCopyError::io(&path, e)),
            },
        }
    }
}

/// Clear the destination before a run.
///
/// Returns `true` when something was removed.
pub fn prepare_destination(dest: &Path) -> Result<bool> {
    if std::fs::symlink_metadata(dest).is_err() {
        return Ok(false);
    }
    remove_path(dest)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File as StdFile;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, size: usize) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = StdFile::create(&path).unwrap();
        let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        file.write_all(&data).unwrap();
        path
    }

    #[tokio::test]
    async fn test_copy_small_file() {
        let tmp = TempDir::new().unwrap();
        let src = create_test_file(tmp.path(), "src.bin", 100);
        let dst = tmp.path().join("dst.bin");

        let stats = StreamCopier::default().copy(&src, &dst).await.unwrap();

        assert_eq!(stats.bytes_copied, 100);
        assert_eq!(std::fs::read(&src).unwrap(), std::fs::read(&dst).unwrap());
    }

    #[tokio::test]
    async fn test_copy_spans_many_chunks() {
        let tmp = TempDir::new().unwrap();
        // Not a multiple of the chunk size, so the last read is short
        let size = CHUNK_SIZE * 5 + 123;
        let src = create_test_file(tmp.path(), "large.bin", size);
        let dst = tmp.path().join("large_copy.bin");

        let stats = StreamCopier::default().copy(&src, &dst).await.unwrap();

        assert_eq!(stats.bytes_copied, size as u64);
        assert_eq!(std::fs::read(&src).unwrap(), std::fs::read(&dst).unwrap());
    }

    #[tokio::test]
    async fn test_copy_empty_file() {
        let tmp = TempDir::new().unwrap();
        let src = create_test_file(tmp.path(), "empty", 0);
        let dst = tmp.path().join("empty_copy");

        let stats = StreamCopier::default().copy(&src, &dst).await.unwrap();

        assert_eq!(stats.bytes_copied, 0);
        assert!(dst.exists());
        assert_eq!(std::fs::metadata(&dst).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_copy_truncates_existing_destination() {
        let tmp = TempDir::new().unwrap();
        let src = create_test_file(tmp.path(), "short", 10);
        let dst = create_test_file(tmp.path(), "long", 10_000);

        StreamCopier::new(4).copy(&src, &dst).await.unwrap();

        assert_eq!(std::fs::read(&dst).unwrap(), std::fs::read(&src).unwrap());
    }

    #[tokio::test]
    async fn test_copy_missing_source() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("missing.txt");
        let dst = tmp.path().join("out.txt");

        let err = StreamCopier::default().copy(&src, &dst).await.unwrap_err();

        assert_eq!(err.path(), Some(&src));
        assert!(!dst.exists());
    }

    #[test]
    fn test_zero_chunk_size_falls_back() {
        assert_eq!(StreamCopier::new(0).chunk_size(), CHUNK_SIZE);
        assert_eq!(StreamCopier::new(64).chunk_size(), 64);
    }

    #[test]
    fn test_absolute_path_of_missing_path() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().canonicalize().unwrap();

        let resolved = absolute_path(&tmp.path().join("a/b")).unwrap();
        assert_eq!(resolved, base.join("a").join("b"));

        let dotted = absolute_path(&tmp.path().join(".")).unwrap();
        assert_eq!(dotted, base);
    }

    #[test]
    fn test_prepare_destination() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out");

        assert!(!prepare_destination(&dest).unwrap());

        std::fs::create_dir_all(dest.join("txt")).unwrap();
        create_test_file(&dest.join("txt"), "a.txt", 3);
        assert!(prepare_destination(&dest).unwrap());
        assert!(!dest.exists());

        create_test_file(tmp.path(), "out", 3);
        assert!(prepare_destination(&dest).unwrap());
        assert!(!dest.exists());
    }
}
