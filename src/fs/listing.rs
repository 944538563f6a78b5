//! Directory listing
//!
//! Reading a directory is a blocking call. Listers implement [`DirLister`]
//! and are always driven from a blocking worker thread by the walker.

use crate::error::SortCopyError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::FileType;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Kind of a discovered filesystem node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Directory, descended into by the walker
    Directory,
    /// Regular file, copied into a bucket
    File,
    /// Anything else (sockets, fifos, unfollowed symlinks)
    Other,
}

impl EntryKind {
    fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// A discovered filesystem node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path to the entry (the listed directory joined with its name)
    pub path: PathBuf,
    /// Entry kind
    pub kind: EntryKind,
}

impl FileEntry {
    /// File name component of the entry path
    pub fn file_name(&self) -> Option<OsString> {
        self.path.file_name().map(|n| n.to_os_string())
    }
}

/// Outcome of listing one directory.
///
/// When reading fails part way through, `entries` keeps what was read before
/// the failure and `error` carries the failure. A single entry whose type
/// cannot be determined is skipped without ending the listing.
#[derive(Debug, Default)]
pub struct DirListing {
    /// Entries read, in the order the OS returned them
    pub entries: Vec<FileEntry>,
    /// Error that stopped the listing, if any
    pub error: Option<SortCopyError>,
}

impl DirListing {
    /// Listing that failed before any entry was read
    pub fn failed(error: SortCopyError) -> Self {
        Self {
            entries: Vec::new(),
            error: Some(error),
        }
    }
}

/// Blocking directory enumeration
pub trait DirLister: Send + Sync + 'static {
    /// List the immediate children of `dir`
    fn list(&self, dir: &Path) -> DirListing;
}

/// Lists directories on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister {
    follow_symlinks: bool,
}

impl FsLister {
    /// Create a lister. With `follow_symlinks`, links to regular files are
    /// reported as files; links to directories are always [`EntryKind::Other`].
    pub fn new(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }

    fn classify(&self, path: &Path, file_type: FileType) -> EntryKind {
        if file_type.is_symlink() {
            if !self.follow_symlinks {
                return EntryKind::Other;
            }
            return match std::fs::metadata(path) {
                Ok(meta) if meta.is_file() => EntryKind::File,
                _ => EntryKind::Other,
            };
        }
        EntryKind::from_file_type(file_type)
    }

    /// Build a listing from `(path, file type)` pairs as produced by
    /// `read_dir`. An error from the iterator ends the listing; a failed
    /// file type only drops that entry (it vanished or cannot be queried).
    fn collect<I>(&self, dir: &Path, entries: I) -> DirListing
    where
        I: IntoIterator<Item = io::Result<(PathBuf, io::Result<FileType>)>>,
    {
        let mut listing = DirListing::default();
        for entry in entries {
            match entry {
                Ok((path, Ok(file_type))) => {
                    let kind = self.classify(&path, file_type);
                    listing.entries.push(FileEntry { path, kind });
                }
                Ok((path, Err(e))) => {
                    warn!("Skipping '{}': {}", path.display(), e);
                }
                Err(e) => {
                    listing.error = Some(SortCopyError::io(dir, e));
                    break;
                }
            }
        }
        listing
    }
}

impl DirLister for FsLister {
    fn list(&self, dir: &Path) -> DirListing {
        let reader = match std::fs::read_dir(dir) {
            Ok(reader) => reader,
            Err(e) => return DirListing::failed(SortCopyError::io(dir, e)),
        };

        let entries = reader.map(|entry| entry.map(|entry| (entry.path(), entry.file_type())));
        self.collect(dir, entries)
    }
}
