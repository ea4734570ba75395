//! Snapshot provider abstraction.

use std::io::Read;
use std::time::SystemTime;

use crate::error::VfsError;

/// One leaf entry of a snapshot as reported by its provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Slash-separated path relative to the snapshot root.
    pub path: String,
    /// Unix mode bits as stored by the provider (e.g. `0o100644`).
    pub mode: u32,
    /// Content size in bytes.
    pub size: u64,
}

impl TreeEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(path: impl Into<String>, mode: u32, size: u64) -> Self {
        Self {
            path: path.into(),
            mode,
            size,
        }
    }
}

/// Immutable, point-in-time tree of files.
///
/// Providers only need to expose a flat list of leaf files and a way to read
/// one of them. Directory structure is derived by [`SnapshotIndex`](crate::SnapshotIndex).
pub trait SnapshotTree: Send + Sync {
    /// List every leaf file of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError`] if the snapshot cannot be iterated.
    fn entries(&self) -> Result<Vec<TreeEntry>, VfsError>;

    /// Open the content of a leaf file for reading.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError`] if the file does not exist or its content cannot be read.
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, VfsError>;

    /// Time the snapshot was taken.
    ///
    /// Used as the modification time of every file in the snapshot.
    fn timestamp(&self) -> SystemTime;
}
