//! In-memory snapshot for testing.
//!
//! Provides [`MemoryTree`] for unit testing without a git repository.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::VfsError;
use crate::tree::{SnapshotTree, TreeEntry};

/// Mode used by [`MemoryTree::with_file`].
const DEFAULT_MODE: u32 = 0o100_644;

/// In-memory snapshot tree.
///
/// Use the builder methods to configure the tree with test data.
///
/// # Example
///
/// ```ignore
/// use docgen_vfs::MemoryTree;
///
/// let tree = MemoryTree::new()
///     .with_file("docs/intro.md", "# Intro")
///     .with_file("docs/guide/setup.md", "# Setup");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryTree {
    files: BTreeMap<String, (u32, Vec<u8>)>,
    timestamp: SystemTime,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self {
            files: BTreeMap::new(),
            timestamp: UNIX_EPOCH,
        }
    }
}

impl MemoryTree {
    /// Create a new empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular file.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.with_file_mode(path, content, DEFAULT_MODE)
    }

    /// Add a file with explicit mode bits.
    #[must_use]
    pub fn with_file_mode(
        mut self,
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
        mode: u32,
    ) -> Self {
        self.files.insert(path.into(), (mode, content.into()));
        self
    }

    /// Set the snapshot timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl SnapshotTree for MemoryTree {
    fn entries(&self) -> Result<Vec<TreeEntry>, VfsError> {
        Ok(self
            .files
            .iter()
            .map(|(path, (mode, content))| TreeEntry::new(path.clone(), *mode, content.len() as u64))
            .collect())
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, VfsError> {
        let (_, content) = self
            .files
            .get(path)
            .ok_or_else(|| VfsError::not_found(path).with_backend("Memory"))?;
        Ok(Box::new(Cursor::new(content.clone())))
    }

    fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_tree_entries() {
        let tree = MemoryTree::new()
            .with_file("b.md", "bb")
            .with_file("a.md", "a");

        let entries = tree.entries().unwrap();
        assert_eq!(
            entries,
            vec![
                TreeEntry::new("a.md", 0o100_644, 1),
                TreeEntry::new("b.md", 0o100_644, 2),
            ]
        );
    }

    #[test]
    fn test_memory_tree_open_missing() {
        let tree = MemoryTree::new();

        let err = tree.open("missing.md").err().unwrap();
        assert!(err.is_not_found());
        assert_eq!(err.backend, Some("Memory"));
    }
}
