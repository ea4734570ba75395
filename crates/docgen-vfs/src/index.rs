//! Sorted path index and open file handles.

use std::collections::HashSet;
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::{VfsError, VfsErrorKind};
use crate::path;
use crate::tree::SnapshotTree;

/// Permission bits reported for synthesized directories.
const DIR_MODE: u32 = 0o555;

/// One file or synthesized directory of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    /// Normalized slash-separated path.
    pub path: String,
    /// True for synthesized directories.
    pub is_dir: bool,
    /// Permission bits.
    pub mode: u32,
    /// Content size in bytes (0 for directories).
    pub size: u64,
}

/// File metadata returned by `stat` and directory listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Last path segment (empty for the root).
    pub name: String,
    /// Full normalized path (empty for the root).
    pub path: String,
    /// Content size in bytes (0 for directories).
    pub size: u64,
    /// Permission bits.
    pub mode: u32,
    /// True for directories.
    pub is_dir: bool,
    /// Snapshot-level timestamp.
    pub modified: SystemTime,
}

/// Hierarchical view over a flat snapshot listing.
///
/// Built once per snapshot and never mutated. All entries live in one array
/// sorted with [`path::compare`], which places every directory's descendants
/// directly after it. Lookups are binary searches and directory listings are
/// forward scans over that contiguous range.
pub struct SnapshotIndex {
    tree: Arc<dyn SnapshotTree>,
    entries: Vec<PathEntry>,
    modified: SystemTime,
}

impl SnapshotIndex {
    /// Build the index from a snapshot's leaf files.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError`] if the snapshot cannot be iterated.
    pub fn build(tree: Arc<dyn SnapshotTree>) -> Result<Self, VfsError> {
        let files = tree.entries()?;
        let mut entries = Vec::with_capacity(files.len());
        let mut dirs: HashSet<String> = HashSet::new();

        for file in files {
            let file_path = path::clean(file.path.trim_start_matches('/'));
            if file_path == "." || file_path == ".." || file_path.starts_with("../") {
                tracing::warn!(path = %file.path, "Skipping snapshot entry outside of the root");
                continue;
            }

            // Ancestors are inserted bottom-up, so an already known directory
            // means all of its ancestors are known too.
            let mut dir = path::parent(&file_path);
            while dir != "." && dirs.insert(dir.to_owned()) {
                entries.push(PathEntry {
                    path: dir.to_owned(),
                    is_dir: true,
                    mode: DIR_MODE,
                    size: 0,
                });
                dir = path::parent(dir);
            }

            entries.push(PathEntry {
                path: file_path,
                is_dir: false,
                mode: file.mode & 0o777,
                size: file.size,
            });
        }

        entries.sort_by(|a, b| path::compare(&a.path, &b.path));
        entries.dedup_by(|a, b| a.path == b.path);

        tracing::debug!(
            entries = entries.len(),
            directories = dirs.len(),
            "Built snapshot index"
        );

        Ok(Self {
            modified: tree.timestamp(),
            tree,
            entries,
        })
    }

    /// All entries in index order.
    #[must_use]
    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    /// Number of files and directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the snapshot has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot-level modification time.
    #[must_use]
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Check whether a path exists. Invalid paths never exist.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        match path::normalize(name) {
            Ok(normalized) => normalized.is_empty() || self.find(&normalized).is_some(),
            Err(_) => false,
        }
    }

    /// Open a file or directory.
    ///
    /// `"."` opens the root directory.
    ///
    /// # Errors
    ///
    /// Returns an invalid path error for empty, absolute or `..` paths and a
    /// not found error if the path is absent from the snapshot.
    pub fn open(self: &Arc<Self>, name: &str) -> Result<SnapshotFile, VfsError> {
        let entry = self.lookup(name)?;
        Ok(SnapshotFile {
            index: Arc::clone(self),
            entry,
            cursor: entry.map_or(0, |i| i + 1),
            reader: None,
        })
    }

    /// Describe a file or directory without opening it.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SnapshotIndex::open`].
    pub fn stat(&self, name: &str) -> Result<FileInfo, VfsError> {
        let entry = self.lookup(name)?;
        Ok(self.info(entry))
    }

    /// List the immediate children of a directory.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SnapshotIndex::open`], plus a not-a-directory
    /// error for files.
    pub fn read_dir(self: &Arc<Self>, name: &str) -> Result<Vec<FileInfo>, VfsError> {
        self.open(name)?.read_dir(None)
    }

    fn lookup(&self, name: &str) -> Result<Option<usize>, VfsError> {
        let normalized = path::normalize(name)?;
        if normalized.is_empty() {
            return Ok(None);
        }
        self.find(&normalized)
            .map(Some)
            .ok_or_else(|| VfsError::not_found(name))
    }

    fn find(&self, normalized: &str) -> Option<usize> {
        self.entries
            .binary_search_by(|e| path::compare(&e.path, normalized))
            .ok()
    }

    fn info(&self, entry: Option<usize>) -> FileInfo {
        match entry.and_then(|i| self.entries.get(i)) {
            Some(e) => FileInfo {
                name: path::file_name(&e.path).to_owned(),
                path: e.path.clone(),
                size: if e.is_dir { 0 } else { e.size },
                mode: e.mode,
                is_dir: e.is_dir,
                modified: self.modified,
            },
            None => FileInfo {
                name: String::new(),
                path: String::new(),
                size: 0,
                mode: DIR_MODE,
                is_dir: true,
                modified: self.modified,
            },
        }
    }
}

impl fmt::Debug for SnapshotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotIndex")
            .field("entries", &self.entries.len())
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

/// Open handle to a file or directory of a [`SnapshotIndex`].
///
/// Files are read through [`Read`]; the content reader is only created on the
/// first read. Directories are enumerated with [`SnapshotFile::read_dir`],
/// which only moves forward.
pub struct SnapshotFile {
    index: Arc<SnapshotIndex>,
    /// Position in the index, `None` for the root directory.
    entry: Option<usize>,
    /// Next index position to inspect when listing a directory.
    cursor: usize,
    reader: Option<Box<dyn Read + Send>>,
}

impl SnapshotFile {
    /// Normalized path of the handle (empty for the root).
    #[must_use]
    pub fn path(&self) -> &str {
        self.entry
            .and_then(|i| self.index.entries.get(i))
            .map_or("", |e| e.path.as_str())
    }

    /// True if the handle refers to a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.entry
            .and_then(|i| self.index.entries.get(i))
            .is_none_or(|e| e.is_dir)
    }

    /// Describe the opened file or directory.
    #[must_use]
    pub fn stat(&self) -> FileInfo {
        self.index.info(self.entry)
    }

    /// Read the next directory entries.
    ///
    /// With `Some(n)` (n > 0) returns up to `n` immediate children, fewer only
    /// when the directory is exhausted. With `None` or `Some(0)` returns all
    /// remaining children. An empty result marks the end of the listing.
    ///
    /// # Errors
    ///
    /// Returns a not-a-directory error when called on a file.
    pub fn read_dir(&mut self, n: Option<usize>) -> Result<Vec<FileInfo>, VfsError> {
        if !self.is_dir() {
            return Err(VfsError::new(VfsErrorKind::NotADirectory).with_path(self.path()));
        }

        let limit = n.filter(|&n| n > 0);
        let prefix = match self.entry {
            Some(_) => format!("{}/", self.path()),
            None => String::new(),
        };

        let mut out = Vec::new();
        while let Some(entry) = self.index.entries.get(self.cursor) {
            if !entry.path.starts_with(&prefix) {
                self.cursor = self.index.entries.len();
                break;
            }
            self.cursor += 1;

            // Deeper descendants are passed over without being emitted.
            if entry.path[prefix.len()..].contains('/') {
                continue;
            }
            out.push(self.index.info(Some(self.cursor - 1)));
            if limit.is_some_and(|limit| out.len() >= limit) {
                break;
            }
        }
        Ok(out)
    }
}

impl Read for SnapshotFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_dir() {
            return Err(VfsError::new(VfsErrorKind::IsADirectory)
                .with_path(self.path())
                .into());
        }
        if self.reader.is_none() {
            let reader = self.index.tree.open(self.path())?;
            self.reader = Some(reader);
        }
        match self.reader.as_mut() {
            Some(reader) => reader.read(buf),
            None => Ok(0),
        }
    }
}

impl fmt::Debug for SnapshotFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotFile")
            .field("path", &self.path())
            .field("is_dir", &self.is_dir())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}
