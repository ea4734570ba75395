//! Uncommitted files of a checkout as a snapshot.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use docgen_vfs::{SnapshotTree, TreeEntry, VfsError, VfsErrorKind, path};

/// Files on disk below a checkout root.
///
/// Hidden files (including `.git`) and files excluded by `.gitignore` are
/// skipped. The timestamp is the moment the tree was created.
#[derive(Debug, Clone)]
pub struct WorkingTree {
    root: PathBuf,
    timestamp: SystemTime,
}

impl WorkingTree {
    /// Snapshot the files below `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            timestamp: SystemTime::now(),
        }
    }

    /// Checkout root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(unix)]
fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o100_444
    } else {
        0o100_644
    }
}

impl SnapshotTree for WorkingTree {
    fn entries(&self) -> Result<Vec<TreeEntry>, VfsError> {
        if !self.root.is_dir() {
            return Err(VfsError::not_found(self.root.display().to_string()).with_backend("WorkingTree"));
        }

        let mut entries = Vec::new();
        for entry in ignore::WalkBuilder::new(&self.root).build() {
            let entry = entry.map_err(|err| {
                VfsError::new(VfsErrorKind::Unavailable)
                    .with_backend("WorkingTree")
                    .with_source(err)
            })?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let metadata = entry.metadata().map_err(|err| {
                VfsError::new(VfsErrorKind::Unavailable)
                    .with_path(rel.display().to_string())
                    .with_backend("WorkingTree")
                    .with_source(err)
            })?;
            let rel: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            entries.push(TreeEntry::new(rel.join("/"), file_mode(&metadata), metadata.len()));
        }
        Ok(entries)
    }

    fn open(&self, rel: &str) -> Result<Box<dyn Read + Send>, VfsError> {
        let rel = path::normalize(rel)?;
        let file = File::open(self.root.join(&rel))
            .map_err(|err| VfsError::io(err, Some(rel)).with_backend("WorkingTree"))?;
        Ok(Box::new(file))
    }

    fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}
