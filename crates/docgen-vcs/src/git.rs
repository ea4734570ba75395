//! Snapshots of commits in a git repository, read through gix.

use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use docgen_vfs::{SnapshotTree, TreeEntry, VfsError, VfsErrorKind};
use gix::ObjectId;
use gix::objs::tree::EntryKind;

use crate::error::VcsError;
use crate::versions::{Revision, SnapshotProvider};
use crate::working_tree::WorkingTree;

/// Git repository opened for reading tags, branches and their trees.
#[derive(Clone)]
pub struct GitRepository {
    path: PathBuf,
    repo: gix::ThreadSafeRepository,
}

impl GitRepository {
    /// Open the repository at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Open`] if `path` is not a git repository.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, VcsError> {
        let path = path.into();
        let repo = gix::open(&path).map_err(|err| VcsError::Open {
            path: path.clone(),
            source: Box::new(err),
        })?;
        Ok(Self {
            path,
            repo: repo.into_sync(),
        })
    }

    /// Path the repository was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Short names of all tags, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Git`] if references cannot be read.
    pub fn tags(&self) -> Result<Vec<String>, VcsError> {
        let repo = self.repo.to_thread_local();
        let references = repo
            .references()
            .map_err(|err| VcsError::git("Failed to read references", err))?;
        let tags = references
            .tags()
            .map_err(|err| VcsError::git("Failed to read tags", err))?;

        let mut names = Vec::new();
        for reference in tags {
            let reference = reference.map_err(|err| VcsError::git("Failed to read tag", err))?;
            names.push(reference.name().shorten().to_string());
        }
        names.sort();
        Ok(names)
    }

    /// Snapshot of the commit a tag points to. Annotated tags are peeled.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Git`] if the tag does not resolve to a commit.
    pub fn tag_snapshot(&self, tag: &str) -> Result<GitSnapshot, VcsError> {
        self.snapshot(&format!("refs/tags/{tag}"))
    }

    /// Snapshot of the tip of a local branch.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::BranchNotFound`] if the branch does not exist.
    pub fn branch_snapshot(&self, branch: &str) -> Result<GitSnapshot, VcsError> {
        let full_name = format!("refs/heads/{branch}");
        let exists = self
            .repo
            .to_thread_local()
            .try_find_reference(full_name.as_str())
            .map_err(|err| VcsError::git(format!("Failed to look up branch {branch}"), err))?
            .is_some();
        if !exists {
            return Err(VcsError::BranchNotFound(branch.to_owned()));
        }
        self.snapshot(&full_name)
    }

    fn snapshot(&self, full_name: &str) -> Result<GitSnapshot, VcsError> {
        let repo = self.repo.to_thread_local();
        let context = || format!("Failed to read {full_name}");

        let id = repo
            .rev_parse_single(format!("{full_name}^{{commit}}").as_str())
            .map_err(|err| VcsError::git(context(), err))?;
        let commit = repo
            .find_object(id)
            .map_err(|err| VcsError::git(context(), err))?
            .try_into_commit()
            .map_err(|err| VcsError::git(context(), err))?;
        let seconds = commit
            .time()
            .map_err(|err| VcsError::git(context(), err))?
            .seconds;
        let tree = commit.tree().map_err(|err| VcsError::git(context(), err))?;

        let mut recorder = gix::traverse::tree::Recorder::default();
        tree.traverse()
            .breadthfirst(&mut recorder)
            .map_err(|err| VcsError::git(context(), err))?;

        let mut entries = Vec::with_capacity(recorder.records.len());
        let mut objects = HashMap::with_capacity(recorder.records.len());
        for record in recorder.records {
            let mode = match record.mode.kind() {
                EntryKind::Blob => 0o100_644,
                EntryKind::BlobExecutable => 0o100_755,
                EntryKind::Link => 0o120_000,
                // Directories are derived from file paths; submodules are not followed.
                EntryKind::Tree | EntryKind::Commit => continue,
            };
            let size = repo
                .find_header(record.oid)
                .map_err(|err| VcsError::git(context(), err))?
                .size();
            let path = record.filepath.to_string();
            entries.push(TreeEntry::new(path.clone(), mode, size));
            objects.insert(path, record.oid);
        }

        tracing::debug!(revision = full_name, files = entries.len(), "Read git snapshot");
        Ok(GitSnapshot {
            repo: self.repo.clone(),
            revision: full_name.to_owned(),
            entries,
            objects,
            timestamp: UNIX_EPOCH + Duration::from_secs(u64::try_from(seconds).unwrap_or(0)),
        })
    }
}

impl fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitRepository")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SnapshotProvider for GitRepository {
    fn tags(&self) -> Result<Vec<String>, VcsError> {
        GitRepository::tags(self)
    }

    fn snapshot(&self, revision: &Revision) -> Result<Arc<dyn SnapshotTree>, VcsError> {
        Ok(match revision {
            Revision::Tag(tag) => Arc::new(self.tag_snapshot(tag)?),
            Revision::Branch(branch) => Arc::new(self.branch_snapshot(branch)?),
            Revision::WorkingTree => Arc::new(WorkingTree::new(&self.path)),
        })
    }
}

/// Tree of one commit. Blob contents are read on open.
pub struct GitSnapshot {
    repo: gix::ThreadSafeRepository,
    revision: String,
    entries: Vec<TreeEntry>,
    objects: HashMap<String, ObjectId>,
    timestamp: SystemTime,
}

impl GitSnapshot {
    /// Full reference name the snapshot was taken from.
    #[must_use]
    pub fn revision(&self) -> &str {
        &self.revision
    }
}

impl fmt::Debug for GitSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitSnapshot")
            .field("revision", &self.revision)
            .field("files", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl SnapshotTree for GitSnapshot {
    fn entries(&self) -> Result<Vec<TreeEntry>, VfsError> {
        Ok(self.entries.clone())
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, VfsError> {
        let Some(&oid) = self.objects.get(path) else {
            return Err(VfsError::not_found(path).with_backend("Git"));
        };
        let repo = self.repo.to_thread_local();
        let object = repo
            .find_object(oid)
            .map_err(|err| {
                VfsError::new(VfsErrorKind::Unavailable)
                    .with_path(path)
                    .with_backend("Git")
                    .with_source(err)
            })?;
        Ok(Box::new(Cursor::new(object.detach().data)))
    }

    fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}
