//! Errors of repository access and version resolution.

use std::path::PathBuf;

use docgen_vfs::VfsError;

/// Errors raised while reading snapshots or resolving versions.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// Repository could not be opened.
    #[error("Failed to open Git repository {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Git object or reference access failed.
    #[error("{context}: {source}")]
    Git {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Branch does not exist.
    #[error("Branch {0} not found")]
    BranchNotFound(String),

    /// No tag, branch or working tree contains the docs directory.
    #[error("No documentation versions found: no snapshot contains {0}")]
    NoVersions(String),

    /// Snapshot could not be indexed.
    #[error(transparent)]
    Vfs(#[from] VfsError),
}

impl VcsError {
    pub(crate) fn git(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Git {
            context: context.into(),
            source: source.into(),
        }
    }
}
