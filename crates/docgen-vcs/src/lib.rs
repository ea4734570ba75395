//! Git-backed snapshots for docgen.
//!
//! [`GitRepository`] reads tags and branches through gix and exposes each
//! commit as a [`SnapshotTree`](docgen_vfs::SnapshotTree); [`WorkingTree`]
//! does the same for uncommitted files. [`resolve_versions`] decides which
//! of those snapshots are published as documentation versions.

mod error;
mod git;
mod versions;
mod working_tree;

pub use error::VcsError;
pub use git::{GitRepository, GitSnapshot};
pub use versions::{
    DEV_VERSION, Revision, SnapshotProvider, Version, VersionOptions, default_version, parse_tag,
    resolve_versions,
};
pub use working_tree::WorkingTree;
