//! Read-only virtual filesystem over immutable tree snapshots.
//!
//! A snapshot (for example one git commit) usually only exposes a flat list of
//! leaf files. [`SnapshotIndex`] turns that list into a hierarchical, browsable
//! filesystem:
//!
//! - every ancestor directory is synthesized exactly once
//! - entries are kept in one sorted array, so existence checks are a binary
//!   search and listing a directory is a forward scan over a contiguous range
//! - file contents are fetched lazily from the backing [`SnapshotTree`]
//!
//! # Architecture
//!
//! The crate provides:
//! - [`SnapshotTree`] trait implemented by snapshot providers (git, working tree)
//! - [`SnapshotIndex`] with `open()`, `stat()` and `read_dir()`
//! - [`SnapshotFile`] handles implementing [`std::io::Read`]
//! - [`MemoryTree`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docgen_vfs::{MemoryTree, SnapshotIndex};
//!
//! let tree = MemoryTree::new().with_file("docs/intro.md", "# Intro");
//! let index = Arc::new(SnapshotIndex::build(Arc::new(tree))?);
//! let mut dir = index.open("docs")?;
//! for entry in dir.read_dir(None)? {
//!     println!("{}", entry.name);
//! }
//! ```

mod error;
mod index;
#[cfg(any(test, feature = "mock"))]
mod mock;
pub mod path;
mod tree;

pub use error::{VfsError, VfsErrorKind};
pub use index::{FileInfo, PathEntry, SnapshotFile, SnapshotIndex};
#[cfg(any(test, feature = "mock"))]
pub use mock::MemoryTree;
pub use tree::{SnapshotTree, TreeEntry};
