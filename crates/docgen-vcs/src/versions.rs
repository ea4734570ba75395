//! Selection of the documentation versions to publish.
//!
//! Candidates are semantic-version tags, the main branch and optionally the
//! working tree. Only snapshots containing the docs directory are published,
//! and of the tags only the newest one per major version.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use docgen_vfs::{SnapshotIndex, SnapshotTree};

use crate::error::VcsError;

/// Name of the working-tree version.
pub const DEV_VERSION: &str = "dev";

/// Point in history a snapshot is taken from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Revision {
    Tag(String),
    Branch(String),
    WorkingTree,
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "tag {tag}"),
            Self::Branch(branch) => write!(f, "branch {branch}"),
            Self::WorkingTree => f.write_str("working tree"),
        }
    }
}

/// Source of tags and snapshots.
pub trait SnapshotProvider: Send + Sync {
    /// Short names of all tags.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] if tags cannot be listed.
    fn tags(&self) -> Result<Vec<String>, VcsError>;

    /// Snapshot of a revision.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] if the revision does not exist or cannot be read.
    fn snapshot(&self, revision: &Revision) -> Result<Arc<dyn SnapshotTree>, VcsError>;
}

/// What to look for when resolving versions.
#[derive(Debug, Clone)]
pub struct VersionOptions {
    /// Directory holding the documentation, relative to the repository root.
    pub docs_dir: String,
    /// Branch published under its own name.
    pub main_branch: String,
    /// Also publish uncommitted files as [`DEV_VERSION`].
    pub with_working_dir: bool,
}

/// One published documentation version.
#[derive(Debug, Clone)]
pub struct Version {
    /// Name used as URL segment and tag (`v2.x`, `main`, `dev`).
    pub name: String,
    /// Parsed tag version, `None` for branches and the working tree.
    pub semver: Option<semver::Version>,
    pub revision: Revision,
    /// Whether the site root redirects to this version.
    pub is_default: bool,
    pub index: Arc<SnapshotIndex>,
}

/// Resolve the published versions, in menu order: `dev`, the main branch,
/// then tags newest first. Exactly one version is marked default.
///
/// # Errors
///
/// Returns [`VcsError::NoVersions`] if no candidate contains the docs
/// directory, or the first error raised while reading a snapshot.
pub fn resolve_versions(
    provider: &dyn SnapshotProvider,
    options: &VersionOptions,
) -> Result<Vec<Version>, VcsError> {
    let mut tags: Vec<(semver::Version, String)> = provider
        .tags()?
        .into_iter()
        .filter_map(|tag| match parse_tag(&tag) {
            Some(version) => Some((version, tag)),
            None => {
                tracing::warn!(tag, "Skipping tag: not a semantic version");
                None
            }
        })
        .collect();
    tags.sort_by(|a, b| b.0.cmp(&a.0));

    let mut versions = Vec::new();
    let mut majors = HashSet::new();
    for (version, tag) in tags {
        if majors.contains(&version.major) {
            continue;
        }
        let revision = Revision::Tag(tag);
        let Some(index) = docs_snapshot(provider, &revision, &options.docs_dir)? else {
            continue;
        };
        majors.insert(version.major);
        versions.push(Version {
            name: format!("v{}.x", version.major),
            semver: Some(version),
            revision,
            is_default: false,
            index,
        });
    }
    let newest_tag = versions.first().map(|v| v.name.clone());

    let revision = Revision::Branch(options.main_branch.clone());
    if let Some(index) = docs_snapshot(provider, &revision, &options.docs_dir)? {
        versions.insert(
            0,
            Version {
                name: options.main_branch.clone(),
                semver: None,
                revision,
                is_default: false,
                index,
            },
        );
    }

    if options.with_working_dir {
        let revision = Revision::WorkingTree;
        if let Some(index) = docs_snapshot(provider, &revision, &options.docs_dir)? {
            versions.insert(
                0,
                Version {
                    name: DEV_VERSION.to_owned(),
                    semver: None,
                    revision,
                    is_default: false,
                    index,
                },
            );
        }
    }

    let default = if versions.iter().any(|v| v.revision == Revision::WorkingTree) {
        Some(DEV_VERSION.to_owned())
    } else {
        newest_tag.or_else(|| versions.first().map(|v| v.name.clone()))
    };
    let Some(default) = default else {
        return Err(VcsError::NoVersions(options.docs_dir.clone()));
    };
    for version in &mut versions {
        version.is_default = version.name == default;
    }

    tracing::info!(
        versions = ?versions.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        default = %default,
        "Resolved documentation versions"
    );
    Ok(versions)
}

/// Version the site root redirects to.
#[must_use]
pub fn default_version(versions: &[Version]) -> Option<&Version> {
    versions.iter().find(|v| v.is_default)
}

/// Parse a tag as a semantic version.
///
/// A leading `v` is ignored and missing minor/patch components default to
/// zero, so `v2`, `2.1` and `v2.1.0-rc.1` are all accepted.
#[must_use]
pub fn parse_tag(tag: &str) -> Option<semver::Version> {
    let raw = tag.strip_prefix(['v', 'V']).unwrap_or(tag);
    if let Ok(version) = semver::Version::parse(raw) {
        return Some(version);
    }

    let split = raw.find(['-', '+']).unwrap_or(raw.len());
    let (core, rest) = raw.split_at(split);
    let components = core.split('.').count();
    if components >= 3 {
        return None;
    }
    let padded = format!("{core}{}{rest}", ".0".repeat(3 - components));
    semver::Version::parse(&padded).ok()
}

/// Index a revision if it contains the docs directory.
fn docs_snapshot(
    provider: &dyn SnapshotProvider,
    revision: &Revision,
    docs_dir: &str,
) -> Result<Option<Arc<SnapshotIndex>>, VcsError> {
    let index = SnapshotIndex::build(provider.snapshot(revision)?)?;
    if index.stat(docs_dir).is_ok_and(|info| info.is_dir) {
        return Ok(Some(Arc::new(index)));
    }
    tracing::warn!(%revision, docs_dir, "Skipping version: docs directory does not exist");
    Ok(None)
}
