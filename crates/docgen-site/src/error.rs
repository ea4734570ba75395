//! Errors of site assembly.

use std::io;
use std::path::PathBuf;

use docgen_vfs::VfsError;

/// Errors raised while assembling the site rules.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// Snapshot could not be read.
    #[error(transparent)]
    Vfs(#[from] VfsError),

    /// Settings file is malformed.
    #[error("Invalid settings file {path}: {source}")]
    Settings {
        /// Settings file path inside the snapshot.
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Theme template could not be read.
    #[error("Failed to read template {}: {source}", path.display())]
    TemplateIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Theme template does not parse.
    #[error("Invalid template {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// Repository URL for source links is malformed.
    #[error("Invalid repository URL {url}: {source}")]
    RepositoryUrl {
        /// URL as configured.
        url: String,
        #[source]
        source: url::ParseError,
    },
}
