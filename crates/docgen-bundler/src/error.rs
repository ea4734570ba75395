//! Error types for bundling and rendering.

use std::io;

use docgen_vfs::VfsError;

/// Link resolution error.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Link could not be parsed.
    #[error("Cannot parse link {link:?}: {source}")]
    Parse {
        /// Original link text.
        link: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// Relative link inside a file without a tag.
    #[error("Cannot resolve {link:?} relative to untagged file {source_path}")]
    Untagged {
        /// Original link text.
        link: String,
        /// Source path of the file containing the link.
        source_path: String,
    },

    /// No file with this tag and source path exists in the bundle.
    #[error("Tagged file not found: {path} (tag: {tag})")]
    NotFound {
        /// Tag searched in.
        tag: String,
        /// Normalized source path.
        path: String,
    },
}

/// Error raised by a content stage.
#[derive(Debug, thiserror::Error)]
pub enum ModifyError {
    /// Reading the input or writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A link could not be resolved.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Any other stage-specific failure (template, parser, ...).
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl ModifyError {
    /// Wrap a stage-specific error.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }

    /// True if the stage failed because its consumer stopped reading.
    #[must_use]
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Self::Io(err) if err.kind() == io::ErrorKind::BrokenPipe)
    }
}

/// Bundle compilation and rendering error.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Root URL is malformed or cannot have paths joined onto it.
    #[error("Invalid root URL {url:?}: {reason}")]
    InvalidRootUrl {
        /// Configured root URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Two tagged mappings share the same tag and source path.
    #[error("Duplicate source path {path} for tag {tag}")]
    DuplicateSource {
        /// Shared tag.
        tag: String,
        /// Shared source path.
        path: String,
    },

    /// No mapping produces this destination path.
    #[error("File not found in bundle: {0}")]
    NotFound(String),

    /// Listing or opening a source failed.
    #[error("Source error: {0}")]
    Source(#[from] VfsError),

    /// Rendering a mapping failed.
    #[error("Could not render {path}: {source}")]
    Render {
        /// Destination path being rendered.
        path: String,
        /// Stage error.
        #[source]
        source: ModifyError,
    },

    /// Writing rendered output failed.
    #[error("Could not write {}: {source}", path.display())]
    Output {
        /// Output file path.
        path: std::path::PathBuf,
        /// I/O error.
        #[source]
        source: io::Error,
    },
}

impl BundleError {
    /// True if the error means the requested file does not exist.
    ///
    /// Covers missing destination paths, missing source files and missing
    /// tagged link targets, so callers can fall back to other candidates.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Source(err) => err.is_not_found(),
            Self::Render {
                source: ModifyError::Link(LinkError::NotFound { .. }),
                ..
            } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_broken_pipe() {
        assert!(ModifyError::from(io::Error::from(io::ErrorKind::BrokenPipe)).is_broken_pipe());
        assert!(!ModifyError::from(io::Error::other("boom")).is_broken_pipe());
        assert!(!ModifyError::other("boom").is_broken_pipe());
    }

    #[test]
    fn test_bundle_error_is_not_found() {
        assert!(BundleError::NotFound("v1/x.html".to_owned()).is_not_found());
        assert!(BundleError::Source(VfsError::not_found("x.md")).is_not_found());
        assert!(
            BundleError::Render {
                path: "index.html".to_owned(),
                source: ModifyError::Link(LinkError::NotFound {
                    tag: "v1".to_owned(),
                    path: "x.md".to_owned(),
                }),
            }
            .is_not_found()
        );
        assert!(
            !BundleError::DuplicateSource {
                tag: "v1".to_owned(),
                path: "x.md".to_owned(),
            }
            .is_not_found()
        );
    }

    #[test]
    fn test_display() {
        let err = BundleError::DuplicateSource {
            tag: "v1".to_owned(),
            path: "intro.md".to_owned(),
        };
        assert_eq!(err.to_string(), "Duplicate source path intro.md for tag v1");

        let err = LinkError::NotFound {
            tag: "v1".to_owned(),
            path: "missing.md".to_owned(),
        };
        assert_eq!(err.to_string(), "Tagged file not found: missing.md (tag: v1)");
    }

    #[test]
    fn test_errors_are_send_sync() {
        static_assertions::assert_impl_all!(BundleError: Send, Sync);
        static_assertions::assert_impl_all!(ModifyError: Send, Sync);
    }
}
