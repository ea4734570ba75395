//! Error type shared by the virtual filesystem and snapshot providers.

use std::io;

/// Semantic error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum VfsErrorKind {
    /// Path does not exist in the snapshot.
    NotFound,
    /// Path is empty, absolute or escapes the snapshot root.
    InvalidPath,
    /// File operation attempted on a directory.
    IsADirectory,
    /// Directory operation attempted on a file.
    NotADirectory,
    /// Snapshot backend could not be read.
    Unavailable,
    /// Other/unknown error category.
    Other,
}

/// Virtual filesystem error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct VfsError {
    /// Semantic error category.
    pub kind: VfsErrorKind,
    /// Path context (if applicable).
    pub path: Option<String>,
    /// Backend identifier (e.g., "Git", "Dir", "Memory").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl VfsError {
    /// Create a new error of the given kind.
    #[must_use]
    pub fn new(kind: VfsErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(VfsErrorKind::NotFound).with_path(path)
    }

    /// Create an invalid path error.
    #[must_use]
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::new(VfsErrorKind::InvalidPath).with_path(path)
    }

    /// Create an error from an I/O error.
    #[must_use]
    pub fn io(err: io::Error, path: Option<String>) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => VfsErrorKind::NotFound,
            io::ErrorKind::InvalidInput => VfsErrorKind::InvalidPath,
            io::ErrorKind::IsADirectory => VfsErrorKind::IsADirectory,
            io::ErrorKind::NotADirectory => VfsErrorKind::NotADirectory,
            _ => VfsErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }

    /// Returns `true` if the error means the path does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == VfsErrorKind::NotFound
    }
}

impl std::fmt::Display for VfsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            VfsErrorKind::NotFound => "Not found",
            VfsErrorKind::InvalidPath => "Invalid path",
            VfsErrorKind::IsADirectory => "Is a directory",
            VfsErrorKind::NotADirectory => "Not a directory",
            VfsErrorKind::Unavailable => "Unavailable",
            VfsErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {path})")?;
        }

        Ok(())
    }
}

impl std::error::Error for VfsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<VfsError> for io::Error {
    fn from(err: VfsError) -> Self {
        let kind = match err.kind {
            VfsErrorKind::NotFound => io::ErrorKind::NotFound,
            VfsErrorKind::InvalidPath => io::ErrorKind::InvalidInput,
            VfsErrorKind::IsADirectory => io::ErrorKind::IsADirectory,
            VfsErrorKind::NotADirectory => io::ErrorKind::NotADirectory,
            VfsErrorKind::Unavailable | VfsErrorKind::Other => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
