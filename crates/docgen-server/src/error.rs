//! Error types for the development server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docgen_bundler::BundleError;

use crate::BoxError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No bundle file matches the request path.
    #[error("File not found: {0}")]
    NotFound(String),

    /// Building the bundle failed.
    #[error("Could not create bundle: {0}")]
    Compile(#[source] BoxError),

    /// Rendering the matched file failed.
    #[error(transparent)]
    Render(#[from] BundleError),

    /// Render task panicked or was cancelled.
    #[error("Render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Listen address is malformed.
    #[error("Invalid address: {0}")]
    Address(#[from] std::net::AddrParseError),

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Render(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(error = %self, "Not found");
            return (status, "Not Found").into_response();
        }
        tracing::error!(error = %self, "Request failed");
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use docgen_vfs::VfsError;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_status() {
        assert_eq!(ServerError::NotFound("x".to_owned()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServerError::Render(BundleError::Source(VfsError::not_found("x.md"))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Compile("no versions".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
