//! CLI error types.

use docgen_bundler::BundleError;
use docgen_config::ConfigError;
use docgen_server::ServerError;
use docgen_site::SiteError;
use docgen_vcs::VcsError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Vcs(#[from] VcsError),

    #[error("{0}")]
    Site(#[from] SiteError),

    #[error("{0}")]
    Bundle(#[from] BundleError),

    #[error("{0}")]
    Server(#[from] ServerError),
}
