//! Development server for docgen.
//!
//! Serves a bundle over HTTP with axum. The bundle is rebuilt from scratch
//! for every request on a blocking thread, so the server always reflects the
//! current state of the repository.
//!
//! ```text
//! Browser ──HTTP──► axum fallback handler
//!                        │
//!                        └─► spawn_blocking ──► compile() ──► Bundle::write_file_to
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use docgen_server::{ServerConfig, run_server};
//!
//! let compile = Arc::new(move || Ok(bundler.compile("http://127.0.0.1:8080")?));
//! run_server(ServerConfig::default(), compile).await?;
//! ```

mod app;
mod error;
mod files;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use docgen_bundler::Bundle;

pub use error::ServerError;
use state::AppState;

/// Boxed error returned by [`CompileFn`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Builds the bundle served for one request.
pub type CompileFn = dyn Fn() -> Result<Bundle, BoxError> + Send + Sync;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// URL the server is reachable at, used as the bundle root URL.
    #[must_use]
    pub fn root_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Run the server until Ctrl-C is received.
///
/// # Errors
///
/// Returns an error if the address is invalid or the server fails to start.
pub async fn run_server(config: ServerConfig, compile: Arc<CompileFn>) -> Result<(), ServerError> {
    let state = Arc::new(AppState { compile });
    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
