//! `docgen serve` command implementation.

use std::sync::Arc;

use clap::Args;
use docgen_config::Config;
use docgen_bundler::Bundle;
use docgen_server::{BoxError, CompileFn, ServerConfig, run_server};

use crate::commands::{SiteArgs, SiteSource};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Host to bind to (overrides config).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let mut cli_settings = self.site.cli_settings();
        cli_settings.host = self.host;
        cli_settings.port = self.port;
        let config = Config::load(self.site.config.as_deref(), Some(&cli_settings))?;

        let server_config = ServerConfig {
            host: config.server.host.clone(),
            port: config.server.port,
        };
        let root_url = server_config.root_url();
        output.info(&format!("Starting server on {root_url}"));
        output.info(&format!(
            "Repository: {}",
            config.repository_resolved.path.display()
        ));
        if config.repository_resolved.with_working_dir {
            output.info("Working directory: published as \"dev\"");
        }

        let source = SiteSource::from_config(&config);
        let compile: Arc<CompileFn> = Arc::new(move || -> Result<Bundle, BoxError> {
            Ok(source.compile(&root_url)?)
        });
        run_server(server_config, compile).await?;

        Ok(())
    }
}
