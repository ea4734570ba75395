//! `docgen build` command implementation.

use std::path::PathBuf;

use clap::Args;
use docgen_config::Config;

use crate::commands::{SiteArgs, SiteSource};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Root URL the site is hosted under, e.g. https://owner.github.io/project (overrides config).
    #[arg(long, env = "DOCGEN_URL")]
    pub url: Option<String>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    pub dest: Option<PathBuf>,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the repository cannot be read
    /// or any file fails to render.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let mut cli_settings = self.site.cli_settings();
        cli_settings.root_url = self.url;
        cli_settings.output_dir = self.dest;
        let config = Config::load(self.site.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!("Root URL: {}", config.site.root_url));
        output.info(&format!(
            "Repository: {}",
            config.repository_resolved.path.display()
        ));
        output.info(&format!(
            "Documentation directory: {}",
            config.repository_resolved.docs_dir
        ));
        output.highlight("Compiling...");

        let bundle = SiteSource::from_config(&config).compile(&config.site.root_url)?;
        bundle.store_in_dir(&config.output_dir)?;

        output.success(&format!(
            "Wrote {} files to {}",
            bundle.files().len(),
            config.output_dir.display()
        ));
        Ok(())
    }
}
