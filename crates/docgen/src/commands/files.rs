//! `docgen files` command implementation.

use clap::Args;
use docgen_config::Config;

use crate::commands::{SiteArgs, SiteSource};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the files command.
#[derive(Args)]
pub(crate) struct FilesArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Root URL the site is hosted under (overrides config).
    #[arg(long, env = "DOCGEN_URL")]
    pub url: Option<String>,
}

impl FilesArgs {
    /// Print every destination path of the site, one per line.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the site cannot be compiled.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let mut cli_settings = self.site.cli_settings();
        cli_settings.root_url = self.url;
        let config = Config::load(self.site.config.as_deref(), Some(&cli_settings))?;

        let bundle = SiteSource::from_config(&config).compile(&config.site.root_url)?;
        for file in bundle.files() {
            output.print(file)?;
        }
        Ok(())
    }
}
