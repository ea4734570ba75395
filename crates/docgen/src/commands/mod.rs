//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod files;
pub(crate) mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use docgen_bundler::Bundle;
use docgen_config::{CliSettings, Config};
use docgen_site::{SiteOptions, Theme, build_site};
use docgen_vcs::{GitRepository, VersionOptions, resolve_versions};

pub(crate) use build::BuildArgs;
pub(crate) use files::FilesArgs;
pub(crate) use serve::ServeArgs;

use crate::error::CliError;

/// Arguments shared by every command.
#[derive(Args)]
pub(crate) struct SiteArgs {
    /// Path to configuration file (default: auto-discover docgen.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the git repository (overrides config).
    #[arg(long, env = "DOCGEN_REPOSITORY")]
    pub repository: Option<PathBuf>,

    /// Web URL of the repository, e.g. https://github.com/owner/project (overrides config).
    #[arg(long, env = "DOCGEN_REPOSITORY_URL")]
    pub repository_url: Option<String>,

    /// Documentation directory within the repository (overrides config).
    #[arg(long)]
    pub docs: Option<String>,

    /// Main branch name (overrides config).
    #[arg(long)]
    pub main_branch: Option<String>,

    /// Publish uncommitted files as the "dev" version.
    #[arg(long)]
    pub with_working_dir: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl SiteArgs {
    /// CLI settings overriding the config file.
    pub(crate) fn cli_settings(&self) -> CliSettings {
        CliSettings {
            repository_dir: self.repository.clone(),
            repository_url: self.repository_url.clone(),
            docs_dir: self.docs.clone(),
            main_branch: self.main_branch.clone(),
            with_working_dir: self.with_working_dir.then_some(true),
            ..CliSettings::default()
        }
    }
}

/// Everything needed to build the site bundle from the repository.
#[derive(Debug, Clone)]
pub(crate) struct SiteSource {
    repository: PathBuf,
    versions: VersionOptions,
    templates_dir: Option<PathBuf>,
    assets_dir: Option<PathBuf>,
    repository_url: Option<String>,
}

impl SiteSource {
    pub(crate) fn from_config(config: &Config) -> Self {
        let repository = &config.repository_resolved;
        Self {
            repository: repository.path.clone(),
            versions: VersionOptions {
                docs_dir: repository.docs_dir.clone(),
                main_branch: repository.main_branch.clone(),
                with_working_dir: repository.with_working_dir,
            },
            templates_dir: config.theme_resolved.templates_dir.clone(),
            assets_dir: config.theme_resolved.assets_dir.clone(),
            repository_url: repository.url.clone(),
        }
    }

    /// Resolve the versions in the repository and compile the site under `root_url`.
    pub(crate) fn compile(&self, root_url: &str) -> Result<Bundle, CliError> {
        let theme = match &self.templates_dir {
            Some(dir) => Theme::load(dir)?,
            None => Theme::default(),
        };
        let repository = GitRepository::open(&self.repository)?;
        let versions = resolve_versions(&repository, &self.versions)?;
        tracing::debug!(
            versions = ?versions.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            root_url,
            "Compiling site"
        );
        let options = SiteOptions {
            docs_dir: self.versions.docs_dir.clone(),
            main_branch: self.versions.main_branch.clone(),
            repository_url: self.repository_url.clone(),
            assets_dir: self.assets_dir.clone(),
            theme: Arc::new(theme),
        };
        let bundle = build_site(&versions, &options)?.compile(root_url)?;
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_cli_settings() {
        let args = SiteArgs {
            config: None,
            repository: Some(PathBuf::from("/repo")),
            repository_url: None,
            docs: Some("manual".to_owned()),
            main_branch: None,
            with_working_dir: false,
            verbose: false,
        };

        let settings = args.cli_settings();
        assert_eq!(settings.repository_dir, Some(PathBuf::from("/repo")));
        assert_eq!(settings.docs_dir.as_deref(), Some("manual"));
        assert_eq!(settings.with_working_dir, None);
        assert_eq!(settings.main_branch, None);
    }

    #[test]
    fn test_site_source_from_config() {
        let mut config = Config::default();
        config.repository_resolved.with_working_dir = true;
        config.repository_resolved.url = Some("https://github.com/owner/project".to_owned());

        let source = SiteSource::from_config(&config);
        assert_eq!(source.versions.docs_dir, "docs");
        assert_eq!(source.versions.main_branch, "main");
        assert!(source.versions.with_working_dir);
        assert_eq!(source.repository_url.as_deref(), Some("https://github.com/owner/project"));
    }

    #[test]
    fn test_compile_missing_repository() {
        let temp = std::env::temp_dir().join("docgen-test-missing-repository");
        let mut config = Config::default();
        config.repository_resolved.path = temp;

        let err = SiteSource::from_config(&config).compile("http://localhost:8080").unwrap_err();
        assert!(matches!(err, CliError::Vcs(_)));
    }
}
