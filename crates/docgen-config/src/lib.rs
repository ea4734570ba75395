//! Configuration management for docgen.
//!
//! Parses `docgen.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.root_url`
//! - `repository.url`
//! - `server.host`

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override root URL of the published site.
    pub root_url: Option<String>,
    /// Override repository path.
    pub repository_dir: Option<PathBuf>,
    /// Override repository web URL.
    pub repository_url: Option<String>,
    /// Override docs directory.
    pub docs_dir: Option<String>,
    /// Override main branch.
    pub main_branch: Option<String>,
    /// Override working directory flag.
    pub with_working_dir: Option<bool>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
}

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "docgen.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site configuration.
    pub site: SiteConfig,
    /// Repository configuration (paths are relative strings from TOML).
    repository: RepositoryConfigRaw,
    /// Output configuration (paths are relative strings from TOML).
    output: OutputConfigRaw,
    /// Server configuration.
    pub server: ServerConfig,
    /// Theme configuration (paths are relative strings from TOML).
    theme: ThemeConfigRaw,

    /// Resolved repository configuration (set after loading).
    #[serde(skip)]
    pub repository_resolved: RepositoryConfig,
    /// Resolved output directory (set after loading).
    #[serde(skip)]
    pub output_dir: PathBuf,
    /// Resolved theme configuration (set after loading).
    #[serde(skip)]
    pub theme_resolved: ThemeConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Site configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// URL the site is published under. Links and assets are absolute URLs below it.
    pub root_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root_url: "http://localhost:8080".to_owned(),
        }
    }
}

/// Raw repository configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RepositoryConfigRaw {
    path: Option<String>,
    docs_dir: Option<String>,
    main_branch: Option<String>,
    url: Option<String>,
    with_working_dir: Option<bool>,
}

/// Resolved repository configuration with absolute paths.
#[derive(Debug, Default)]
pub struct RepositoryConfig {
    /// Git repository directory.
    pub path: PathBuf,
    /// Documentation directory relative to the repository root.
    pub docs_dir: String,
    /// Branch published under its own name.
    pub main_branch: String,
    /// Repository web URL used for "edit this page" links.
    pub url: Option<String>,
    /// Whether uncommitted files are published as the `dev` version.
    pub with_working_dir: bool,
}

/// Raw output configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    dir: Option<String>,
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
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

/// Raw theme configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ThemeConfigRaw {
    templates_dir: Option<String>,
    assets_dir: Option<String>,
}

/// Resolved theme configuration with absolute paths.
#[derive(Debug, Default)]
pub struct ThemeConfig {
    /// Directory overriding `layout.html` and `redirect.html`.
    pub templates_dir: Option<PathBuf>,
    /// Directory copied to the site root.
    pub assets_dir: Option<PathBuf>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.root_url`").
        field: String,
        /// Error message (e.g., "${`DOCS_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docgen.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated once the overrides are in place.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(root_url) = &settings.root_url {
            self.site.root_url.clone_from(root_url);
        }
        if let Some(path) = &settings.repository_dir {
            self.repository_resolved.path.clone_from(path);
        }
        if let Some(url) = &settings.repository_url {
            self.repository_resolved.url = Some(url.clone());
        }
        if let Some(docs_dir) = &settings.docs_dir {
            self.repository_resolved.docs_dir.clone_from(docs_dir);
        }
        if let Some(main_branch) = &settings.main_branch {
            self.repository_resolved.main_branch.clone_from(main_branch);
        }
        if let Some(with_working_dir) = settings.with_working_dir {
            self.repository_resolved.with_working_dir = with_working_dir;
        }
        if let Some(output_dir) = &settings.output_dir {
            self.output_dir.clone_from(output_dir);
        }
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfig::default(),
            repository: RepositoryConfigRaw::default(),
            output: OutputConfigRaw::default(),
            server: ServerConfig::default(),
            theme: ThemeConfigRaw::default(),
            repository_resolved: RepositoryConfig {
                path: base.to_path_buf(),
                docs_dir: "docs".to_owned(),
                main_branch: "main".to_owned(),
                url: None,
                with_working_dir: false,
            },
            output_dir: base.join("generated"),
            theme_resolved: ThemeConfig::default(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are properly set and contain valid values.
    /// Called automatically by [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_site()?;
        self.validate_repository()?;
        self.validate_server()?;
        Ok(())
    }

    fn validate_site(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.site.root_url, "site.root_url")?;
        require_http_url(&self.site.root_url, "site.root_url")
    }

    fn validate_repository(&self) -> Result<(), ConfigError> {
        let repository = &self.repository_resolved;
        require_non_empty(&repository.docs_dir, "repository.docs_dir")?;
        require_non_empty(&repository.main_branch, "repository.main_branch")?;
        if let Some(url) = &repository.url {
            require_http_url(url, "repository.url")?;
        }
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.root_url = expand::expand_env(&self.site.root_url, "site.root_url")?;
        if let Some(url) = &self.repository.url {
            self.repository.url = Some(expand::expand_env(url, "repository.url")?);
        }
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let repository = &self.repository;
        self.repository_resolved = RepositoryConfig {
            path: repository
                .path
                .as_deref()
                .map_or_else(|| config_dir.to_path_buf(), |p| config_dir.join(p)),
            docs_dir: repository.docs_dir.clone().unwrap_or_else(|| "docs".to_owned()),
            main_branch: repository
                .main_branch
                .clone()
                .unwrap_or_else(|| "main".to_owned()),
            url: repository.url.clone(),
            with_working_dir: repository.with_working_dir.unwrap_or(false),
        };

        self.output_dir = config_dir.join(self.output.dir.as_deref().unwrap_or("generated"));

        self.theme_resolved = ThemeConfig {
            templates_dir: self.theme.templates_dir.as_deref().map(|d| config_dir.join(d)),
            assets_dir: self.theme.assets_dir.as_deref().map(|d| config_dir.join(d)),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.site.root_url, "http://localhost:8080");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.repository_resolved.path, PathBuf::from("/test"));
        assert_eq!(config.repository_resolved.docs_dir, "docs");
        assert_eq!(config.repository_resolved.main_branch, "main");
        assert!(!config.repository_resolved.with_working_dir);
        assert_eq!(config.output_dir, PathBuf::from("/test/generated"));
        assert!(config.theme_resolved.templates_dir.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.site.root_url, "http://localhost:8080");
    }

    #[test]
    fn test_parse_unknown_field_type() {
        let result: Result<Config, _> = toml::from_str("[server]\nport = \"eighty\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[repository]
path = "repo"
docs_dir = "documentation"
main_branch = "trunk"
url = "https://github.com/owner/project"
with_working_dir = true

[output]
dir = "public"

[theme]
templates_dir = "resources/views"
assets_dir = "assets"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        let repository = &config.repository_resolved;
        assert_eq!(repository.path, PathBuf::from("/project/repo"));
        assert_eq!(repository.docs_dir, "documentation");
        assert_eq!(repository.main_branch, "trunk");
        assert_eq!(repository.url.as_deref(), Some("https://github.com/owner/project"));
        assert!(repository.with_working_dir);
        assert_eq!(config.output_dir, PathBuf::from("/project/public"));
        assert_eq!(
            config.theme_resolved.templates_dir,
            Some(PathBuf::from("/project/resources/views"))
        );
        assert_eq!(config.theme_resolved.assets_dir, Some(PathBuf::from("/project/assets")));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            root_url: Some("https://docs.example.com".to_owned()),
            docs_dir: Some("manual".to_owned()),
            with_working_dir: Some(true),
            port: Some(9000),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.site.root_url, "https://docs.example.com");
        assert_eq!(config.repository_resolved.docs_dir, "manual");
        assert!(config.repository_resolved.with_working_dir);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1"); // Unchanged
        assert_eq!(config.repository_resolved.main_branch, "main"); // Unchanged
    }

    #[test]
    fn test_validate_root_url() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.site.root_url = "example.com".to_owned();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("site.root_url"));
    }

    #[test]
    fn test_validate_empty_docs_dir() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.repository_resolved.docs_dir = String::new();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("repository.docs_dir cannot be empty"));
    }

    #[test]
    fn test_validate_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[site]\nroot_url = \"https://owner.github.io/project\"\n[repository]\ndocs_dir = \"manual\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.site.root_url, "https://owner.github.io/project");
        assert_eq!(config.repository_resolved.docs_dir, "manual");
        assert_eq!(config.repository_resolved.path, temp.path());
        assert_eq!(config.output_dir, temp.path().join("generated"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_cli_settings_are_validated() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();
        let overrides = CliSettings {
            main_branch: Some(String::new()),
            ..Default::default()
        };

        let err = Config::load(Some(&path), Some(&overrides)).unwrap_err();
        assert!(err.to_string().contains("repository.main_branch"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/docgen.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_expands_env_vars() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[site]\nroot_url = \"${DOCGEN_TEST_ROOT_URL}\"\n",
        )
        .unwrap();
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("DOCGEN_TEST_ROOT_URL", "https://docs.example.com");
        }

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.site.root_url, "https://docs.example.com");
        unsafe {
            std::env::remove_var("DOCGEN_TEST_ROOT_URL");
        }
    }
}
