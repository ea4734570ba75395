//! Page templates and built-in assets.

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::Path;

use docgen_bundler::{DEFAULT_REDIRECT_TEMPLATE, Redirector, Source};
use docgen_vfs::{VfsError, path};
use minijinja::Environment;

use crate::error::SiteError;

/// Template name of the page layout.
pub const LAYOUT_TEMPLATE: &str = "layout.html";

/// Template name of redirect pages.
pub const REDIRECT_TEMPLATE: &str = "redirect.html";

/// Built-in page layout.
pub const DEFAULT_LAYOUT_TEMPLATE: &str = include_str!("../templates/layout.html");

/// Built-in stylesheet, published as `css/docgen.css`.
pub const DEFAULT_STYLESHEET: &str = include_str!("../assets/docgen.css");

/// Templates used to render pages and redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    layout: String,
    redirect: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            layout: DEFAULT_LAYOUT_TEMPLATE.to_owned(),
            redirect: DEFAULT_REDIRECT_TEMPLATE.to_owned(),
        }
    }
}

impl Theme {
    /// Load `layout.html` and `redirect.html` from `dir`, falling back to the
    /// built-in template for each file that does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::TemplateIo`] if a template cannot be read and
    /// [`SiteError::Template`] if it does not parse.
    pub fn load(dir: &Path) -> Result<Self, SiteError> {
        let mut theme = Self::default();
        if let Some(layout) = read_template(dir, LAYOUT_TEMPLATE)? {
            theme.layout = layout;
        }
        if let Some(redirect) = read_template(dir, REDIRECT_TEMPLATE)? {
            theme.redirect = redirect;
        }
        theme.validate()?;
        tracing::debug!(dir = %dir.display(), "Loaded theme");
        Ok(theme)
    }

    /// Page layout source.
    #[must_use]
    pub fn layout(&self) -> &str {
        &self.layout
    }

    /// Redirect page source.
    #[must_use]
    pub fn redirect(&self) -> &str {
        &self.redirect
    }

    /// Redirector rendering this theme's redirect template.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Template`] if the template does not parse.
    pub fn redirector(&self) -> Result<Redirector, SiteError> {
        Redirector::new(self.redirect.as_str()).map_err(|source| SiteError::Template {
            name: REDIRECT_TEMPLATE.to_owned(),
            source,
        })
    }

    fn validate(&self) -> Result<(), SiteError> {
        let env = Environment::new();
        for (name, template) in [
            (LAYOUT_TEMPLATE, self.layout.as_str()),
            (REDIRECT_TEMPLATE, self.redirect.as_str()),
        ] {
            env.template_from_named_str(name, template)
                .map_err(|source| SiteError::Template {
                    name: name.to_owned(),
                    source,
                })?;
        }
        Ok(())
    }
}

fn read_template(dir: &Path, name: &str) -> Result<Option<String>, SiteError> {
    let path = dir.join(name);
    match fs::read_to_string(&path) {
        Ok(source) => Ok(Some(source)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SiteError::TemplateIo { path, source }),
    }
}

/// Assets compiled into the binary, stored at the bundle root.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinAssets;

const BUILTIN_ASSETS: &[(&str, &str)] = &[("css/docgen.css", DEFAULT_STYLESHEET)];

impl Source for BuiltinAssets {
    fn files(&self) -> Result<Vec<String>, VfsError> {
        Ok(BUILTIN_ASSETS.iter().map(|(name, _)| (*name).to_owned()).collect())
    }

    fn open(&self, rel: &str) -> Result<Box<dyn Read + Send>, VfsError> {
        let rel = path::normalize(rel)?;
        BUILTIN_ASSETS
            .iter()
            .find(|(name, _)| *name == rel)
            .map(|(_, content)| Box::new(Cursor::new(content.as_bytes())) as Box<dyn Read + Send>)
            .ok_or_else(|| VfsError::not_found(rel).with_backend("Builtin"))
    }
}
