//! Client-side redirect pages built from ordinary bundle rules.

use std::io::{Read, Write};
use std::sync::Arc;

use minijinja::{Environment, context};

use crate::bundler::{Bundler, Rule};
use crate::context::Context;
use crate::error::ModifyError;
use crate::modifier::{ContentModifier, ModifierChain, Stage};
use crate::source::EmptySource;

/// Built-in redirect page. The target is available as `redirect_url`.
pub const DEFAULT_REDIRECT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Redirecting</title>
<meta http-equiv="refresh" content="0; url={{ redirect_url }}">
</head>
<body>
<p>This page has moved.</p>
</body>
</html>
"#;

/// Adds `index.html` redirect pages pointing at tagged files.
#[derive(Debug, Clone)]
pub struct Redirector {
    template: Arc<str>,
}

impl Default for Redirector {
    fn default() -> Self {
        Self {
            template: Arc::from(DEFAULT_REDIRECT_TEMPLATE),
        }
    }
}

impl Redirector {
    /// Use a custom template; the target URL is passed as `redirect_url`.
    ///
    /// # Errors
    ///
    /// Returns the template syntax error if `template` does not parse.
    pub fn new(template: impl Into<String>) -> Result<Self, minijinja::Error> {
        let template = template.into();
        Environment::new().template_from_str(&template)?;
        Ok(Self {
            template: Arc::from(template),
        })
    }

    /// Add a rule producing `{from_dir}/index.html` that redirects to the
    /// file tagged `tag` with source path `to`.
    ///
    /// The target is resolved when the page is rendered, so a missing
    /// target fails that render. The rule is a [fallback](Rule::fallback):
    /// a file published at the same path takes precedence.
    pub fn redirect_to_tagged_file(&self, bundler: &mut Bundler, from_dir: &str, tag: &str, to: &str) {
        let page = RedirectPage {
            template: Arc::clone(&self.template),
            tag: tag.to_owned(),
            target: to.to_owned(),
        };
        bundler.add_rule(
            Rule::new(EmptySource::new("index.html"))
                .chain(ModifierChain::new().with(Stage::content(page)))
                .store_in(from_dir)
                .fallback(),
        );
    }
}

/// Content stage rendering one redirect page.
struct RedirectPage {
    template: Arc<str>,
    tag: String,
    target: String,
}

impl ContentModifier for RedirectPage {
    fn modify_content(
        &self,
        _input: &mut dyn Read,
        output: &mut dyn Write,
        ctx: &Context<'_>,
    ) -> Result<(), ModifyError> {
        let url = ctx.tagged_file_url(&self.tag, &self.target)?;
        let html = Environment::new()
            .render_str(&self.template, context! { redirect_url => url.as_str() })
            .map_err(ModifyError::other)?;
        output.write_all(html.as_bytes())?;
        Ok(())
    }
}
