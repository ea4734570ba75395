//! Bundle rules of a versioned documentation site.

use std::path::PathBuf;
use std::sync::Arc;

use docgen_bundler::{Bundler, DirSource, ModifierChain, Rule, SnapshotSource, Source, Stage, join_url};
use docgen_vcs::{Revision, Version, default_version};
use docgen_vfs::path;
use url::Url;

use crate::error::SiteError;
use crate::layout::Layout;
use crate::markdown::Markdown;
use crate::menu::{MenuSection, build_menu};
use crate::paths::{SectionPathRewriter, section_dir};
use crate::settings::{SETTINGS_FILE, Settings};
use crate::theme::{BuiltinAssets, Theme};

/// Inputs of [`build_site`] besides the versions.
#[derive(Debug, Clone)]
pub struct SiteOptions {
    /// Documentation directory relative to the repository root.
    pub docs_dir: String,
    /// Branch "edit" links of the working tree point at.
    pub main_branch: String,
    /// Repository web URL, e.g. `https://github.com/owner/project`.
    pub repository_url: Option<String>,
    /// Directory copied to the bundle root.
    pub assets_dir: Option<PathBuf>,
    pub theme: Arc<Theme>,
}

/// Create the bundler of a site publishing `versions`.
///
/// Every version is stored and tagged under its name: Markdown pages are
/// rendered into the theme layout, other files are copied. The site root,
/// each version root and each section redirect to their first page unless
/// an `index.md` is published there.
///
/// # Errors
///
/// Returns [`SiteError`] if a menu or settings file cannot be read, the
/// redirect template is invalid or the repository URL is malformed.
pub fn build_site(versions: &[Version], options: &SiteOptions) -> Result<Bundler, SiteError> {
    let mut bundler = Bundler::new();
    let redirector = options.theme.redirector()?;

    bundler.add_rule(Rule::new(BuiltinAssets));
    if let Some(dir) = &options.assets_dir {
        bundler.add_rule(Rule::new(DirSource::new(dir.clone())));
    }

    let names: Arc<[String]> = versions.iter().map(|v| v.name.clone()).collect();
    let default = default_version(versions).map(|v| v.name.as_str());

    for version in versions {
        let menu: Arc<[MenuSection]> = build_menu(&version.index, &options.docs_dir)?.into();
        let layout = Layout::new(
            Arc::clone(&options.theme),
            Arc::clone(&names),
            Arc::clone(&menu),
            source_root(version, options)?,
        );
        let source: Arc<dyn Source> =
            Arc::new(SnapshotSource::new(Arc::clone(&version.index), options.docs_dir.as_str()));

        bundler.add_rule(
            Rule::from_shared(Arc::clone(&source))
                .filter(is_page)
                .chain(
                    ModifierChain::new()
                        .with(Stage::path(SectionPathRewriter))
                        .with(Stage::both(Markdown))
                        .with(Stage::content(layout)),
                )
                .store_in(version.name.as_str())
                .tag(version.name.as_str()),
        );
        bundler.add_rule(
            Rule::from_shared(source)
                .filter(|p| !is_page(p) && p != SETTINGS_FILE)
                .chain(ModifierChain::new().with(Stage::path(SectionPathRewriter)))
                .store_in(version.name.as_str())
                .tag(version.name.as_str()),
        );

        let first_page = menu.first().and_then(|s| s.items.first());
        match first_page {
            Some(page) => {
                if default == Some(version.name.as_str()) {
                    redirector.redirect_to_tagged_file(&mut bundler, ".", &version.name, &page.path);
                }
                redirector.redirect_to_tagged_file(&mut bundler, &version.name, &version.name, &page.path);
            }
            None => tracing::warn!(version = %version.name, "Version has no pages, skipping redirects"),
        }
        for section in menu.iter() {
            if let Some(page) = section.items.first() {
                let from = path::join(&version.name, &section_dir(&section.path));
                redirector.redirect_to_tagged_file(&mut bundler, &from, &version.name, &page.path);
            }
        }

        let settings = Settings::load(&version.index, &options.docs_dir)?;
        for (from, to) in &settings.redirects {
            let from = path::join(&version.name, &path::normalize(from)?);
            redirector.redirect_to_tagged_file(&mut bundler, &from, &version.name, to);
        }

        tracing::debug!(
            version = %version.name,
            sections = menu.len(),
            redirects = settings.redirects.len(),
            "Added version rules"
        );
    }

    tracing::info!(versions = versions.len(), rules = bundler.rules().len(), "Built site rules");
    Ok(bundler)
}

fn is_page(source_path: &str) -> bool {
    path::extension(source_path) == Some("md")
}

/// URL of the docs directory of `version` in the repository browser.
fn source_root(version: &Version, options: &SiteOptions) -> Result<Option<Url>, SiteError> {
    let Some(repository_url) = &options.repository_url else {
        return Ok(None);
    };
    let repository = Url::parse(repository_url).map_err(|source| SiteError::RepositoryUrl {
        url: repository_url.clone(),
        source,
    })?;
    let rev = match &version.revision {
        Revision::Tag(name) | Revision::Branch(name) => name.as_str(),
        Revision::WorkingTree => options.main_branch.as_str(),
    };
    Ok(Some(join_url(
        &repository,
        &format!("tree/{rev}/{}", options.docs_dir),
    )))
}
