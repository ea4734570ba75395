//! Bundle rules and their compilation.

use std::fmt;
use std::sync::Arc;

use docgen_vfs::path;
use url::Url;

use crate::bundle::{Bundle, Mapping};
use crate::error::BundleError;
use crate::modifier::ModifierChain;
use crate::source::Source;

/// Predicate over source-relative paths; a file is taken only if every filter accepts it.
pub type Filter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Takes the files of one source into the bundle.
#[derive(Clone)]
pub struct Rule {
    source: Arc<dyn Source>,
    filters: Vec<Filter>,
    chain: ModifierChain,
    destination_dir: String,
    tag: Option<String>,
    fallback: bool,
}

impl Rule {
    /// Take every file of `source`, unmodified, into the bundle root.
    pub fn new(source: impl Source + 'static) -> Self {
        Self::from_shared(Arc::new(source))
    }

    /// Same as [`Rule::new`] for an already shared source.
    pub fn from_shared(source: Arc<dyn Source>) -> Self {
        Self {
            source,
            filters: Vec::new(),
            chain: ModifierChain::new(),
            destination_dir: ".".to_owned(),
            tag: None,
            fallback: false,
        }
    }

    /// Only take files accepted by `filter`.
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Rename and transform files with `chain`.
    #[must_use]
    pub fn chain(mut self, chain: ModifierChain) -> Self {
        self.chain = chain;
        self
    }

    /// Store files below `dir` of the bundle.
    #[must_use]
    pub fn store_in(mut self, dir: impl Into<String>) -> Self {
        self.destination_dir = dir.into();
        self
    }

    /// Tag files so links can be resolved by source path within the tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Give up destination paths that a non-fallback rule also produces.
    ///
    /// Generated pages such as redirects use this so they never replace a
    /// file that is published at the same path.
    #[must_use]
    pub fn fallback(mut self) -> Self {
        self.fallback = true;
        self
    }

    fn accepts(&self, source_path: &str) -> bool {
        self.filters.iter().all(|filter| filter(source_path))
    }

    fn mappings(&self) -> Result<Vec<Mapping>, BundleError> {
        let files = self.source.files()?;
        let mut mappings = Vec::with_capacity(files.len());
        for source_path in files {
            if !self.accepts(&source_path) {
                continue;
            }
            let destination_path =
                path::join(&self.destination_dir, &self.chain.modify_path(&source_path));
            mappings.push(Mapping::new(
                Arc::clone(&self.source),
                source_path,
                destination_path,
                self.tag.clone(),
                self.chain.clone(),
                self.fallback,
            ));
        }
        Ok(mappings)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("filters", &self.filters.len())
            .field("chain", &self.chain)
            .field("destination_dir", &self.destination_dir)
            .field("tag", &self.tag)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

/// Collects rules and compiles them into a [`Bundle`].
#[derive(Debug, Clone, Default)]
pub struct Bundler {
    rules: Vec<Rule>,
}

impl Bundler {
    /// Create a bundler without rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. Nothing is validated until [`Bundler::compile`].
    pub fn add_rule(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Registered rules.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run every rule and build an immutable bundle.
    ///
    /// Files whose destination paths collide are resolved in favour of the
    /// last one in sort order (the later rule for identical paths). Files of
    /// [fallback](Rule::fallback) rules lose to any other file.
    ///
    /// # Errors
    ///
    /// Fails if `root_url` is malformed, a source cannot be listed, or two
    /// tagged files share the same tag and source path.
    pub fn compile(&self, root_url: &str) -> Result<Bundle, BundleError> {
        let root_url = parse_root_url(root_url)?;

        let mut mappings = Vec::new();
        for rule in &self.rules {
            mappings.extend(rule.mappings()?);
        }

        let bundle = Bundle::new(root_url, mappings)?;
        tracing::info!(
            rules = self.rules.len(),
            files = bundle.mappings().len(),
            "Compiled bundle"
        );
        Ok(bundle)
    }
}

/// Parse the root URL all destination paths are joined onto.
fn parse_root_url(raw: &str) -> Result<Url, BundleError> {
    let invalid = |reason: String| BundleError::InvalidRootUrl {
        url: raw.to_owned(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot have paths joined onto it".to_owned()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
