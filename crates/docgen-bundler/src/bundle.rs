//! Compiled bundle and its mappings.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use docgen_vfs::path;
use rayon::prelude::*;
use url::Url;

use crate::context::Context;
use crate::error::{BundleError, LinkError};
use crate::modifier::ModifierChain;
use crate::source::Source;

/// One source file compiled to one destination path.
#[derive(Clone)]
pub struct Mapping {
    source: Arc<dyn Source>,
    source_path: String,
    destination_path: String,
    tag: Option<String>,
    chain: ModifierChain,
    fallback: bool,
}

impl Mapping {
    pub(crate) fn new(
        source: Arc<dyn Source>,
        source_path: String,
        destination_path: String,
        tag: Option<String>,
        chain: ModifierChain,
        fallback: bool,
    ) -> Self {
        Self {
            source,
            source_path,
            destination_path,
            tag,
            chain,
            fallback,
        }
    }

    /// Path relative to the rule's source.
    #[must_use]
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Path inside the bundle.
    #[must_use]
    pub fn destination_path(&self) -> &str {
        &self.destination_path
    }

    /// Tag of the rule that produced the mapping.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Whether the mapping came from a [fallback](crate::Rule::fallback) rule.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("source_path", &self.source_path)
            .field("destination_path", &self.destination_path)
            .field("tag", &self.tag)
            .field("chain", &self.chain)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

/// Join a slash-separated, bundle-relative path onto `root`.
///
/// Empty and `.` segments are skipped and the remaining segments are
/// percent-encoded, so `"."` yields `root` itself.
#[must_use]
pub fn join_url(root: &Url, file: &str) -> Url {
    let segments: Vec<&str> = file
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let mut url = root.clone();
    if segments.is_empty() {
        return url;
    }
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Immutable result of [`Bundler::compile`](crate::Bundler::compile).
pub struct Bundle {
    root_url: Url,
    mappings: Vec<Mapping>,
    by_destination_path: HashMap<String, usize>,
    by_tag_and_source_path: HashMap<String, HashMap<String, usize>>,
}

impl Bundle {
    /// Sort and index mappings.
    pub(crate) fn new(root_url: Url, mut mappings: Vec<Mapping>) -> Result<Self, BundleError> {
        // Fallbacks sort first among equal destinations so the last one wins
        // only if nothing else produces that path.
        mappings.sort_by(|a, b| {
            path::compare(&a.destination_path, &b.destination_path)
                .then_with(|| b.fallback.cmp(&a.fallback))
        });

        let mut by_destination_path = HashMap::with_capacity(mappings.len());
        let mut by_tag_and_source_path: HashMap<String, HashMap<String, usize>> = HashMap::new();

        for (i, mapping) in mappings.iter().enumerate() {
            let shadowed = by_destination_path.insert(mapping.destination_path.clone(), i);
            if let Some(prev) = shadowed
                && mappings[prev].fallback
                && !mapping.fallback
            {
                tracing::debug!(
                    path = %mapping.destination_path,
                    source = %mapping.source_path,
                    "Published file replaces generated fallback"
                );
            } else if shadowed.is_some() {
                tracing::warn!(
                    path = %mapping.destination_path,
                    source = %mapping.source_path,
                    "Destination path produced more than once, keeping the last one"
                );
            }

            let Some(tag) = &mapping.tag else {
                continue;
            };
            match by_tag_and_source_path
                .entry(tag.clone())
                .or_default()
                .entry(mapping.source_path.clone())
            {
                Entry::Occupied(_) => {
                    return Err(BundleError::DuplicateSource {
                        tag: tag.clone(),
                        path: mapping.source_path.clone(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
            }
        }

        Ok(Self {
            root_url,
            mappings,
            by_destination_path,
            by_tag_and_source_path,
        })
    }

    /// Root URL destination paths are published under (always ends with `/`).
    #[must_use]
    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    /// All mappings sorted by destination path.
    #[must_use]
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Sorted, de-duplicated destination paths.
    #[must_use]
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self
            .mappings
            .iter()
            .map(|m| m.destination_path.as_str())
            .collect();
        files.dedup();
        files
    }

    /// Mapping publishing `destination_path`, after normalization.
    #[must_use]
    pub fn mapping(&self, destination_path: &str) -> Option<&Mapping> {
        let normalized = path::clean(destination_path.trim_start_matches('/'));
        self.by_destination_path
            .get(&normalized)
            .and_then(|&i| self.mappings.get(i))
    }

    /// Tagged mapping for `source_path`, after normalization.
    #[must_use]
    pub fn tagged(&self, tag: &str, source_path: &str) -> Option<&Mapping> {
        let normalized = path::clean(source_path.trim_start_matches('/'));
        self.by_tag_and_source_path
            .get(tag)?
            .get(&normalized)
            .and_then(|&i| self.mappings.get(i))
    }

    /// Join a bundle-relative path onto the root URL.
    #[must_use]
    pub fn to_absolute_url(&self, file: &str) -> Url {
        join_url(&self.root_url, file)
    }

    /// Absolute URL of the file tagged `tag` with the given source path.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotFound`] if no such tagged file exists.
    pub fn tagged_file_url(&self, tag: &str, source_path: &str) -> Result<Url, LinkError> {
        self.tagged(tag, source_path)
            .map(|m| self.to_absolute_url(&m.destination_path))
            .ok_or_else(|| LinkError::NotFound {
                tag: tag.to_owned(),
                path: path::clean(source_path.trim_start_matches('/')),
            })
    }

    /// Render one destination path into `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::NotFound`] for unknown paths, or the source or
    /// render error of the mapping.
    pub fn write_file_to(
        &self,
        destination_path: &str,
        writer: &mut dyn Write,
    ) -> Result<(), BundleError> {
        let mapping = self
            .mapping(destination_path)
            .ok_or_else(|| BundleError::NotFound(destination_path.to_owned()))?;
        self.render(mapping, writer)
    }

    /// Render every destination path below `dir`.
    ///
    /// Files are rendered in parallel; the first failure aborts the export.
    ///
    /// # Errors
    ///
    /// Returns the first source, render or output error.
    pub fn store_in_dir(&self, dir: &Path) -> Result<(), BundleError> {
        let files = self.files();
        files.par_iter().try_for_each(|file| {
            let Some(mapping) = self.mapping(file) else {
                return Ok(());
            };
            self.store_file(mapping, dir)
        })?;

        tracing::info!(files = files.len(), dir = %dir.display(), "Stored bundle");
        Ok(())
    }

    fn store_file(&self, mapping: &Mapping, dir: &Path) -> Result<(), BundleError> {
        let relative = &mapping.destination_path;
        let out_path = dir.join(relative);
        let output_error = |source: io::Error| BundleError::Output {
            path: out_path.clone(),
            source,
        };

        if relative == ".." || relative.starts_with("../") {
            return Err(output_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "destination path escapes the output directory",
            )));
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(output_error)?;
        }

        let file = File::create(&out_path).map_err(output_error)?;
        let mut writer = BufWriter::new(file);
        self.render(mapping, &mut writer)?;
        writer.flush().map_err(output_error)
    }

    fn render(&self, mapping: &Mapping, writer: &mut dyn Write) -> Result<(), BundleError> {
        tracing::debug!(
            path = %mapping.destination_path,
            source = %mapping.source_path,
            "Rendering file"
        );
        let input = mapping.source.open(&mapping.source_path)?;
        let ctx = Context::new(self, mapping);
        mapping
            .chain
            .modify_content(input, writer, &ctx)
            .map_err(|source| BundleError::Render {
                path: mapping.destination_path.clone(),
                source,
            })
    }
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundle")
            .field("root_url", &self.root_url.as_str())
            .field("mappings", &self.mappings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::source::EmptySource;

    fn bundle(mappings: &[(&str, &str, Option<&str>)]) -> Bundle {
        let source: Arc<dyn Source> = Arc::new(EmptySource::new("unused"));
        let mappings = mappings
            .iter()
            .map(|(src, dst, tag)| {
                Mapping::new(
                    Arc::clone(&source),
                    (*src).to_owned(),
                    (*dst).to_owned(),
                    tag.map(str::to_owned),
                    ModifierChain::new(),
                    false,
                )
            })
            .collect();
        Bundle::new(Url::parse("https://example.com/docs/").unwrap(), mappings).unwrap()
    }

    /// Run `f` with a context for a tagged mapping of a small bundle.
    pub(crate) fn with_context<T>(f: impl FnOnce(&Context<'_>) -> T) -> T {
        let bundle = bundle(&[("intro.md", "v1/intro.html", Some("v1"))]);
        let ctx = Context::new(&bundle, &bundle.mappings()[0]);
        f(&ctx)
    }

    #[test]
    fn test_mappings_are_sorted_by_destination() {
        let bundle = bundle(&[
            ("b.md", "v1/b.html", None),
            ("a-b.md", "v1-old/a.html", None),
            ("a.md", "v1/a.html", None),
        ]);

        assert_eq!(bundle.files(), vec!["v1/a.html", "v1/b.html", "v1-old/a.html"]);
    }

    #[test]
    fn test_files_are_deduplicated() {
        let bundle = bundle(&[
            ("a.md", "index.html", None),
            ("b.md", "index.html", None),
        ]);

        assert_eq!(bundle.files(), vec!["index.html"]);
        assert_eq!(bundle.mapping("index.html").unwrap().source_path(), "b.md");
    }

    #[test]
    fn test_to_absolute_url() {
        let bundle = bundle(&[]);

        assert_eq!(
            bundle.to_absolute_url("v1/intro.html").as_str(),
            "https://example.com/docs/v1/intro.html"
        );
        assert_eq!(
            bundle.to_absolute_url("/css//site.css").as_str(),
            "https://example.com/docs/css/site.css"
        );
        assert_eq!(
            bundle.to_absolute_url("v1/01. Images/a b.png").as_str(),
            "https://example.com/docs/v1/01.%20Images/a%20b.png"
        );
        assert_eq!(bundle.to_absolute_url(".").as_str(), "https://example.com/docs/");
    }

    #[test]
    fn test_tagged_file_url() {
        let bundle = bundle(&[
            ("guide/setup.md", "v1/guide/setup.html", Some("v1")),
            ("guide/setup.md", "v2/guide/setup.html", Some("v2")),
        ]);

        assert_eq!(
            bundle.tagged_file_url("v1", "/guide/./setup.md").unwrap().as_str(),
            "https://example.com/docs/v1/guide/setup.html"
        );
        assert_eq!(
            bundle.tagged_file_url("v2", "guide/setup.md").unwrap().as_str(),
            "https://example.com/docs/v2/guide/setup.html"
        );

        let err = bundle.tagged_file_url("v3", "guide/setup.md").unwrap_err();
        assert!(matches!(err, LinkError::NotFound { .. }));
    }

    #[test]
    fn test_store_in_dir() {
        let temp = tempfile::tempdir().unwrap();
        let bundle = bundle(&[
            ("unused", "v1/guide/setup.html", None),
            ("unused", "index.html", None),
        ]);

        bundle.store_in_dir(temp.path()).unwrap();

        assert!(temp.path().join("v1/guide/setup.html").is_file());
        assert!(temp.path().join("index.html").is_file());
    }

    #[test]
    fn test_store_in_dir_stops_on_error() {
        let temp = tempfile::tempdir().unwrap();
        let bundle = bundle(&[("missing.md", "missing.html", None)]);

        let err = bundle.store_in_dir(temp.path()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_bundle_is_send_sync() {
        static_assertions::assert_impl_all!(Bundle: Send, Sync);
    }
}
