//! Per-mapping rendering context.

use docgen_vfs::path;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::bundle::{Bundle, Mapping};
use crate::error::LinkError;

/// Handle passed to content stages while one mapping is rendered.
///
/// Gives read-only access to the compiled bundle so stages can build URLs
/// and resolve links to other files.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    bundle: &'a Bundle,
    mapping: &'a Mapping,
}

impl<'a> Context<'a> {
    pub(crate) fn new(bundle: &'a Bundle, mapping: &'a Mapping) -> Self {
        Self { bundle, mapping }
    }

    /// Bundle being rendered.
    #[must_use]
    pub fn bundle(&self) -> &'a Bundle {
        self.bundle
    }

    /// Mapping being rendered.
    #[must_use]
    pub fn mapping(&self) -> &'a Mapping {
        self.mapping
    }

    /// Source path of the file being rendered.
    #[must_use]
    pub fn source_path(&self) -> &'a str {
        self.mapping.source_path()
    }

    /// Destination path of the file being rendered.
    #[must_use]
    pub fn destination_path(&self) -> &'a str {
        self.mapping.destination_path()
    }

    /// `i`-th segment of the destination path, empty when out of range.
    #[must_use]
    pub fn uri_segment(&self, i: usize) -> &'a str {
        self.mapping
            .destination_path()
            .split('/')
            .nth(i)
            .unwrap_or_default()
    }

    /// Join a bundle-relative path onto the root URL.
    #[must_use]
    pub fn to_absolute_url(&self, file: &str) -> Url {
        self.bundle.to_absolute_url(file)
    }

    /// Absolute URL of the file tagged `tag` with the given source path.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotFound`] if no such tagged file exists.
    pub fn tagged_file_url(&self, tag: &str, source_path: &str) -> Result<Url, LinkError> {
        self.bundle.tagged_file_url(tag, source_path)
    }

    /// Rewrite a link found in the current file to the published URL of its target.
    ///
    /// - scheme-qualified (`https://..`, `mailto:..`) and network-path (`//host/..`)
    ///   links are returned unchanged
    /// - links without a path (`#section`, `?q=1`) are returned unchanged
    /// - `/x` is resolved from the root of the current file's tag
    /// - anything else is resolved against the current file's directory
    ///
    /// Query and fragment of the original link are kept.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if the link cannot be parsed, the current file is
    /// untagged, or no tagged file matches.
    pub fn rewrite_content_url(&self, link: &str) -> Result<String, LinkError> {
        if link.starts_with("//") {
            return Ok(link.to_owned());
        }
        match Url::parse(link) {
            Ok(_) => return Ok(link.to_owned()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {}
            Err(source) => {
                return Err(LinkError::Parse {
                    link: link.to_owned(),
                    source,
                });
            }
        }

        let (rest, fragment) = match link.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (link, None),
        };
        let (link_path, query) = match rest.split_once('?') {
            Some((link_path, query)) => (link_path, Some(query)),
            None => (rest, None),
        };
        if link_path.is_empty() {
            return Ok(link.to_owned());
        }

        let Some(tag) = self.mapping.tag() else {
            return Err(LinkError::Untagged {
                link: link.to_owned(),
                source_path: self.mapping.source_path().to_owned(),
            });
        };

        let decoded = percent_decode_str(link_path).decode_utf8_lossy();
        let target = if decoded.starts_with('/') {
            decoded.into_owned()
        } else {
            path::join(path::parent(self.mapping.source_path()), &decoded)
        };

        let mut url = self.bundle.tagged_file_url(tag, &target)?;
        url.set_query(query);
        url.set_fragment(fragment);
        Ok(url.into())
    }
}
