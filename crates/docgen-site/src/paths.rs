//! Published names of documentation files.
//!
//! Source trees order pages and sections with number prefixes
//! (`01. Getting started/02. Install.md`). Published paths drop the prefix
//! and use slugs (`getting-started/install.html`); titles drop the prefix.

use std::sync::LazyLock;

use docgen_bundler::PathModifier;
use docgen_vfs::path;
use regex::Regex;

static NUMBER_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+\.\s*").unwrap());

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// Strip an ordering prefix such as `"01. "`.
#[must_use]
pub fn strip_number_prefix(name: &str) -> &str {
    match NUMBER_PREFIX.find(name) {
        Some(prefix) => &name[prefix.end()..],
        None => name,
    }
}

/// Lowercase `text` and join its words with dashes.
///
/// Returns `text` unchanged if it contains no letters or digits.
#[must_use]
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let slug = NON_WORD.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        text.to_owned()
    } else {
        slug.to_owned()
    }
}

/// Title of a page: its file stem without ordering prefix.
#[must_use]
pub fn page_title(source_path: &str) -> String {
    let name = path::file_name(source_path);
    let stem = match path::extension(name) {
        Some(ext) => &name[..name.len() - ext.len() - 1],
        None => name,
    };
    strip_number_prefix(stem).to_owned()
}

/// Published name of a top-level section directory.
#[must_use]
pub fn section_dir(name: &str) -> String {
    slugify(strip_number_prefix(name))
}

/// Path stage publishing Markdown pages and section directories under slugs.
///
/// Only the first directory (the section) and the file name of `.md` pages
/// are renamed; nested directories and other files keep their names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionPathRewriter;

impl PathModifier for SectionPathRewriter {
    fn modify_path(&self, source: &str) -> String {
        let mut parts: Vec<String> = source.split('/').map(str::to_owned).collect();

        if let Some(last) = parts.last_mut()
            && path::extension(last) == Some("md")
        {
            let stem = &last[..last.len() - 3];
            *last = format!("{}.md", slugify(strip_number_prefix(stem)));
        }
        if parts.len() > 1
            && let Some(first) = parts.first_mut()
        {
            *first = section_dir(first);
        }

        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_strip_number_prefix() {
        assert_eq!(strip_number_prefix("01. Intro"), "Intro");
        assert_eq!(strip_number_prefix("1.Intro"), "Intro");
        assert_eq!(strip_number_prefix("123.   Intro"), "Intro");
        assert_eq!(strip_number_prefix("Intro"), "Intro");
        assert_eq!(strip_number_prefix("2024 review"), "2024 review");
        assert_eq!(strip_number_prefix("v1. Intro"), "v1. Intro");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("  What's new?  "), "what-s-new");
        assert_eq!(slugify("API_reference v2.1"), "api-reference-v2-1");
        assert_eq!(slugify("Über uns"), "über-uns");
        assert_eq!(slugify("!!!"), "!!!");
    }

    #[test]
    fn test_page_title() {
        assert_eq!(page_title("01. Tutorial/02. Hello World.md"), "Hello World");
        assert_eq!(page_title("README.md"), "README");
        assert_eq!(page_title("LICENSE"), "LICENSE");
    }

    #[test]
    fn test_section_path_rewriter() {
        let rewriter = SectionPathRewriter;

        assert_eq!(
            rewriter.modify_path("01. Tutorial/01. Foo.md"),
            "tutorial/foo.md"
        );
        assert_eq!(
            rewriter.modify_path("01. Tutorial/01. Images/01. foo.png"),
            "tutorial/01. Images/01. foo.png"
        );
        assert_eq!(
            rewriter.modify_path("01. Tutorial/02. Advanced/03. Deep Dive.md"),
            "tutorial/02. Advanced/deep-dive.md"
        );
        assert_eq!(rewriter.modify_path("01. Overview.md"), "overview.md");
        assert_eq!(rewriter.modify_path("logo.png"), "logo.png");
    }

    #[test]
    fn test_section_dir() {
        assert_eq!(section_dir("02. Going Further"), "going-further");
    }
}
