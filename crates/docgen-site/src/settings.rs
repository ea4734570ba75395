//! Per-version settings read from `docgen.yml` in the docs directory.

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

use docgen_vfs::{SnapshotIndex, VfsError, path};
use serde::Deserialize;

use crate::error::SiteError;

/// File name of the settings file, relative to the docs directory.
pub const SETTINGS_FILE: &str = "docgen.yml";

/// Settings of one documentation version.
///
/// ```yaml
/// redirects:
///   old-guide: "01. Tutorial/01. Intro.md"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory (relative to the version root) → source path of the target page.
    pub redirects: BTreeMap<String, String>,
}

impl Settings {
    /// Parse settings from YAML. An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns the YAML error for malformed documents or unknown keys.
    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Read the settings of the docs directory `docs_dir` of a snapshot.
    ///
    /// A missing settings file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Settings`] if the file is malformed, or
    /// [`SiteError::Vfs`] if it cannot be read.
    pub fn load(index: &Arc<SnapshotIndex>, docs_dir: &str) -> Result<Self, SiteError> {
        let settings_path = path::join(docs_dir, SETTINGS_FILE);
        let mut file = match index.open(&settings_path) {
            Ok(file) => file,
            Err(err) if err.is_not_found() => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };

        let mut yaml = String::new();
        file.read_to_string(&mut yaml)
            .map_err(|err| VfsError::io(err, Some(settings_path.clone())))?;
        Self::parse(&yaml).map_err(|source| SiteError::Settings {
            path: settings_path,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use docgen_vfs::MemoryTree;
    use pretty_assertions::assert_eq;

    use super::*;

    fn index(files: &[(&str, &str)]) -> Arc<SnapshotIndex> {
        let tree = files
            .iter()
            .fold(MemoryTree::new(), |tree, (path, content)| {
                tree.with_file(*path, *content)
            });
        Arc::new(SnapshotIndex::build(Arc::new(tree)).unwrap())
    }

    #[test]
    fn test_parse_redirects() {
        let settings = Settings::parse("redirects:\n  old-guide: \"01. Tutorial/01. Intro.md\"\n").unwrap();

        assert_eq!(
            settings.redirects.get("old-guide").map(String::as_str),
            Some("01. Tutorial/01. Intro.md")
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Settings::parse("").unwrap(), Settings::default());
        assert_eq!(Settings::parse("redirects: {}\n").unwrap(), Settings::default());
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        assert!(Settings::parse("redirect:\n  a: b\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let index = index(&[("docs/intro.md", "")]);

        assert_eq!(Settings::load(&index, "docs").unwrap(), Settings::default());
    }

    #[test]
    fn test_load_malformed_file() {
        let index = index(&[("docs/docgen.yml", "redirects: [")]);

        let err = Settings::load(&index, "docs").unwrap_err();
        assert!(matches!(err, SiteError::Settings { ref path, .. } if path == "docs/docgen.yml"));
    }
}
