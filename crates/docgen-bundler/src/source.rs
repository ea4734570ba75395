//! File sources feeding bundle rules.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docgen_vfs::{SnapshotIndex, VfsError, VfsErrorKind, path};

/// Set of files a rule takes its input from.
///
/// Paths are slash-separated and relative to the source root.
pub trait Source: Send + Sync {
    /// List every file of the source.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError`] if the source cannot be listed.
    fn files(&self) -> Result<Vec<String>, VfsError>;

    /// Open one file for reading.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError`] if the path is invalid, missing or unreadable.
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, VfsError>;
}

/// Files below a directory of a snapshot, optionally matched by a glob.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    index: Arc<SnapshotIndex>,
    dir: String,
    pattern: Option<glob::Pattern>,
}

impl SnapshotSource {
    /// Take every file below `dir` (`"."` for the snapshot root).
    pub fn new(index: Arc<SnapshotIndex>, dir: impl Into<String>) -> Self {
        Self {
            index,
            dir: dir.into(),
            pattern: None,
        }
    }

    /// Only take files whose dir-relative path matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if the glob pattern is malformed.
    pub fn with_glob(mut self, pattern: &str) -> Result<Self, glob::PatternError> {
        self.pattern = Some(glob::Pattern::new(pattern)?);
        Ok(self)
    }

    /// Index the files are taken from.
    #[must_use]
    pub fn index(&self) -> &Arc<SnapshotIndex> {
        &self.index
    }

    fn matches(&self, rel: &str) -> bool {
        let options = glob::MatchOptions {
            require_literal_separator: true,
            ..glob::MatchOptions::default()
        };
        self.pattern
            .as_ref()
            .is_none_or(|pattern| pattern.matches_with(rel, options))
    }
}

impl Source for SnapshotSource {
    fn files(&self) -> Result<Vec<String>, VfsError> {
        let root = path::normalize(&self.dir)?;
        let mut files = Vec::new();
        let mut pending = vec![root.clone()];

        while let Some(dir) = pending.pop() {
            let name = if dir.is_empty() { "." } else { dir.as_str() };
            let mut handle = self.index.open(name)?;
            for entry in handle.read_dir(None)? {
                if entry.is_dir {
                    pending.push(entry.path);
                    continue;
                }
                let rel = if root.is_empty() {
                    entry.path
                } else {
                    entry.path[root.len() + 1..].to_owned()
                };
                if self.matches(&rel) {
                    files.push(rel);
                }
            }
        }

        files.sort_by(|a, b| path::compare(a, b));
        Ok(files)
    }

    fn open(&self, rel: &str) -> Result<Box<dyn Read + Send>, VfsError> {
        let rel = path::normalize(rel)?;
        let file = self.index.open(&path::join(&self.dir, &rel))?;
        if file.is_dir() {
            return Err(VfsError::new(VfsErrorKind::IsADirectory).with_path(rel));
        }
        Ok(Box::new(file))
    }
}

/// Files of an on-disk directory.
///
/// Hidden files and files excluded by `.gitignore` are skipped.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Take every file below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the files are taken from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Source for DirSource {
    fn files(&self) -> Result<Vec<String>, VfsError> {
        if !self.root.is_dir() {
            return Err(VfsError::not_found(self.root.display().to_string()).with_backend("Dir"));
        }

        let mut files = Vec::new();
        for entry in ignore::WalkBuilder::new(&self.root).require_git(false).build() {
            let entry = entry.map_err(|err| {
                VfsError::new(VfsErrorKind::Unavailable)
                    .with_backend("Dir")
                    .with_source(err)
            })?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let rel: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(rel.join("/"));
        }

        files.sort_by(|a, b| path::compare(a, b));
        Ok(files)
    }

    fn open(&self, rel: &str) -> Result<Box<dyn Read + Send>, VfsError> {
        let rel = path::normalize(rel)?;
        let full = self.root.join(&rel);
        let file = File::open(&full)
            .map_err(|err| VfsError::io(err, Some(rel)).with_backend("Dir"))?;
        Ok(Box::new(file))
    }
}

/// Single zero-byte file, used for synthesized pages such as redirects.
#[derive(Clone, PartialEq, Eq)]
pub struct EmptySource {
    path: String,
}

impl EmptySource {
    /// Source yielding one empty file at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl fmt::Debug for EmptySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EmptySource").field(&self.path).finish()
    }
}

impl Source for EmptySource {
    fn files(&self) -> Result<Vec<String>, VfsError> {
        Ok(vec![self.path.clone()])
    }

    fn open(&self, rel: &str) -> Result<Box<dyn Read + Send>, VfsError> {
        if path::clean(rel) != path::clean(&self.path) {
            return Err(VfsError::not_found(rel).with_backend("Empty"));
        }
        Ok(Box::new(io::empty()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use docgen_vfs::MemoryTree;
    use pretty_assertions::assert_eq;

    use super::*;

    fn snapshot(files: &[(&str, &str)]) -> Arc<SnapshotIndex> {
        let tree = files
            .iter()
            .fold(MemoryTree::new(), |tree, (path, content)| {
                tree.with_file(*path, *content)
            });
        Arc::new(SnapshotIndex::build(Arc::new(tree)).unwrap())
    }

    fn read(source: &dyn Source, path: &str) -> String {
        let mut content = String::new();
        source
            .open(path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn test_snapshot_source_lists_relative_paths() {
        let index = snapshot(&[
            ("docs/intro.md", "intro"),
            ("docs/guide/setup.md", "setup"),
            ("docs-old/x.md", "old"),
            ("README.md", "readme"),
        ]);

        let source = SnapshotSource::new(index, "docs");
        assert_eq!(source.files().unwrap(), vec!["guide/setup.md", "intro.md"]);
        assert_eq!(read(&source, "guide/setup.md"), "setup");
    }

    #[test]
    fn test_snapshot_source_root() {
        let index = snapshot(&[("docs/intro.md", "intro"), ("README.md", "readme")]);

        let source = SnapshotSource::new(index, ".");
        assert_eq!(source.files().unwrap(), vec!["README.md", "docs/intro.md"]);
        assert_eq!(read(&source, "README.md"), "readme");
    }

    #[test]
    fn test_snapshot_source_glob() {
        let index = snapshot(&[
            ("docs/intro.md", ""),
            ("docs/guide/setup.md", ""),
            ("docs/guide/diagram.png", ""),
        ]);

        let source = SnapshotSource::new(index, "docs")
            .with_glob("guide/*.md")
            .unwrap();
        assert_eq!(source.files().unwrap(), vec!["guide/setup.md"]);
    }

    #[test]
    fn test_snapshot_source_missing_dir() {
        let index = snapshot(&[("docs/intro.md", "")]);

        let err = SnapshotSource::new(index, "manual").files().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_snapshot_source_rejects_escaping_paths() {
        let index = snapshot(&[("docs/intro.md", ""), ("secret.txt", "")]);
        let source = SnapshotSource::new(index, "docs");

        let err = source.open("../secret.txt").err().unwrap();
        assert_eq!(err.kind, VfsErrorKind::InvalidPath);
    }

    #[test]
    fn test_dir_source() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("css")).unwrap();
        fs::write(temp.path().join("css/site.css"), "body {}").unwrap();
        fs::write(temp.path().join("favicon.ico"), "ico").unwrap();
        fs::write(temp.path().join(".hidden"), "secret").unwrap();

        let source = DirSource::new(temp.path());
        assert_eq!(source.files().unwrap(), vec!["css/site.css", "favicon.ico"]);
        assert_eq!(read(&source, "css/site.css"), "body {}");
        assert!(source.open("missing.css").err().unwrap().is_not_found());
        assert_eq!(
            source.open("../etc/passwd").err().unwrap().kind,
            VfsErrorKind::InvalidPath
        );
    }

    #[test]
    fn test_dir_source_missing_root() {
        let temp = tempfile::tempdir().unwrap();

        let err = DirSource::new(temp.path().join("missing")).files().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_empty_source() {
        let source = EmptySource::new("index.html");

        assert_eq!(source.files().unwrap(), vec!["index.html"]);
        assert_eq!(read(&source, "index.html"), "");
        assert!(source.open("other.html").err().unwrap().is_not_found());
    }
}
