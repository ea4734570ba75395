//! Navigation menu of one documentation version.

use std::sync::Arc;

use docgen_vfs::{SnapshotIndex, VfsError, path};

use crate::paths::{page_title, strip_number_prefix};

/// Top-level directory of the docs tree and the pages directly inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSection {
    /// Directory name without its number prefix.
    pub title: String,
    /// Directory path relative to the docs directory.
    pub path: String,
    /// Pages of the section in snapshot order.
    pub items: Vec<MenuItem>,
}

/// Markdown page listed in a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Page title derived from the file name.
    pub title: String,
    /// Source path relative to the docs directory.
    pub path: String,
}

/// Build the menu of the docs directory `docs_dir` of a snapshot.
///
/// Sections and items keep snapshot order, so number prefixes define the
/// order. Sections without pages are left out.
///
/// # Errors
///
/// Returns [`VfsError`] if `docs_dir` is missing or not a directory.
pub fn build_menu(index: &Arc<SnapshotIndex>, docs_dir: &str) -> Result<Vec<MenuSection>, VfsError> {
    let root = path::normalize(docs_dir)?;
    let relative = |full: &str| -> String {
        if root.is_empty() {
            full.to_owned()
        } else {
            full.strip_prefix(&format!("{root}/"))
                .unwrap_or(full)
                .to_owned()
        }
    };

    let mut sections = Vec::new();
    for dir in index.read_dir(docs_dir)? {
        if !dir.is_dir {
            continue;
        }
        let items: Vec<MenuItem> = index
            .read_dir(&dir.path)?
            .into_iter()
            .filter(|f| !f.is_dir && path::extension(&f.name) == Some("md"))
            .map(|f| MenuItem {
                title: page_title(&f.name),
                path: relative(&f.path),
            })
            .collect();
        if items.is_empty() {
            continue;
        }
        sections.push(MenuSection {
            title: strip_number_prefix(&dir.name).to_owned(),
            path: relative(&dir.path),
            items,
        });
    }

    tracing::debug!(docs_dir, sections = sections.len(), "Built menu");
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use docgen_vfs::MemoryTree;
    use pretty_assertions::assert_eq;

    use super::*;

    fn index(files: &[&str]) -> Arc<SnapshotIndex> {
        let tree = files
            .iter()
            .fold(MemoryTree::new(), |tree, path| tree.with_file(*path, ""));
        Arc::new(SnapshotIndex::build(Arc::new(tree)).unwrap())
    }

    #[test]
    fn test_build_menu() {
        let index = index(&[
            "docs/01. Tutorial/01. Intro.md",
            "docs/01. Tutorial/02. Setup.md",
            "docs/01. Tutorial/logo.png",
            "docs/01. Tutorial/Nested/deep.md",
            "docs/02. Reference/01. API.md",
            "docs/03. Images/a.png",
            "docs/index.md",
        ]);

        let menu = build_menu(&index, "docs").unwrap();
        assert_eq!(
            menu,
            vec![
                MenuSection {
                    title: "Tutorial".to_owned(),
                    path: "01. Tutorial".to_owned(),
                    items: vec![
                        MenuItem {
                            title: "Intro".to_owned(),
                            path: "01. Tutorial/01. Intro.md".to_owned(),
                        },
                        MenuItem {
                            title: "Setup".to_owned(),
                            path: "01. Tutorial/02. Setup.md".to_owned(),
                        },
                    ],
                },
                MenuSection {
                    title: "Reference".to_owned(),
                    path: "02. Reference".to_owned(),
                    items: vec![MenuItem {
                        title: "API".to_owned(),
                        path: "02. Reference/01. API.md".to_owned(),
                    }],
                },
            ]
        );
    }

    #[test]
    fn test_build_menu_at_root() {
        let index = index(&["guide/intro.md"]);

        let menu = build_menu(&index, ".").unwrap();
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].items[0].path, "guide/intro.md");
    }

    #[test]
    fn test_missing_docs_dir() {
        let index = index(&["guide/intro.md"]);

        assert!(build_menu(&index, "docs").unwrap_err().is_not_found());
    }
}
