//! Documentation site stages and rules for docgen.
//!
//! [`build_site`] turns the resolved documentation versions into bundle
//! rules. Each version gets its Markdown pages rendered through
//! [`Markdown`] and [`Layout`], with section and page names published
//! under slugs by [`SectionPathRewriter`], a navigation menu built from
//! the docs tree and redirects to the first page of the site, every
//! version and every section.

mod error;
mod layout;
mod markdown;
mod menu;
mod paths;
mod settings;
mod site;
mod theme;

pub use error::SiteError;
pub use layout::Layout;
pub use markdown::{Markdown, render_markdown};
pub use menu::{MenuItem, MenuSection, build_menu};
pub use paths::{SectionPathRewriter, page_title, section_dir, slugify, strip_number_prefix};
pub use settings::{SETTINGS_FILE, Settings};
pub use site::{SiteOptions, build_site};
pub use theme::{
    BuiltinAssets, DEFAULT_LAYOUT_TEMPLATE, DEFAULT_STYLESHEET, LAYOUT_TEMPLATE, REDIRECT_TEMPLATE, Theme,
};
