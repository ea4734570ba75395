//! Rule-based bundling of versioned documentation sources.
//!
//! A [`Bundler`] collects [`Rule`]s. Each rule takes the files of one [`Source`],
//! filters them, renames them through a [`ModifierChain`] and stores them under
//! a destination directory, optionally tagged (typically with a version name).
//! Compiling the rules against a root URL yields an immutable [`Bundle`]:
//!
//! - [`Bundle::files`] lists every destination path
//! - [`Bundle::write_file_to`] renders one destination path by streaming its
//!   source through the chain's content stages
//! - [`Bundle::store_in_dir`] renders everything to disk
//!
//! Content stages receive a [`Context`] that resolves links between files,
//! including files of other rules sharing the same tag.
//!
//! # Example
//!
//! ```ignore
//! use docgen_bundler::{Bundler, ModifierChain, Rule, SnapshotSource};
//!
//! let mut bundler = Bundler::new();
//! bundler.add_rule(
//!     Rule::new(SnapshotSource::new(index, "docs"))
//!         .chain(ModifierChain::new().with(markdown_stage))
//!         .store_in("v1")
//!         .tag("v1"),
//! );
//! let bundle = bundler.compile("https://example.com/docs/")?;
//! bundle.store_in_dir(Path::new("generated"))?;
//! ```

mod bundle;
mod bundler;
mod context;
mod error;
mod modifier;
mod pipe;
mod redirect;
mod source;

pub use bundle::{Bundle, Mapping, join_url};
pub use bundler::{Bundler, Filter, Rule};
pub use context::Context;
pub use error::{BundleError, LinkError, ModifyError};
pub use modifier::{ContentModifier, Modifier, ModifierChain, PathModifier, Stage};
pub use redirect::{DEFAULT_REDIRECT_TEMPLATE, Redirector};
pub use source::{DirSource, EmptySource, SnapshotSource, Source};
