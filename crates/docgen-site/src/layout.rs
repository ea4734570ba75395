//! Page layout stage.

use std::io::{Read, Write};
use std::sync::Arc;

use docgen_bundler::{ContentModifier, Context, ModifyError, join_url};
use minijinja::{Environment, Value, context};
use serde::Serialize;
use url::Url;

use crate::menu::MenuSection;
use crate::paths::page_title;
use crate::theme::{LAYOUT_TEMPLATE, Theme};

/// Wraps rendered HTML in the theme layout.
///
/// The template receives `page` (title, versions, menu and an optional
/// `source_url`) and `content`, and can call `asset(path)` to get the
/// absolute URL of a file at the bundle root.
#[derive(Debug, Clone)]
pub struct Layout {
    theme: Arc<Theme>,
    versions: Arc<[String]>,
    menu: Arc<[MenuSection]>,
    source_root: Option<Url>,
}

#[derive(Serialize)]
struct PageView {
    title: String,
    source_url: Option<String>,
    versions: Vec<LinkView>,
    menu: Vec<SectionView>,
}

#[derive(Serialize)]
struct SectionView {
    title: String,
    items: Vec<LinkView>,
}

#[derive(Serialize)]
struct LinkView {
    name: String,
    title: String,
    url: String,
    is_active: bool,
}

impl Layout {
    /// Layout for the pages of one version.
    ///
    /// `source_root` is the URL source paths are appended to for "edit"
    /// links, e.g. `https://github.com/owner/project/tree/v1.2.0/docs/`.
    pub fn new(
        theme: Arc<Theme>,
        versions: Arc<[String]>,
        menu: Arc<[MenuSection]>,
        source_root: Option<Url>,
    ) -> Self {
        Self {
            theme,
            versions,
            menu,
            source_root,
        }
    }

    fn page_view(&self, ctx: &Context<'_>) -> Result<PageView, ModifyError> {
        let versions = self
            .versions
            .iter()
            .map(|name| LinkView {
                name: name.clone(),
                title: name.clone(),
                url: ctx.to_absolute_url(name).into(),
                is_active: ctx.uri_segment(0) == name,
            })
            .collect();

        let mut menu = Vec::with_capacity(self.menu.len());
        for section in self.menu.iter() {
            let mut items = Vec::with_capacity(section.items.len());
            for item in &section.items {
                items.push(LinkView {
                    name: item.path.clone(),
                    title: item.title.clone(),
                    url: ctx.rewrite_content_url(&format!("/{}", item.path))?,
                    is_active: ctx.source_path() == item.path,
                });
            }
            menu.push(SectionView {
                title: section.title.clone(),
                items,
            });
        }

        Ok(PageView {
            title: page_title(ctx.source_path()),
            source_url: self
                .source_root
                .as_ref()
                .map(|root| join_url(root, ctx.source_path()).into()),
            versions,
            menu,
        })
    }
}

impl ContentModifier for Layout {
    fn modify_content(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        ctx: &Context<'_>,
    ) -> Result<(), ModifyError> {
        let mut content = String::new();
        input.read_to_string(&mut content)?;
        let page = self.page_view(ctx)?;

        let mut env = Environment::new();
        env.add_template(LAYOUT_TEMPLATE, self.theme.layout())
            .map_err(ModifyError::other)?;
        let root = ctx.bundle().root_url().clone();
        env.add_function("asset", move |path: String| -> String {
            join_url(&root, &path).into()
        });

        let template = env
            .get_template(LAYOUT_TEMPLATE)
            .map_err(ModifyError::other)?;
        template
            .render_to_write(
                context! {
                    page => Value::from_serialize(&page),
                    content => Value::from_safe_string(content),
                },
                output,
            )
            .map_err(ModifyError::other)?;
        Ok(())
    }
}
