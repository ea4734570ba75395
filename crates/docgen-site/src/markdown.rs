//! Markdown to HTML stage.

use std::collections::HashMap;
use std::io::{Read, Write};

use docgen_bundler::{ContentModifier, Context, LinkError, ModifyError, PathModifier};
use pulldown_cmark::{CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, html};
use url::Url;

/// Renders `.md` files to HTML fragments and renames them to `.html`.
///
/// Link and image destinations are resolved through
/// [`Context::rewrite_content_url`]. Links that cannot be resolved keep
/// their original destination. Absolute links open in a new tab and
/// headings without an explicit id get one derived from their text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Markdown;

impl PathModifier for Markdown {
    fn modify_path(&self, path: &str) -> String {
        match path.strip_suffix(".md") {
            Some(stem) => format!("{stem}.html"),
            None => path.to_owned(),
        }
    }
}

impl ContentModifier for Markdown {
    fn modify_content(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        ctx: &Context<'_>,
    ) -> Result<(), ModifyError> {
        let mut source = String::new();
        input.read_to_string(&mut source)?;
        let html = render_markdown(&source, |link| ctx.rewrite_content_url(link));
        output.write_all(html.as_bytes())?;
        Ok(())
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Render Markdown to HTML, resolving link and image destinations with `rewrite`.
pub fn render_markdown(
    source: &str,
    rewrite: impl Fn(&str) -> Result<String, LinkError>,
) -> String {
    let mut events: Vec<Event<'_>> = Parser::new_ext(source, parser_options()).collect();
    assign_heading_ids(&mut events);

    let resolve = |dest: &str| -> String {
        match rewrite(dest) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(link = dest, error = %err, "Keeping unresolved link");
                dest.to_owned()
            }
        }
    };

    let events = events.into_iter().map(|event| match event {
        Event::Start(Tag::Link {
            link_type: LinkType::Email,
            ..
        }) => event,
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let href = resolve(&dest_url);
            if opens_in_new_tab(&dest_url) {
                let mut tag = format!("<a href=\"{}\"", escape_html(&href));
                if !title.is_empty() {
                    tag.push_str(&format!(" title=\"{}\"", escape_html(&title)));
                }
                tag.push_str(" target=\"_blank\">");
                Event::InlineHtml(tag.into())
            } else {
                Event::Start(Tag::Link {
                    link_type,
                    dest_url: href.into(),
                    title,
                    id,
                })
            }
        }
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: resolve(&dest_url).into(),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

/// Whether a link leaves the site.
fn opens_in_new_tab(dest: &str) -> bool {
    match Url::parse(dest) {
        Ok(_) => true,
        Err(url::ParseError::RelativeUrlWithoutBase) => dest.starts_with("//"),
        Err(_) => true,
    }
}

/// Give every heading without an explicit `{#id}` a unique id.
fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut ids = HeadingIds::default();
    for i in 0..events.len() {
        let text = match &events[i] {
            Event::Start(Tag::Heading { id: Some(id), .. }) => {
                ids.reserve(id);
                continue;
            }
            Event::Start(Tag::Heading { id: None, .. }) => heading_text(&events[i + 1..]),
            _ => continue,
        };
        let generated = ids.generate(&text);
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(generated));
        }
    }
}

/// Plain text of a heading, given the events following its start.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

/// Heading id generator; repeated titles get `-1`, `-2`, ... suffixes.
#[derive(Default)]
struct HeadingIds {
    counts: HashMap<String, usize>,
}

impl HeadingIds {
    fn generate(&mut self, text: &str) -> String {
        let base = heading_slug(text);
        let count = self.counts.entry(base.clone()).or_default();
        let id = match *count {
            0 => base,
            n => format!("{base}-{n}"),
        };
        *count += 1;
        id
    }

    fn reserve(&mut self, id: &str) {
        *self.counts.entry(id.to_owned()).or_default() += 1;
    }
}

/// Lowercase ASCII slug used for heading anchors.
fn heading_slug(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }
    if result.ends_with('-') {
        result.pop();
    }
    if result.is_empty() {
        result.push_str("section");
    }
    result
}

fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
