//! Markdown to HTML conversion.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};
use serde::Serialize;

use crate::infra::{AnchorIds, replace_img_sources};

/// A heading of a converted document, as listed in the outline panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u32,
    pub id: String,
    pub text: String,
}

/// Output of [`convert`].
#[derive(Debug, Default)]
pub struct Converted {
    pub body: String,
    /// Empty unless heading ids were requested.
    pub headings: Vec<Heading>,
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Converts markdown text to HTML.
///
/// Enables common markdown extensions:
/// - Tables
/// - Footnotes
/// - Strikethrough
/// - Task lists
///
/// # Example
///
/// ```
/// use tome::export::markdown_to_html;
///
/// let html = markdown_to_html("# Hello\n\nWorld");
/// assert!(html.contains("<h1>Hello</h1>"));
/// assert!(html.contains("<p>World</p>"));
/// ```
pub fn markdown_to_html(markdown: &str) -> String {
    convert(markdown, false, |_| None).body
}

/// Converts markdown to HTML, optionally giving every heading a unique id,
/// and passing every image source (Markdown and raw `<img>`) through
/// `rewrite_image`.
pub fn convert(
    markdown: &str,
    heading_ids: bool,
    mut rewrite_image: impl FnMut(&str) -> Option<String>,
) -> Converted {
    let events: Vec<Event> = Parser::new_ext(markdown, parser_options()).collect();
    let mut ids = AnchorIds::new();
    let mut headings = Vec::new();
    let mut output = Vec::with_capacity(events.len());

    for (index, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading(level, _, _)) if heading_ids => {
                let level = *level as u32;
                let text = heading_text(&events[index + 1..]);
                let id = ids.next_id(&text);
                output.push(Event::Html(format!("<h{level} id=\"{id}\">").into()));
                headings.push(Heading { level, id, text });
            }
            Event::Start(Tag::Image(link_type, dest, title)) => {
                let dest = rewrite_image(dest).map_or_else(|| dest.clone(), CowStr::from);
                output.push(Event::Start(Tag::Image(*link_type, dest, title.clone())));
            }
            Event::Html(raw) => {
                let rewritten = replace_img_sources(raw, &mut rewrite_image);
                output.push(Event::Html(rewritten.into()));
            }
            other => output.push(other.clone()),
        }
    }

    let mut body = String::new();
    html::push_html(&mut body, output.into_iter());
    Converted { body, headings }
}

fn heading_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(Tag::Heading(..)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text.trim().to_string()
}
