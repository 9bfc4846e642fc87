//! HTML page template for rendered documents.

use chrono::{DateTime, Utc};
use minijinja::{Environment, context};

use super::html::Heading;
use super::render::RenderError;

/// Default page template.
///
/// Variables: `title`, `content` (HTML), `inline_css` or `stylesheet_href`,
/// `outline` (list of `{level, id, text}`), `modified`/`modified_iso`.
pub const DEFAULT_PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="generator" content="tome">
    <title>{{ title|e }}</title>
    {% if inline_css %}<style>{{ inline_css }}</style>{% endif %}
    {% if stylesheet_href %}<link rel="stylesheet" href="{{ stylesheet_href }}">{% endif %}
</head>
<body>
    {% if outline %}
    <nav class="outline">
        <ul>
            {% for heading in outline %}<li class="outline-h{{ heading.level }}"><a href="#{{ heading.id }}">{{ heading.text|e }}</a></li>
            {% endfor %}
        </ul>
    </nav>
    {% endif %}
    <article>
        <main>{{ content }}</main>
        {% if modified %}
        <footer class="metadata">
            Last modified <time datetime="{{ modified_iso }}">{{ modified }}</time>
        </footer>
        {% endif %}
    </article>
</body>
</html>"##;

/// How the page gets its stylesheet.
#[derive(Debug, Clone, Copy)]
pub enum Stylesheet<'a> {
    Inline(&'a str),
    Linked(&'a str),
}

/// Everything a page template can show.
#[derive(Debug)]
pub struct Page<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub stylesheet: Stylesheet<'a>,
    pub outline: &'a [Heading],
    pub modified: Option<DateTime<Utc>>,
}

/// Renders a page with `template`, or the default template when `None`.
pub fn render_page(page: &Page<'_>, template: Option<&str>) -> Result<String, RenderError> {
    let mut env = Environment::new();
    env.add_template("page", template.unwrap_or(DEFAULT_PAGE_TEMPLATE))?;
    let tmpl = env.get_template("page")?;

    let (inline_css, stylesheet_href) = match page.stylesheet {
        Stylesheet::Inline(css) => (Some(css), None),
        Stylesheet::Linked(href) => (None, Some(href)),
    };

    let html = tmpl.render(context! {
        title => page.title,
        content => page.content,
        inline_css => inline_css,
        stylesheet_href => stylesheet_href,
        outline => page.outline,
        modified => page.modified.map(|m| m.format("%Y-%m-%d %H:%M").to_string()),
        modified_iso => page.modified.map(|m| m.to_rfc3339()),
    })?;

    Ok(html)
}
