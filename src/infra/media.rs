//! Embedded media and attachments of documents.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use pulldown_cmark::{Event, Parser, Tag};
use regex::{Captures, Regex};

use super::fs::{FsError, copy_dir, copy_file};
use crate::domain::Node;

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\s[^>]*?src\s*=\s*["']([^"']+)["']"#).expect("valid img regex")
});

/// Collects the image links of a Markdown document, in document order and
/// without duplicates.
///
/// Covers Markdown image syntax and `<img src>` tags in raw HTML.
///
/// # Examples
///
/// ```
/// use tome::infra::image_links;
///
/// let links = image_links("![a](img/a.png)\n\n<img src=\"b.jpg\">");
/// assert_eq!(links, vec!["img/a.png", "b.jpg"]);
/// ```
pub fn image_links(markdown: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut links = Vec::new();
    let mut push = |link: &str| {
        if seen.insert(link.to_string()) {
            links.push(link.to_string());
        }
    };

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Image(_, dest, _)) => push(&dest),
            Event::Html(html) => {
                for caps in IMG_SRC.captures_iter(&html) {
                    push(&caps[1]);
                }
            }
            _ => {}
        }
    }
    links
}

/// Rewrites the `src` of every `<img>` tag in an HTML fragment.
///
/// `rewrite` returns the replacement, or `None` to keep the original.
pub fn replace_img_sources(html: &str, mut rewrite: impl FnMut(&str) -> Option<String>) -> String {
    IMG_SRC
        .replace_all(html, |caps: &Captures| {
            let tag = &caps[0];
            let Some(src) = caps.get(1) else {
                return tag.to_string();
            };
            let offset = caps.get(0).map_or(0, |m| m.start());
            match rewrite(src.as_str()) {
                Some(new) => format!(
                    "{}{new}{}",
                    &tag[..src.start() - offset],
                    &tag[src.end() - offset..]
                ),
                None => tag.to_string(),
            }
        })
        .into_owned()
}

/// Resolves an image link to a path relative to the document's directory.
///
/// Returns `None` for remote, `data:`, anchor, and absolute links, and for
/// paths that would leave the document's directory.
pub fn local_media_path(link: &str) -> Option<PathBuf> {
    let link = link.trim();
    if link.is_empty()
        || link.contains("://")
        || link.starts_with("data:")
        || link.starts_with("mailto:")
        || link.starts_with('#')
    {
        return None;
    }

    let without_fragment = link.split(['?', '#']).next().unwrap_or(link);
    let decoded = percent_decode_str(without_fragment).decode_utf8_lossy();
    let path = PathBuf::from(decoded.as_ref());

    let confined = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    (confined && !path.as_os_str().is_empty()).then_some(path)
}

/// Copies the local images referenced by `source` next to `dest`, keeping
/// their relative locations.
///
/// Missing images are skipped. Returns the number of files copied.
pub fn copy_media_files(source: &Path, dest: &Path) -> Result<usize, FsError> {
    let markdown = std::fs::read_to_string(source).map_err(|e| FsError::from_io(source, e))?;
    let src_dir = source.parent().unwrap_or(Path::new(""));
    let dest_dir = dest.parent().unwrap_or(Path::new(""));

    let mut copied = 0;
    for relative in image_links(&markdown)
        .iter()
        .filter_map(|link| local_media_path(link))
    {
        let from = src_dir.join(&relative);
        if !from.is_file() {
            tracing::warn!(
                document = %source.display(),
                media = %relative.display(),
                "referenced media not found"
            );
            continue;
        }
        copy_file(&from, &dest_dir.join(&relative), true)?;
        copied += 1;
    }
    Ok(copied)
}

/// Copies the node's attachment folder to `dest_folder`.
///
/// Returns the number of files copied; zero when the node has no attachment
/// folder or it does not exist on disk.
pub fn copy_attachments(node: &Node, dest_folder: &Path) -> Result<usize, FsError> {
    let Some(src) = node.attachment_folder_path() else {
        return Ok(0);
    };
    if !src.is_dir() {
        tracing::warn!(folder = %src.display(), "attachment folder missing");
        return Ok(0);
    }
    copy_dir(&src, dest_folder)
}
