//! Renderers turn one Markdown file into one artifact in a target format.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use thiserror::Error;

use super::html::convert;
use super::mhtml::{MhtmlResource, write_mhtml};
use super::template::{Page, Stylesheet, render_page};
use super::theme::THEME_DEFAULT;
use crate::domain::{ExportFormat, ExportOptions, HtmlOptions};
use crate::infra::{FsError, copy_file, ensure_dir, local_media_path};

/// Errors from renderers.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("unknown theme '{0}': use 'default', 'dark', or a path to a CSS file")]
    UnknownTheme(String),

    #[error("no {0} command configured")]
    NotConfigured(ExportFormat),

    #[error("failed to run `{command}`: {source}")]
    Spawn { command: String, source: io::Error },

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("`{command}` did not produce {}", output.display())]
    MissingOutput { command: String, output: PathBuf },
}

/// Characters escaped in generated relative hrefs.
const HREF_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\'')
    .add(b'`');

/// One conversion job.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// The Markdown source file.
    pub source: &'a Path,
    /// Collision-free target path, already carrying the format's suffix.
    pub destination: &'a Path,
    pub options: &'a ExportOptions,
}

/// Converts a Markdown file into a target format.
pub trait Renderer: Send + Sync {
    /// Writes the artifact and returns its path.
    fn render(&self, request: &RenderRequest<'_>) -> Result<PathBuf, RenderError>;
}

/// Renders Markdown to a standalone HTML page or MHTML archive.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    theme_css: String,
    template: Option<String>,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self {
            theme_css: THEME_DEFAULT.to_string(),
            template: None,
        }
    }
}

/// Where the local images of a page end up.
enum Assets<'a> {
    /// Links left untouched.
    Linked,
    /// `data:` URIs.
    Embedded,
    /// Copied into the page's resource folder.
    Copied { folder: &'a Path, href: &'a str },
    /// Parts of an MHTML archive.
    Archived(&'a mut Vec<MhtmlResource>),
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme_css(mut self, css: impl Into<String>) -> Self {
        self.theme_css = css.into();
        self
    }

    /// Replaces the built-in page template (minijinja syntax).
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Renders `source` to `destination` using `options`.
    ///
    /// Resources that are not inlined go to a `<stem>_files` folder next to
    /// `destination`.
    pub fn render_file(
        &self,
        source: &Path,
        destination: &Path,
        options: &HtmlOptions,
    ) -> Result<PathBuf, RenderError> {
        let markdown = std::fs::read_to_string(source).map_err(|e| RenderError::Read {
            path: source.to_path_buf(),
            source: e,
        })?;
        let (front_title, body) = split_front_matter(&markdown);
        let title = front_title.unwrap_or_else(|| file_stem(source));
        let modified = std::fs::metadata(source)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        let stem = file_stem(destination);
        let out_dir = destination.parent().unwrap_or(Path::new(""));
        let files_name = format!("{stem}_files");
        let files_dir = out_dir.join(&files_name);
        let files_href = utf8_percent_encode(&files_name, HREF_ESCAPE).to_string();
        let src_dir = source.parent().unwrap_or(Path::new(""));

        let mut archived = Vec::new();
        let mut assets = if options.use_mime_html {
            Assets::Archived(&mut archived)
        } else if !options.complete_page {
            Assets::Linked
        } else if options.embed_images {
            Assets::Embedded
        } else {
            Assets::Copied {
                folder: &files_dir,
                href: &files_href,
            }
        };

        let mut copy_error = None;
        let converted = convert(body, options.add_outline_panel, |link| {
            match resolve_asset(src_dir, link, &mut assets) {
                Ok(rewritten) => rewritten,
                Err(e) => {
                    copy_error.get_or_insert(e);
                    None
                }
            }
        });
        if let Some(e) = copy_error {
            return Err(e);
        }

        let stylesheet_href = format!("{files_href}/style.css");
        let stylesheet = if options.embed_styles || options.use_mime_html {
            Stylesheet::Inline(&self.theme_css)
        } else {
            let css_path = files_dir.join("style.css");
            ensure_dir(&files_dir)?;
            write(&css_path, self.theme_css.as_bytes())?;
            Stylesheet::Linked(&stylesheet_href)
        };

        let page = Page {
            title: &title,
            content: &converted.body,
            stylesheet,
            outline: &converted.headings,
            modified,
        };
        let html = render_page(&page, self.template.as_deref())?;

        if options.use_mime_html {
            let archive = write_mhtml(&title, &format!("{stem}.html"), &html, &archived);
            write(destination, archive.as_bytes())?;
        } else {
            write(destination, html.as_bytes())?;
        }
        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            "rendered html"
        );
        Ok(destination.to_path_buf())
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> Result<PathBuf, RenderError> {
        self.render_file(request.source, request.destination, &request.options.html)
    }
}

/// Applies the asset mode to one image link. `Ok(None)` keeps the link.
fn resolve_asset(
    src_dir: &Path,
    link: &str,
    assets: &mut Assets<'_>,
) -> Result<Option<String>, RenderError> {
    if matches!(assets, Assets::Linked) {
        return Ok(None);
    }
    let Some(relative) = local_media_path(link) else {
        return Ok(None);
    };
    let path = src_dir.join(&relative);
    if !path.is_file() {
        tracing::warn!(media = %path.display(), "referenced media not found");
        return Ok(None);
    }
    let href = relative.to_string_lossy().replace('\\', "/");

    match assets {
        Assets::Linked => Ok(None),
        Assets::Embedded => {
            let bytes = std::fs::read(&path).map_err(|source| RenderError::Read {
                path: path.clone(),
                source,
            })?;
            Ok(Some(data_uri(&path, &bytes)))
        }
        Assets::Copied { folder, href: base } => {
            copy_file(&path, &folder.join(&relative), true)?;
            Ok(Some(format!("{base}/{}", utf8_percent_encode(&href, HREF_ESCAPE))))
        }
        Assets::Archived(resources) => {
            if !resources.iter().any(|r| r.location == href) {
                let bytes = std::fs::read(&path).map_err(|source| RenderError::Read {
                    path: path.clone(),
                    source,
                })?;
                resources.push(MhtmlResource::new(href.clone(), &path, bytes));
            }
            Ok(Some(href))
        }
    }
}

fn data_uri(path: &Path, bytes: &[u8]) -> String {
    use base64::{Engine as _, engine::general_purpose};

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes))
}

/// Separates a YAML front matter block from the body and returns its
/// `title`, if any.
fn split_front_matter(markdown: &str) -> (Option<String>, &str) {
    let Some(rest) = markdown
        .strip_prefix("---\n")
        .or_else(|| markdown.strip_prefix("---\r\n"))
    else {
        return (None, markdown);
    };
    let Some(end) = rest.find("\n---") else {
        return (None, markdown);
    };
    let yaml = &rest[..end];
    let after = &rest[end + 4..];
    let body = after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
        .unwrap_or(after);

    let title = match serde_yaml::from_str::<serde_yaml::Value>(yaml) {
        Ok(value) => value
            .get("title")
            .and_then(|t| t.as_str())
            .map(str::to_string),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring invalid front matter");
            None
        }
    };
    (title, body)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    std::fs::write(path, bytes).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })
}
