//! Conversion through external commands (PDF and custom pipelines).

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::render::{HtmlRenderer, RenderError, RenderRequest, Renderer};
use crate::domain::{ExportFormat, HtmlOptions};

/// Runs a user-configured command line.
///
/// `%1` expands to the input file and `%2` to the output file, both quoted
/// for the platform shell. PDF commands get a self-contained HTML page as
/// input; custom commands get the Markdown source.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    format: ExportFormat,
    html: HtmlRenderer,
}

impl CommandRenderer {
    pub fn pdf(html: HtmlRenderer) -> Self {
        Self {
            format: ExportFormat::Pdf,
            html,
        }
    }

    pub fn custom() -> Self {
        Self {
            format: ExportFormat::Custom,
            html: HtmlRenderer::new(),
        }
    }

    fn command_template<'a>(&self, request: &'a RenderRequest<'_>) -> Option<&'a str> {
        let command = match self.format {
            ExportFormat::Pdf => request.options.pdf.command.as_deref(),
            ExportFormat::Custom => request.options.custom.command.as_deref(),
            ExportFormat::Markdown | ExportFormat::Html => None,
        };
        command.filter(|c| !c.trim().is_empty())
    }
}

impl Renderer for CommandRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> Result<PathBuf, RenderError> {
        let template = self
            .command_template(request)
            .ok_or(RenderError::NotConfigured(self.format))?;

        // `_staging` keeps the intermediate page alive until the command exits.
        let (input, _staging) = if self.format == ExportFormat::Pdf {
            let dir = tempfile::tempdir().map_err(|source| RenderError::Write {
                path: std::env::temp_dir(),
                source,
            })?;
            let stem = request
                .source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let page = dir.path().join(format!("{stem}.html"));
            let options = HtmlOptions {
                embed_styles: true,
                embed_images: true,
                complete_page: true,
                use_mime_html: false,
                add_outline_panel: false,
            };
            self.html.render_file(request.source, &page, &options)?;
            (page, Some(dir))
        } else {
            (request.source.to_path_buf(), None)
        };

        let command_line = expand(template, &input, request.destination);
        tracing::debug!(command = %command_line, "running export command");
        let status = shell(&command_line)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| RenderError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        if !status.success() {
            return Err(RenderError::CommandFailed {
                command: command_line,
                status,
            });
        }
        if !request.destination.exists() {
            return Err(RenderError::MissingOutput {
                command: command_line,
                output: request.destination.to_path_buf(),
            });
        }
        Ok(request.destination.to_path_buf())
    }
}

/// Substitutes `%1` and `%2` in a command template.
///
/// Placeholders are only recognized in the template itself, never inside
/// the substituted paths.
pub fn expand(template: &str, input: &Path, output: &Path) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('%') {
        expanded.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix('1') {
            expanded.push_str(&quote(input));
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('2') {
            expanded.push_str(&quote(output));
            rest = tail;
        } else {
            expanded.push('%');
            rest = after;
        }
    }
    expanded.push_str(rest);
    expanded
}

#[cfg(unix)]
fn quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

#[cfg(not(unix))]
fn quote(path: &Path) -> String {
    format!("\"{}\"", path.to_string_lossy())
}

#[cfg(unix)]
fn shell(command_line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    cmd
}

#[cfg(not(unix))]
fn shell(command_line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command_line);
    cmd
}
