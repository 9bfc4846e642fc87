//! Walks a notebook tree and exports documents into a mirrored folder
//! structure.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use super::command::CommandRenderer;
use super::outcome::{ExportResult, ItemOutcome, SkipReason};
use super::render::{HtmlRenderer, RenderError, RenderRequest, Renderer};
use super::sink::ExportSink;
use crate::domain::{
    ContentFile, ContentType, ExportFormat, ExportOptions, ExportSource, Node, NodeUsage, Notebook,
};
use crate::infra::{
    CaseSensitivity, FsError, copy_attachments, copy_file, copy_media_files, ensure_dir,
    relative_path, rename_if_exists_case_insensitive, unique_name,
};

/// Errors that stop an export before it starts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no {0} selected for export")]
    NothingSelected(&'static str),

    #[error("'{0}' is not a folder")]
    NotAFolder(String),
}

/// Why a single file could not be exported.
#[derive(Debug, Error)]
enum ConversionError {
    #[error("Format {content_type} is not supported to export as {format}.")]
    Unsupported {
        content_type: ContentType,
        format: ExportFormat,
    },

    #[error("Unknown target format {0}.")]
    UnknownFormat(ExportFormat),

    #[error("Failed to create output folder {}.", path.display())]
    CreateFolder { path: PathBuf, source: FsError },

    #[error("Failed to copy file: {0}.")]
    Copy(#[source] FsError),

    #[error("Failed to render file: {0}.")]
    Render(#[source] RenderError),
}

impl ConversionError {
    fn outcome(&self, source: &Path) -> ItemOutcome {
        match self {
            Self::Unsupported { .. } => ItemOutcome::skipped(source, SkipReason::UnsupportedContentType),
            other => ItemOutcome::failed(source, other.to_string()),
        }
    }
}

/// What to export: the objects the chosen [`ExportSource`] refers to.
#[derive(Debug, Default, Clone, Copy)]
pub struct Selection<'a> {
    pub document: Option<&'a Node>,
    pub folder: Option<&'a Node>,
    pub notebook: Option<&'a Notebook>,
}

/// Exports documents, folders, and whole notebooks.
///
/// Stateless between calls: options come in by reference, results and
/// events go out through return values and the sink. Non-Markdown formats
/// are produced by the renderer registered for them.
pub struct TreeExporter {
    renderers: HashMap<ExportFormat, Box<dyn Renderer>>,
}

impl Default for TreeExporter {
    fn default() -> Self {
        Self::with_renderers(HtmlRenderer::new())
    }
}

impl TreeExporter {
    /// An exporter that only knows Markdown.
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// An exporter with the HTML, PDF, and custom-command renderers, all
    /// sharing `html` for page rendering.
    pub fn with_renderers(html: HtmlRenderer) -> Self {
        Self::new()
            .with_renderer(ExportFormat::Pdf, CommandRenderer::pdf(html.clone()))
            .with_renderer(ExportFormat::Custom, CommandRenderer::custom())
            .with_renderer(ExportFormat::Html, html)
    }

    pub fn with_renderer(mut self, format: ExportFormat, renderer: impl Renderer + 'static) -> Self {
        self.renderers.insert(format, Box::new(renderer));
        self
    }

    /// Exports whatever `options.source` selects.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection has no object for the chosen source,
    /// or a folder export targets a document.
    pub fn export(
        &self,
        options: &ExportOptions,
        selection: Selection<'_>,
        sink: &mut dyn ExportSink,
    ) -> Result<ExportResult, ExportError> {
        match options.source {
            ExportSource::Document => {
                let node = selection
                    .document
                    .ok_or(ExportError::NothingSelected("document"))?;
                Ok(ExportResult::Document(self.export_document(options, node, sink)))
            }
            ExportSource::Folder => {
                let folder = selection
                    .folder
                    .ok_or(ExportError::NothingSelected("folder"))?;
                if !folder.is_container() {
                    return Err(ExportError::NotAFolder(folder.name().to_string()));
                }
                Ok(ExportResult::Tree(self.export_folder(options, folder, sink)))
            }
            ExportSource::Notebook => {
                let notebook = selection
                    .notebook
                    .ok_or(ExportError::NothingSelected("notebook"))?;
                Ok(ExportResult::Tree(self.export_notebook(options, notebook, sink)))
            }
        }
    }

    /// Exports a single document into `options.output_dir`.
    pub fn export_document(
        &self,
        options: &ExportOptions,
        node: &Node,
        sink: &mut dyn ExportSink,
    ) -> Option<PathBuf> {
        if !node.has_content() {
            sink.on_log(&format!("Skipped document ({}) without file base.", node.name()));
            sink.on_item(&ItemOutcome::skipped(node.path(), SkipReason::NoContentFile));
            return None;
        }

        if let Err(e) = ensure_dir(&options.output_dir) {
            tracing::warn!(error = %e, "cannot create output directory");
            sink.on_log(&format!(
                "Failed to create output folder {}.",
                options.output_dir.display()
            ));
            return None;
        }

        self.export_file(options, &options.output_dir, node, sink)
    }

    /// Exports a folder into a subdirectory of `options.output_dir` named
    /// after it, descending into sub-folders when `options.recursive`.
    ///
    /// # Panics
    ///
    /// Panics if `folder` is not a container.
    pub fn export_folder(
        &self,
        options: &ExportOptions,
        folder: &Node,
        sink: &mut dyn ExportSink,
    ) -> Vec<PathBuf> {
        self.export_folder_into(options, &options.output_dir, folder, sink)
    }

    /// Exports every top-level entry of a notebook into
    /// `notebook_<name>` under `options.output_dir`.
    ///
    /// Top-level folders are always descended into; deeper levels follow
    /// `options.recursive`.
    ///
    /// # Panics
    ///
    /// Panics if the notebook root has not been loaded.
    pub fn export_notebook(
        &self,
        options: &ExportOptions,
        notebook: &Notebook,
        sink: &mut dyn ExportSink,
    ) -> Vec<PathBuf> {
        let root = notebook.root();
        assert!(root.is_loaded(), "notebook root must be loaded before export");

        let folder_name = format!("notebook_{}", notebook.name());
        let Some(output_folder) = make_output_folder(&options.output_dir, &folder_name, sink) else {
            return Vec::new();
        };
        self.export_children(options, &output_folder, root.children(), true, sink)
    }

    fn export_folder_into(
        &self,
        options: &ExportOptions,
        dest: &Path,
        folder: &Node,
        sink: &mut dyn ExportSink,
    ) -> Vec<PathBuf> {
        assert!(
            folder.is_container(),
            "cannot export '{}' as a folder: not a container",
            folder.name()
        );

        let Some(output_folder) = make_output_folder(dest, folder.name(), sink) else {
            return Vec::new();
        };

        let children = match folder.load() {
            Ok(children) => children,
            Err(e) => {
                tracing::warn!(folder = %folder.path().display(), error = %e, "cannot load folder");
                sink.on_log(&format!("Failed to load folder ({}): {e}.", folder.name()));
                return Vec::new();
            }
        };
        self.export_children(options, &output_folder, children, options.recursive, sink)
    }

    fn export_children(
        &self,
        options: &ExportOptions,
        output_folder: &Path,
        children: &[Node],
        descend: bool,
        sink: &mut dyn ExportSink,
    ) -> Vec<PathBuf> {
        let total = children.len();
        let mut outputs = Vec::new();
        sink.on_progress(0, total);

        for (index, child) in children.iter().enumerate() {
            if sink.is_cancelled() {
                sink.on_log("Export cancelled.");
                break;
            }

            if child.has_content()
                && let Some(output) = self.export_file(options, output_folder, child, sink)
            {
                outputs.push(output);
            }

            if descend && child.is_container() && child.usage() == NodeUsage::Normal {
                outputs.extend(self.export_folder_into(options, output_folder, child, sink));
            }

            sink.on_progress(index + 1, total);
        }

        outputs
    }

    /// Converts one document into `dest` according to `options.format`.
    ///
    /// Returns `None` for nodes without content and for failed conversions;
    /// either way the walk continues.
    pub fn export_file(
        &self,
        options: &ExportOptions,
        dest: &Path,
        node: &Node,
        sink: &mut dyn ExportSink,
    ) -> Option<PathBuf> {
        let file = node.content_file()?;
        if sink.is_cancelled() {
            sink.on_item(&ItemOutcome::skipped(file.path(), SkipReason::Cancelled));
            return None;
        }
        tracing::debug!(
            file = %file.path().display(),
            format = %options.format,
            "exporting file"
        );

        let result = match options.format {
            ExportFormat::Markdown => self.export_as_markdown(options, dest, node, file, sink),
            format => self.export_rendered(options, dest, file, format),
        };

        match result {
            Ok(output) => {
                sink.on_log(&format!(
                    "File ({}) exported to ({})",
                    file.path().display(),
                    output.display()
                ));
                sink.on_item(&ItemOutcome::exported(file.path(), &output));
                Some(output)
            }
            Err(e) => {
                sink.on_log(&e.to_string());
                sink.on_log(&format!("Failed to export file ({})", file.path().display()));
                sink.on_item(&e.outcome(file.path()));
                None
            }
        }
    }

    fn export_as_markdown(
        &self,
        options: &ExportOptions,
        dest: &Path,
        node: &Node,
        file: &ContentFile,
        sink: &mut dyn ExportSink,
    ) -> Result<PathBuf, ConversionError> {
        check_markdown(file, ExportFormat::Markdown)?;

        let folder_name = unique_name(dest, file.stem(), "", CaseSensitivity::Sensitive);
        let output_folder = dest.join(folder_name);
        ensure_dir(&output_folder).map_err(|source| ConversionError::CreateFolder {
            path: output_folder.clone(),
            source,
        })?;

        let output = output_folder.join(file.name());
        copy_file(file.path(), &output, true).map_err(ConversionError::Copy)?;

        // Attachments first: media stored inside the attachment folder then
        // lands in the copied folder instead of forcing it to be renamed.
        if options.export_attachments {
            export_attachments(node, file, &output_folder, sink);
        }

        match copy_media_files(file.path(), &output) {
            Ok(count) => tracing::debug!(count, "copied media files"),
            Err(e) => sink.on_log(&format!(
                "Failed to copy media files of ({}): {e}.",
                file.path().display()
            )),
        }

        Ok(output)
    }

    fn export_rendered(
        &self,
        options: &ExportOptions,
        dest: &Path,
        file: &ContentFile,
        format: ExportFormat,
    ) -> Result<PathBuf, ConversionError> {
        let renderer = self
            .renderers
            .get(&format)
            .ok_or(ConversionError::UnknownFormat(format))?;
        check_markdown(file, format)?;

        let suffix = options.rendered_suffix().unwrap_or_default();
        let name = unique_name(dest, file.stem(), suffix, CaseSensitivity::Sensitive);
        let destination = dest.join(name);
        let request = RenderRequest {
            source: file.path(),
            destination: &destination,
            options,
        };
        renderer.render(&request).map_err(ConversionError::Render)
    }
}

fn check_markdown(file: &ContentFile, format: ExportFormat) -> Result<(), ConversionError> {
    if file.content_type().is_markdown() {
        Ok(())
    } else {
        Err(ConversionError::Unsupported {
            content_type: file.content_type(),
            format,
        })
    }
}

fn make_output_folder(dest: &Path, name: &str, sink: &mut dyn ExportSink) -> Option<PathBuf> {
    let folder = dest.join(unique_name(dest, name, "", CaseSensitivity::Sensitive));
    match ensure_dir(&folder) {
        Ok(()) => Some(folder),
        Err(e) => {
            tracing::warn!(error = %e, "cannot create output folder");
            sink.on_log(&format!("Failed to create output folder {}.", folder.display()));
            None
        }
    }
}

/// Copies the node's attachment folder next to the exported file, at the
/// same position relative to it as in the notebook.
fn export_attachments(node: &Node, file: &ContentFile, output_folder: &Path, sink: &mut dyn ExportSink) {
    let Some(source_folder) = node.attachment_folder_path() else {
        return;
    };

    let relative = relative_path(file.parent_dir(), &source_folder);
    let escapes = relative.as_os_str().is_empty()
        || relative.components().any(|c| !matches!(c, Component::Normal(_)));
    let relative = if escapes {
        source_folder
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("attachments"))
    } else {
        relative
    };

    let dest_folder = rename_if_exists_case_insensitive(&output_folder.join(relative));
    match copy_attachments(node, &dest_folder) {
        Ok(count) => tracing::debug!(count, folder = %dest_folder.display(), "copied attachments"),
        Err(e) => sink.on_log(&format!(
            "Failed to copy attachments of ({}): {e}.",
            file.path().display()
        )),
    }
}
