//! Export options: what to export, in which format, and where.

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which part of the notebook an export covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportSource {
    /// A single document
    Document,
    /// A folder and (optionally) its sub-folders
    Folder,
    /// The whole notebook
    #[default]
    Notebook,
}

/// Target format of an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Markdown copy with media and attachments
    #[default]
    Markdown,
    /// HTML page (or MIME-HTML archive)
    Html,
    /// PDF document through an external converter
    Pdf,
    /// User-defined conversion command
    Custom,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Markdown => "Markdown",
            Self::Html => "HTML",
            Self::Pdf => "PDF",
            Self::Custom => "Custom",
        };
        f.write_str(name)
    }
}

/// HTML-specific export options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlOptions {
    /// Inline the stylesheet instead of linking a separate file.
    pub embed_styles: bool,
    /// With `complete_page`, inline images as `data:` URIs.
    pub embed_images: bool,
    /// Carry local images along with the page.
    pub complete_page: bool,
    /// Package the page and its resources as a single `.mht` archive.
    pub use_mime_html: bool,
    /// Add a navigation panel listing the document's headings.
    pub add_outline_panel: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            embed_styles: true,
            embed_images: true,
            complete_page: true,
            use_mime_html: false,
            add_outline_panel: true,
        }
    }
}

/// PDF pipeline: `%1` is the rendered HTML input, `%2` the PDF output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfOptions {
    pub command: Option<String>,
}

/// Custom pipeline: `%1` is the source Markdown file, `%2` the output path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomOptions {
    pub command: Option<String>,
    /// Extension of the produced file, including the dot.
    pub target_suffix: String,
}

impl Default for CustomOptions {
    fn default() -> Self {
        Self {
            command: None,
            target_suffix: ".txt".to_string(),
        }
    }
}

/// Options for a single export invocation.
///
/// Read-only during the walk; persisted between sessions as the last-used
/// options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub source: ExportSource,
    pub format: ExportFormat,
    pub output_dir: PathBuf,
    /// Descend into sub-folders when exporting a folder.
    pub recursive: bool,
    pub export_attachments: bool,
    pub html: HtmlOptions,
    pub pdf: PdfOptions,
    pub custom: CustomOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            source: ExportSource::default(),
            format: ExportFormat::default(),
            output_dir: PathBuf::from("tome_exports"),
            recursive: true,
            export_attachments: true,
            html: HtmlOptions::default(),
            pdf: PdfOptions::default(),
            custom: CustomOptions::default(),
        }
    }
}

impl ExportOptions {
    /// Extension (with the dot) of a rendered artifact for the target format.
    ///
    /// Markdown exports keep the source file name and have no suffix.
    pub fn rendered_suffix(&self) -> Option<&str> {
        match self.format {
            ExportFormat::Markdown => None,
            ExportFormat::Html if self.html.use_mime_html => Some(".mht"),
            ExportFormat::Html => Some(".html"),
            ExportFormat::Pdf => Some(".pdf"),
            ExportFormat::Custom => Some(self.custom.target_suffix.as_str()),
        }
    }
}
