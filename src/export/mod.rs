//! Exporting notebooks, folders, and documents.
//!
//! [`TreeExporter`] walks the tree and mirrors it into an output directory.
//! Markdown is copied along with its media and attachments; HTML, PDF, and
//! custom formats are produced by pluggable [`Renderer`]s. Progress, log
//! lines, and per-file outcomes are reported through an [`ExportSink`].

mod command;
mod exporter;
mod html;
mod mhtml;
mod outcome;
mod render;
mod sink;
mod template;
mod theme;

pub use command::{CommandRenderer, expand};
pub use exporter::{ExportError, Selection, TreeExporter};
pub use html::{Converted, Heading, convert, markdown_to_html};
pub use mhtml::{MhtmlResource, write_mhtml};
pub use outcome::{ExportResult, ItemOutcome, ItemStatus, SkipReason};
pub use render::{HtmlRenderer, RenderError, RenderRequest, Renderer};
pub use sink::{CancelToken, CollectingSink, ExportSink, TracingSink};
pub use template::{DEFAULT_PAGE_TEMPLATE, Page, Stylesheet, render_page};
pub use theme::{THEME_DARK, THEME_DEFAULT, get_theme_css};
