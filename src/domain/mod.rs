//! Core types: Node, ContentFile, Notebook, ExportOptions

mod content_type;
mod node;
mod notebook;
mod options;

pub use content_type::ContentType;
pub use node::{ContentFile, Node, NodeUsage, TreeError, TreeProvider};
pub use notebook::Notebook;
pub use options::{
    CustomOptions, ExportFormat, ExportOptions, ExportSource, HtmlOptions, PdfOptions,
};
