//! Content type classification for document files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The declared type of a document's content.
///
/// Only files with a recognized extension become documents in a notebook;
/// everything else (images, PDFs, archives) is treated as media.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tome::domain::ContentType;
///
/// assert_eq!(ContentType::from_path(Path::new("notes/a.md")), Some(ContentType::Markdown));
/// assert_eq!(ContentType::from_path(Path::new("todo.TXT")), Some(ContentType::Text));
/// assert_eq!(ContentType::from_path(Path::new("img.png")), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Markdown,
    Text,
}

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown"];
const TEXT_EXTENSIONS: &[&str] = &["txt", "text"];

impl ContentType {
    /// Classifies a file by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if MARKDOWN_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Markdown)
        } else if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Text)
        } else {
            None
        }
    }

    pub fn is_markdown(&self) -> bool {
        matches!(self, Self::Markdown)
    }

    /// Human-readable name used in log messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
            Self::Text => "Text",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
