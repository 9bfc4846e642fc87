//! Per-item outcomes and the overall result of an export.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Why a node produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The node has no backing file.
    NoContentFile,
    /// The content type cannot be converted to the target format.
    UnsupportedContentType,
    /// The export was cancelled before this item was converted.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Exported { output: PathBuf },
    Skipped { reason: SkipReason },
    Failed { reason: String },
}

/// What happened to one node during an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub source: PathBuf,
    #[serde(flatten)]
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn exported(source: &Path, output: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            status: ItemStatus::Exported {
                output: output.to_path_buf(),
            },
        }
    }

    pub fn skipped(source: &Path, reason: SkipReason) -> Self {
        Self {
            source: source.to_path_buf(),
            status: ItemStatus::Skipped { reason },
        }
    }

    pub fn failed(source: &Path, reason: impl Into<String>) -> Self {
        Self {
            source: source.to_path_buf(),
            status: ItemStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_exported(&self) -> bool {
        matches!(self.status, ItemStatus::Exported { .. })
    }
}

/// Result of a top-level export.
///
/// Document exports yield at most one path; folder and notebook exports
/// yield every produced path in traversal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "paths", rename_all = "snake_case")]
pub enum ExportResult {
    Document(Option<PathBuf>),
    Tree(Vec<PathBuf>),
}

impl ExportResult {
    /// Number of exported files.
    pub fn count(&self) -> usize {
        match self {
            Self::Document(path) => usize::from(path.is_some()),
            Self::Tree(paths) => paths.len(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Self::Document(path) => path.as_slice(),
            Self::Tree(paths) => paths,
        }
    }
}
