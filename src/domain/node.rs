//! Document tree nodes: folders (containers) and documents.

use std::cell::OnceCell;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ContentType;

/// The role a node plays in its notebook.
///
/// Recursive operations only descend into `Normal` containers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeUsage {
    #[default]
    Normal,
    /// Deleted items waiting to be purged.
    RecycleBin,
    /// Bookkeeping folders that are not part of the user's content.
    Internal,
}

/// Errors raised while loading a node's children.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid metadata in {path}: {message}")]
    InvalidMetadata { path: PathBuf, message: String },

    #[error("not a notebook directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("not a document (unrecognized extension): {path}")]
    NotADocument { path: PathBuf },
}

/// Loads the children of a container on first access.
pub trait TreeProvider: fmt::Debug {
    /// Returns the children of `node` in their native order.
    fn load_children(&self, node: &Node) -> Result<Vec<Node>, TreeError>;
}

/// The file backing a document node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    path: PathBuf,
    content_type: ContentType,
}

impl ContentFile {
    pub fn new(path: impl Into<PathBuf>, content_type: ContentType) -> Self {
        Self {
            path: path.into(),
            content_type,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name including the extension, e.g. `a.md`.
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// File name without its final extension, e.g. `a` for `a.md`.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Directory holding the file.
    pub fn parent_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }
}

#[derive(Debug)]
struct Container {
    children: OnceCell<Vec<Node>>,
    provider: Option<Arc<dyn TreeProvider>>,
}

/// A node in a notebook's document tree.
///
/// A node is a container (folder-like, with ordered children), a document
/// (backed by a [`ContentFile`]), or in principle both. Children of a
/// container are loaded lazily through its [`TreeProvider`].
#[derive(Debug)]
pub struct Node {
    name: String,
    path: PathBuf,
    usage: NodeUsage,
    content: Option<ContentFile>,
    attachment_folder: Option<PathBuf>,
    container: Option<Container>,
}

impl Node {
    /// Creates a document node named after its file.
    pub fn document(file: ContentFile) -> Self {
        Self {
            name: file.name().to_string(),
            path: file.path().to_path_buf(),
            usage: NodeUsage::Normal,
            content: Some(file),
            attachment_folder: None,
            container: None,
        }
    }

    /// Creates a container whose children are loaded on demand.
    pub fn folder(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        provider: Arc<dyn TreeProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            usage: NodeUsage::Normal,
            content: None,
            attachment_folder: None,
            container: Some(Container {
                children: OnceCell::new(),
                provider: Some(provider),
            }),
        }
    }

    /// Creates a container with its children already in place.
    pub fn loaded_folder(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        children: Vec<Node>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            usage: NodeUsage::Normal,
            content: None,
            attachment_folder: None,
            container: Some(Container {
                children: OnceCell::from(children),
                provider: None,
            }),
        }
    }

    pub fn with_usage(mut self, usage: NodeUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Sets the attachment folder, relative to the document's directory.
    pub fn with_attachment_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.attachment_folder = Some(folder.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn usage(&self) -> NodeUsage {
        self.usage
    }

    pub fn is_container(&self) -> bool {
        self.container.is_some()
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    pub fn content_file(&self) -> Option<&ContentFile> {
        self.content.as_ref()
    }

    /// The declared attachment folder, relative to the document's directory.
    ///
    /// An empty path counts as no attachment folder.
    pub fn attachment_folder(&self) -> Option<&Path> {
        self.attachment_folder
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Absolute location of the attachment folder.
    pub fn attachment_folder_path(&self) -> Option<PathBuf> {
        let folder = self.attachment_folder()?;
        let base = match &self.content {
            Some(file) => file.parent_dir(),
            None => self.path.as_path(),
        };
        Some(base.join(folder))
    }

    /// Whether the children of this container are available.
    ///
    /// Documents are always considered loaded.
    pub fn is_loaded(&self) -> bool {
        self.container
            .as_ref()
            .is_none_or(|c| c.children.get().is_some())
    }

    /// Loads the children if needed and returns them.
    ///
    /// Returns an empty slice for non-containers.
    pub fn load(&self) -> Result<&[Node], TreeError> {
        let Some(container) = &self.container else {
            return Ok(&[]);
        };
        if let Some(children) = container.children.get() {
            return Ok(children);
        }

        let loaded = match &container.provider {
            Some(provider) => provider.load_children(self)?,
            None => Vec::new(),
        };
        Ok(container.children.get_or_init(|| loaded))
    }

    /// Children loaded so far; empty if the container was never loaded.
    pub fn children(&self) -> &[Node] {
        self.container
            .as_ref()
            .and_then(|c| c.children.get())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
