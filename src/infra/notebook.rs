//! Filesystem-backed notebooks.
//!
//! A notebook is a directory. Sub-directories are folders and files with a
//! recognized extension are documents. Two optional metadata files shape the
//! tree:
//!
//! - `.notebook.toml` at the root: `name`, `recycle_bin` and `attachments`
//!   directory names.
//! - `.folder.toml` in any directory: `order = [...]` for the native order of
//!   entries, and an `[attachments]` table mapping a document file name to
//!   its attachment folder (relative to the directory).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::domain::{ContentFile, ContentType, Node, NodeUsage, Notebook, TreeError, TreeProvider};

/// Notebook-level metadata file name.
pub const NOTEBOOK_META_FILE: &str = ".notebook.toml";
/// Folder-level metadata file name.
pub const FOLDER_META_FILE: &str = ".folder.toml";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct NotebookMeta {
    name: Option<String>,
    recycle_bin: String,
    attachments: String,
}

impl Default for NotebookMeta {
    fn default() -> Self {
        Self {
            name: None,
            recycle_bin: "_recycle_bin".to_string(),
            attachments: "_attachments".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FolderMeta {
    order: Vec<String>,
    attachments: BTreeMap<String, PathBuf>,
}

#[derive(Debug)]
struct Layout {
    root: PathBuf,
    recycle_bin: String,
    attachments: String,
}

/// Loads folder children from the directories of a notebook.
#[derive(Debug, Clone)]
pub struct FsTreeProvider {
    layout: Arc<Layout>,
}

impl FsTreeProvider {
    /// Creates a provider for the notebook rooted at `root`, reading its
    /// `.notebook.toml` if present.
    pub fn new(root: &Path) -> Result<Self, TreeError> {
        let meta = read_notebook_meta(root)?;
        Ok(Self::with_meta(root, &meta))
    }

    fn with_meta(root: &Path, meta: &NotebookMeta) -> Self {
        Self {
            layout: Arc::new(Layout {
                root: root.to_path_buf(),
                recycle_bin: meta.recycle_bin.clone(),
                attachments: meta.attachments.clone(),
            }),
        }
    }

    /// Builds the node for a directory or document inside the notebook.
    pub fn node_at(&self, path: &Path) -> Result<Node, TreeError> {
        if path.is_dir() {
            let name = dir_name(path);
            let usage = self.usage_of(path);
            return Ok(Node::folder(name, path, Arc::new(self.clone())).with_usage(usage));
        }

        let content_type = ContentType::from_path(path)
            .ok_or_else(|| TreeError::NotADocument { path: path.into() })?;
        if !path.is_file() {
            return Err(TreeError::Io {
                path: path.into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "document not found"),
            });
        }

        let parent = path.parent().unwrap_or(Path::new(""));
        let meta = read_folder_meta(parent)?;
        Ok(self.document_node(parent, path, content_type, &meta))
    }

    fn usage_of(&self, dir: &Path) -> NodeUsage {
        let at_root = dir.parent() == Some(self.layout.root.as_path());
        if at_root && dir.file_name().is_some_and(|n| n == self.layout.recycle_bin.as_str()) {
            NodeUsage::RecycleBin
        } else {
            NodeUsage::Normal
        }
    }

    fn document_node(
        &self,
        dir: &Path,
        path: &Path,
        content_type: ContentType,
        meta: &FolderMeta,
    ) -> Node {
        let node = Node::document(ContentFile::new(path, content_type));
        let file_name = node.name().to_string();

        let declared = meta.attachments.get(&file_name).cloned();
        let attachment_folder = declared.or_else(|| {
            let stem = path.file_stem()?;
            let conventional = Path::new(&self.layout.attachments).join(stem);
            dir.join(&conventional).is_dir().then_some(conventional)
        });

        match attachment_folder {
            Some(folder) => node.with_attachment_folder(folder),
            None => node,
        }
    }
}

impl TreeProvider for FsTreeProvider {
    fn load_children(&self, node: &Node) -> Result<Vec<Node>, TreeError> {
        let dir = node.path();
        let meta = read_folder_meta(dir)?;

        let mut entries: Vec<(String, PathBuf)> = fs::read_dir(dir)
            .map_err(|e| TreeError::Io {
                path: dir.into(),
                source: e,
            })?
            .filter_map(Result::ok)
            .filter_map(|e| {
                let name = e.file_name().to_str()?.to_string();
                Some((name, e.path()))
            })
            .filter(|(name, _)| !name.starts_with('.') && *name != self.layout.attachments)
            .collect();

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        // Listed names come first, in listed order; the rest keep name order.
        entries.sort_by_key(|(name, _)| {
            meta.order
                .iter()
                .position(|listed| listed == name)
                .unwrap_or(usize::MAX)
        });

        let mut children = Vec::with_capacity(entries.len());
        for (_, path) in entries {
            if path.is_dir() {
                let usage = self.usage_of(&path);
                children.push(
                    Node::folder(dir_name(&path), &path, Arc::new(self.clone())).with_usage(usage),
                );
            } else if let Some(content_type) = ContentType::from_path(&path) {
                children.push(self.document_node(dir, &path, content_type, &meta));
            }
        }

        tracing::debug!(dir = %dir.display(), count = children.len(), "loaded folder");
        Ok(children)
    }
}

/// Opens the notebook rooted at `root` and loads its top-level children.
pub fn open_notebook(root: &Path) -> Result<Notebook, TreeError> {
    if !root.is_dir() {
        return Err(TreeError::NotADirectory { path: root.into() });
    }

    let meta = read_notebook_meta(root)?;
    let name = meta.name.clone().unwrap_or_else(|| dir_name(root));
    let provider = FsTreeProvider::with_meta(root, &meta);

    let root_node = Node::folder(name.clone(), root, Arc::new(provider));
    root_node.load()?;
    Ok(Notebook::new(name, root_node))
}

fn read_notebook_meta(root: &Path) -> Result<NotebookMeta, TreeError> {
    read_meta(&root.join(NOTEBOOK_META_FILE))
}

fn read_folder_meta(dir: &Path) -> Result<FolderMeta, TreeError> {
    read_meta(&dir.join(FOLDER_META_FILE))
}

fn read_meta<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> Result<T, TreeError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path).map_err(|e| TreeError::Io {
        path: path.into(),
        source: e,
    })?;
    toml::from_str(&contents).map_err(|e| TreeError::InvalidMetadata {
        path: path.into(),
        message: e.to_string(),
    })
}

fn dir_name(path: &Path) -> String {
    path.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "notebook".to_string())
}
