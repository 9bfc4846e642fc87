//! Builder for on-disk test notebooks.

// Allow dead code since this is a test utility shared by several test crates
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Builds a notebook directory tree file by file.
///
/// Paths are relative to the notebook root; parent directories are created
/// as needed.
#[derive(Debug)]
pub struct TestNotebook {
    root: PathBuf,
}

impl TestNotebook {
    /// Uses `root` (created if missing) as the notebook directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        fs::create_dir_all(&root).expect("Failed to create notebook root");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a text file (document, media, or metadata).
    pub fn file(self, relative: &str, content: &str) -> Self {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        self
    }

    /// Writes a Markdown document with a heading and `body`.
    pub fn doc(self, relative: &str, body: &str) -> Self {
        let title = Path::new(relative)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.file(relative, &format!("# {title}\n\n{body}\n"))
    }

    /// Creates an empty folder.
    pub fn folder(self, relative: &str) -> Self {
        fs::create_dir_all(self.root.join(relative)).expect("Failed to create folder");
        self
    }

    /// Writes `.notebook.toml`.
    pub fn notebook_meta(self, toml: &str) -> Self {
        self.file(".notebook.toml", toml)
    }

    /// Writes `.folder.toml` inside `folder` ("" for the root).
    pub fn folder_meta(self, folder: &str, toml: &str) -> Self {
        let relative = Path::new(folder).join(".folder.toml");
        self.file(&relative.to_string_lossy(), toml)
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_notebook_writes_nested_documents() {
        let temp = TempDir::new().unwrap();
        let notebook = TestNotebook::at(temp.path().join("nb"))
            .doc("Notes/a.md", "alpha")
            .folder("Empty");

        let content = fs::read_to_string(notebook.path("Notes/a.md")).unwrap();
        assert_eq!(content, "# a\n\nalpha\n");
        assert!(notebook.path("Empty").is_dir());
    }

    #[test]
    fn test_notebook_writes_metadata() {
        let temp = TempDir::new().unwrap();
        let notebook = TestNotebook::at(temp.path())
            .notebook_meta("name = \"Work\"")
            .folder_meta("Notes", "order = [\"b.md\"]");

        assert!(notebook.path(".notebook.toml").is_file());
        assert!(notebook.path("Notes/.folder.toml").is_file());
    }
}
