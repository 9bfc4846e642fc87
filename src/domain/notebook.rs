//! A notebook: a named document tree.

use super::Node;

/// A named notebook rooted at a container node.
#[derive(Debug)]
pub struct Notebook {
    name: String,
    root: Node,
}

impl Notebook {
    /// Creates a notebook from its root container.
    ///
    /// # Panics
    ///
    /// Panics if `root` is not a container.
    pub fn new(name: impl Into<String>, root: Node) -> Self {
        assert!(root.is_container(), "notebook root must be a container");
        Self {
            name: name.into(),
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}
