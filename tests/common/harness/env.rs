//! Isolated test environment with temp directory.

// Allow dead code since this is a test utility shared by several test crates
#![allow(dead_code)]

use super::{TestNotebook, TomeCommand};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment.
///
/// Holds a notebook directory, an output directory, and a private config
/// directory under one temp directory that is removed on drop.
pub struct TestEnv {
    /// The temporary directory (kept for lifetime management)
    _temp_dir: TempDir,
    notebook_dir: PathBuf,
    output_dir: PathBuf,
    config_dir: PathBuf,
}

impl TestEnv {
    /// Creates a new isolated test environment with an empty notebook.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let notebook_dir = temp_dir.path().join("notebook");
        let output_dir = temp_dir.path().join("out");
        let config_dir = temp_dir.path().join("config");
        std::fs::create_dir_all(&notebook_dir).expect("Failed to create notebook directory");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config directory");
        Self {
            _temp_dir: temp_dir,
            notebook_dir,
            output_dir,
            config_dir,
        }
    }

    pub fn notebook_dir(&self) -> &Path {
        &self.notebook_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns a builder that writes into the notebook directory.
    pub fn notebook(&self) -> TestNotebook {
        TestNotebook::at(&self.notebook_dir)
    }

    /// Path of an exported file, relative to the output directory.
    pub fn output(&self, relative: &str) -> PathBuf {
        self.output_dir.join(relative)
    }

    /// Writes the config file.
    pub fn write_config(&self, toml: &str) -> PathBuf {
        let path = self.config_dir.join("config.toml");
        std::fs::write(&path, toml).expect("Failed to write config");
        path
    }

    /// Path where the last export settings are remembered.
    pub fn last_export_path(&self) -> PathBuf {
        self.config_dir.join("last_export.toml")
    }

    /// Creates a TomeCommand configured for this test environment.
    pub fn cmd(&self) -> TomeCommand {
        TomeCommand::new()
            .config_dir(&self.config_dir)
            .dir(&self.notebook_dir)
    }

    /// An `export` command writing into the output directory.
    pub fn export(&self) -> TomeCommand {
        self.cmd().export().output(&self.output_dir)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // Phase 1: TestEnv Foundation
    // ===========================================

    #[test]
    fn test_env_creates_directories() {
        let env = TestEnv::new();
        assert!(env.notebook_dir().is_dir());
        assert!(env.config_dir().is_dir());
        assert!(!env.output_dir().exists(), "output is created by the export");
    }

    #[test]
    fn test_env_cleanup_on_drop() {
        let path = {
            let env = TestEnv::new();
            env.notebook_dir().to_path_buf()
        };
        assert!(!path.exists(), "temp directory should be cleaned up on drop");
    }

    #[test]
    fn test_env_provides_command() {
        let env = TestEnv::new();
        let cmd = env.cmd();
        let args = cmd.get_args();
        assert_eq!(args[0], "--dir");
        assert_eq!(args[1], env.notebook_dir().to_string_lossy());
    }
}
