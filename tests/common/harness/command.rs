//! Fluent wrapper around assert_cmd::Command.

// Allow dead code since this is a test utility with methods for future tests
#![allow(dead_code)]

use assert_cmd::Command;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Fluent wrapper around `assert_cmd::Command` for the `tome` binary.
///
/// Provides a builder-style API for constructing and executing CLI commands.
pub struct TomeCommand {
    args: Vec<String>,
    config_dir: Option<PathBuf>,
}

impl TomeCommand {
    /// Creates a new command for the `tome` binary.
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            config_dir: None,
        }
    }

    /// Points `TOME_CONFIG_DIR` at `path` so runs never touch the user's
    /// configuration.
    pub fn config_dir(mut self, path: &Path) -> Self {
        self.config_dir = Some(path.to_path_buf());
        self
    }

    /// Sets the `--dir` option to specify the notebook directory.
    pub fn dir(mut self, path: &Path) -> Self {
        self.args.push("--dir".to_string());
        self.args.push(path.to_string_lossy().to_string());
        self
    }

    /// Adds arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Returns the current arguments (for testing).
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Runs the command and returns an Assert for making assertions.
    #[allow(deprecated)]
    pub fn assert(self) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("tome").expect("Failed to find tome binary");
        cmd.env_remove("TOME_LOG").env_remove("RUST_LOG");
        if let Some(dir) = &self.config_dir {
            cmd.env("TOME_CONFIG_DIR", dir);
        }
        cmd.args(&self.args);
        cmd.assert()
    }

    /// Runs the command, expects success, and returns stdout as a string.
    pub fn output_success(self) -> String {
        let output = self.assert().success().get_output().stdout.clone();
        String::from_utf8(output).expect("Output was not valid UTF-8")
    }

    /// Runs the command, expects success, and parses stdout as JSON.
    pub fn output_json<T: DeserializeOwned>(self) -> T {
        let output = self.output_success();
        serde_json::from_str(&output).expect("Failed to parse output as JSON")
    }

    // ===========================================
    // Command Shortcuts
    // ===========================================

    /// Configures for the `export` command.
    pub fn export(self) -> Self {
        self.args(["export"])
    }

    /// Adds `--output <dir>`.
    pub fn output(self, dir: &Path) -> Self {
        self.args(["--output".to_string(), dir.to_string_lossy().to_string()])
    }

    /// Adds `--format <format>` (export format).
    pub fn to(self, format: &str) -> Self {
        self.args(["--format", format])
    }

    /// Adds `--folder <path>`.
    pub fn folder(self, path: &str) -> Self {
        self.args(["--folder", path])
    }

    /// Adds `--document <path>`.
    pub fn document(self, path: &str) -> Self {
        self.args(["--document", path])
    }

    // ===========================================
    // Format Options
    // ===========================================

    /// Adds `--cli-format json` to the command.
    pub fn format_json(self) -> Self {
        self.args(["--cli-format", "json"])
    }

    /// Adds `--cli-format paths` to the command.
    pub fn format_paths(self) -> Self {
        self.args(["--cli-format", "paths"])
    }
}

impl Default for TomeCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ===========================================
    // Phase 5: TomeCommand Basics
    // ===========================================

    #[test]
    fn test_command_runs_binary() {
        TomeCommand::new().args(["--help"]).assert().success();
    }

    #[test]
    fn test_command_with_dir() {
        let temp = TempDir::new().unwrap();
        let cmd = TomeCommand::new().dir(temp.path());
        let args = cmd.get_args();
        assert_eq!(args[0], "--dir");
        assert_eq!(args[1], temp.path().to_string_lossy());
    }

    #[test]
    fn test_command_shortcuts() {
        let cmd = TomeCommand::new().export().to("html").format_json();
        let args = cmd.get_args();
        assert!(args.contains(&"export".to_string()));
        assert!(args.contains(&"html".to_string()));
        assert!(args.contains(&"--cli-format".to_string()));
    }
}
