//! Configuration file support and remembered export settings.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::ExportOptions;

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "TOME_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";
const LAST_EXPORT_FILE: &str = "last_export.toml";

/// Application configuration loaded from config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default notebook directory
    pub dir: Option<PathBuf>,

    /// Default export output directory
    pub output_dir: Option<PathBuf>,

    /// Default PDF command line (`%1` input HTML, `%2` output PDF)
    pub pdf_command: Option<String>,

    /// Default custom command line (`%1` source, `%2` output)
    pub custom_command: Option<String>,

    /// Suffix of files produced by the custom command
    pub custom_suffix: Option<String>,

    /// HTML theme: "default", "dark", or a path to a CSS file
    pub theme: Option<String>,

    /// Path to a custom HTML page template
    pub template: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_dir().join(CONFIG_FILE))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))
    }

    /// Returns the configuration directory.
    ///
    /// `$TOME_CONFIG_DIR` if set, otherwise `~/.config/tome`.
    pub fn config_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return PathBuf::from(dir);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tome")
    }

    /// Resolve the notebook directory, with CLI argument taking precedence.
    ///
    /// Precedence order:
    /// 1. CLI `--dir` argument
    /// 2. Config file `dir` setting
    /// 3. Current working directory
    pub fn notebook_dir(&self, cli_dir: Option<&PathBuf>) -> PathBuf {
        cli_dir
            .cloned()
            .or_else(|| self.dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Built-in defaults overlaid with the config file's settings.
    pub fn export_defaults(&self) -> ExportOptions {
        let mut options = ExportOptions {
            output_dir: self.output_dir.clone().unwrap_or_else(default_output_dir),
            ..ExportOptions::default()
        };
        options.pdf.command = self.pdf_command.clone();
        options.custom.command = self.custom_command.clone();
        if let Some(suffix) = &self.custom_suffix {
            options.custom.target_suffix = suffix.clone();
        }
        options
    }
}

/// `<Documents>/tome_exports`, falling back to the home directory.
pub fn default_output_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tome_exports")
}

/// Export options remembered between runs.
#[derive(Debug)]
pub struct LastExport {
    path: PathBuf,
}

impl LastExport {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(LAST_EXPORT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the remembered options, or `None` if none were saved.
    ///
    /// Settings missing from the file take their values from `defaults`.
    pub fn load(&self, defaults: &ExportOptions) -> Result<Option<ExportOptions>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let saved: toml::Table = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;

        let mut merged = toml::Table::try_from(defaults).context("failed to encode export defaults")?;
        merge_tables(&mut merged, saved);
        let options: ExportOptions = merged
            .try_into()
            .with_context(|| format!("invalid export settings in {}", self.path.display()))?;
        Ok(Some(options))
    }

    pub fn save(&self, options: &ExportOptions) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string(options).context("failed to encode export settings")?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
