//! Output format types for CLI commands.

use clap::ValueEnum;
use serde::Serialize;

use crate::export::{ExportResult, ItemOutcome, ItemStatus};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
    /// Plain file paths, one per line
    Paths,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Summary of one `export` run.
#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub exported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub result: ExportResult,
    pub items: Vec<ItemOutcome>,
}

impl ExportSummary {
    pub fn new(result: ExportResult, items: Vec<ItemOutcome>, cancelled: bool) -> Self {
        let count = |pred: fn(&ItemStatus) -> bool| items.iter().filter(|i| pred(&i.status)).count();
        let skipped = count(|s| matches!(s, ItemStatus::Skipped { .. }));
        let failed = count(|s| matches!(s, ItemStatus::Failed { .. }));
        Self {
            exported: result.count(),
            skipped,
            failed,
            cancelled,
            result,
            items,
        }
    }
}
