//! Observer interface for progress, log lines, and cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::outcome::ItemOutcome;

/// Receives events from a running export.
///
/// Events arrive synchronously, in traversal order, on the exporting thread.
pub trait ExportSink {
    /// `done` of `total` children of the current folder level are handled.
    fn on_progress(&mut self, done: usize, total: usize);

    /// A human-readable log line.
    fn on_log(&mut self, message: &str);

    fn on_item(&mut self, _outcome: &ItemOutcome) {}

    /// Polled before each child and before each file conversion.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared cancellation flag.
///
/// Clones observe the same flag, so one can be handed to a signal handler
/// while the sink polls another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Records every event. Used by tests and for JSON output.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub progress: Vec<(usize, usize)>,
    pub logs: Vec<String>,
    pub items: Vec<ItemOutcome>,
    cancel: Option<CancelToken>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl ExportSink for CollectingSink {
    fn on_progress(&mut self, done: usize, total: usize) {
        self.progress.push((done, total));
    }

    fn on_log(&mut self, message: &str) {
        self.logs.push(message.to_string());
    }

    fn on_item(&mut self, outcome: &ItemOutcome) {
        self.items.push(outcome.clone());
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// Forwards log lines to `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink {
    cancel: Option<CancelToken>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl ExportSink for TracingSink {
    fn on_progress(&mut self, done: usize, total: usize) {
        tracing::trace!(done, total, "progress");
    }

    fn on_log(&mut self, message: &str) {
        tracing::info!("{message}");
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}
