//! Command handlers for the CLI.

mod completions;
mod export;

pub use completions::handle_completions;
pub use export::handle_export;
