//! tome - export notebooks of Markdown documents to Markdown, HTML, PDF, or
//! custom formats

pub mod cli;
pub mod domain;
pub mod export;
pub mod infra;
pub mod logging;

use anyhow::{Result, anyhow};
use clap::Parser;

use cli::{
    Cli, Command,
    config::Config,
    handlers::{handle_completions, handle_export},
};

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.log_json)
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    let config = Config::load()?;
    let notebook_dir = config.notebook_dir(cli.dir.as_ref());

    match &cli.command {
        Command::Export(args) => handle_export(args, &notebook_dir, &config),
        Command::Completions(args) => handle_completions(args),
    }
}
