//! CLI command definitions and handlers

pub mod config;
pub mod handlers;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::domain::ExportFormat;
use output::OutputFormat;

/// tome - export notebooks of Markdown documents
#[derive(Parser, Debug)]
#[command(name = "tome", version, about, long_about = None)]
pub struct Cli {
    /// Notebook directory (overrides config file)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export a document, a folder, or the whole notebook
    Export(ExportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `export` command
///
/// Options left out fall back to the last export's settings, then to the
/// config file.
#[derive(Parser, Debug, Default)]
pub struct ExportArgs {
    /// Export a single document (path to its file)
    #[arg(long, conflicts_with = "folder")]
    pub document: Option<PathBuf>,

    /// Export a folder of the notebook (whole notebook if neither is given)
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// Export format
    #[arg(short = 'F', long = "format", value_enum)]
    pub export_format: Option<ExportFormat>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Descend into sub-folders of an exported folder
    #[arg(short, long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub recursive: Option<bool>,

    /// Copy attachment folders along with Markdown documents
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub attachments: Option<bool>,

    /// HTML: inline the stylesheet
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub embed_styles: Option<bool>,

    /// HTML: carry local images along with the page
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub complete_page: Option<bool>,

    /// HTML: inline images as data URIs (with --complete-page)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub embed_images: Option<bool>,

    /// HTML: write a single MIME-HTML (.mht) archive
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub mime_html: Option<bool>,

    /// HTML: add a navigation panel listing the headings
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub outline: Option<bool>,

    /// PDF command line; %1 is the HTML input, %2 the PDF output
    #[arg(long)]
    pub pdf_command: Option<String>,

    /// Custom command line; %1 is the source file, %2 the output file
    #[arg(long)]
    pub custom_command: Option<String>,

    /// Suffix of files produced by the custom command (e.g. ".docx")
    #[arg(long)]
    pub custom_suffix: Option<String>,

    /// CSS theme for HTML (default, dark, or path to a CSS file)
    #[arg(long)]
    pub theme: Option<String>,

    /// Custom page template file for HTML
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Do not remember these options for the next export
    #[arg(long)]
    pub no_save: bool,

    /// CLI output format (for status messages, not export content)
    #[arg(long = "cli-format", value_enum, default_value_t = OutputFormat::Human)]
    pub cli_format: OutputFormat,
}

/// Arguments for the `completions` command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish)
    #[arg(value_enum)]
    pub shell: Shell,
}
