//! Handler for the `export` command.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::config::{Config, LastExport};
use crate::cli::output::{ExportSummary, Output, OutputFormat};
use crate::cli::ExportArgs;
use crate::domain::{ExportOptions, ExportSource, Node, Notebook};
use crate::export::{
    CancelToken, ExportSink, HtmlRenderer, ItemOutcome, ItemStatus, Selection, TreeExporter,
    get_theme_css,
};
use crate::infra::{FsTreeProvider, open_notebook};

/// Handle the `export` command.
pub fn handle_export(args: &ExportArgs, notebook_dir: &Path, config: &Config) -> Result<()> {
    let root = notebook_dir
        .canonicalize()
        .with_context(|| format!("notebook directory not found: {}", notebook_dir.display()))?;

    let last_export = LastExport::new(&Config::config_dir());
    let defaults = config.export_defaults();
    let remembered = last_export.load(&defaults)?.unwrap_or(defaults);
    let options = apply_args(remembered, args);

    let target = Target::open(&root, args, options.source)?;
    let exporter = TreeExporter::with_renderers(html_renderer(args, config)?);

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        tracing::warn!(error = %e, "cannot install Ctrl-C handler");
    }

    let human = matches!(args.cli_format, OutputFormat::Human);
    let show_progress = human && std::io::stderr().is_terminal();
    let mut sink = ConsoleSink::new(show_progress, human, cancel.clone());
    let result = exporter.export(&options, target.selection(), &mut sink)?;
    sink.finish();

    if !args.no_save {
        last_export.save(&options)?;
    }

    let summary = ExportSummary::new(result, sink.items, cancel.is_cancelled());
    print_summary(args.cli_format, &summary)
}

/// Overlays the explicitly given command-line options on `options`.
pub(crate) fn apply_args(mut options: ExportOptions, args: &ExportArgs) -> ExportOptions {
    options.source = if args.document.is_some() {
        ExportSource::Document
    } else if args.folder.is_some() {
        ExportSource::Folder
    } else {
        ExportSource::Notebook
    };

    if let Some(format) = args.export_format {
        options.format = format;
    }
    if let Some(output) = &args.output {
        options.output_dir = output.clone();
    }

    let flags = [
        (args.recursive, &mut options.recursive),
        (args.attachments, &mut options.export_attachments),
        (args.embed_styles, &mut options.html.embed_styles),
        (args.complete_page, &mut options.html.complete_page),
        (args.embed_images, &mut options.html.embed_images),
        (args.mime_html, &mut options.html.use_mime_html),
        (args.outline, &mut options.html.add_outline_panel),
    ];
    for (arg, field) in flags {
        if let Some(value) = arg {
            *field = value;
        }
    }

    if args.pdf_command.is_some() {
        options.pdf.command = args.pdf_command.clone();
    }
    if args.custom_command.is_some() {
        options.custom.command = args.custom_command.clone();
    }
    if let Some(suffix) = &args.custom_suffix {
        options.custom.target_suffix = suffix.clone();
    }
    options
}

fn html_renderer(args: &ExportArgs, config: &Config) -> Result<HtmlRenderer> {
    let theme = args.theme.as_deref().or(config.theme.as_deref());
    let mut renderer = HtmlRenderer::new().with_theme_css(get_theme_css(theme)?);

    if let Some(path) = args.template.as_ref().or(config.template.as_ref()) {
        let template = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read template: {}", path.display()))?;
        renderer = renderer.with_template(template);
    }
    Ok(renderer)
}

/// The loaded object an export starts from.
enum Target {
    Node(Node),
    Notebook(Notebook),
}

impl Target {
    fn open(root: &Path, args: &ExportArgs, source: ExportSource) -> Result<Self> {
        let selected = match source {
            ExportSource::Document => args.document.as_deref(),
            ExportSource::Folder => args.folder.as_deref(),
            ExportSource::Notebook => None,
        };

        match selected {
            Some(path) => {
                let provider = FsTreeProvider::new(root)?;
                let path = locate(root, path)?;
                Ok(Self::Node(provider.node_at(&path)?))
            }
            None => Ok(Self::Notebook(open_notebook(root)?)),
        }
    }

    /// A selected node fills both slots; the exporter picks the one the
    /// export source asks for.
    fn selection(&self) -> Selection<'_> {
        match self {
            Self::Node(node) => Selection {
                document: Some(node),
                folder: Some(node),
                notebook: None,
            },
            Self::Notebook(notebook) => Selection {
                notebook: Some(notebook),
                ..Selection::default()
            },
        }
    }
}

/// Resolves a selected path against the working directory, then the
/// notebook root.
fn locate(root: &Path, path: &Path) -> Result<PathBuf> {
    let candidate = if path.exists() { path.to_path_buf() } else { root.join(path) };
    candidate
        .canonicalize()
        .with_context(|| format!("not found: {}", path.display()))
}

/// Drives a progress bar and collects per-file outcomes.
///
/// With `echo_logs`, exporter log lines go straight to stderr; otherwise
/// they are only traced, so JSON and path output stay machine-readable.
struct ConsoleSink {
    bar: ProgressBar,
    echo_logs: bool,
    cancel: CancelToken,
    items: Vec<ItemOutcome>,
}

impl ConsoleSink {
    fn new(enabled: bool, echo_logs: bool, cancel: CancelToken) -> Self {
        let bar = if enabled {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };
        Self {
            bar,
            echo_logs,
            cancel,
            items: Vec::new(),
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ExportSink for ConsoleSink {
    fn on_progress(&mut self, done: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
    }

    fn on_log(&mut self, message: &str) {
        if self.echo_logs {
            self.bar.suspend(|| eprintln!("{message}"));
        } else {
            tracing::info!("{message}");
        }
    }

    fn on_item(&mut self, outcome: &ItemOutcome) {
        if let Some(name) = outcome.source.file_name() {
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
        self.items.push(outcome.clone());
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

fn print_summary(format: OutputFormat, summary: &ExportSummary) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for item in &summary.items {
                match &item.status {
                    ItemStatus::Exported { .. } => {}
                    ItemStatus::Skipped { reason } => {
                        eprintln!("  skipped: {} ({reason:?})", item.source.display());
                    }
                    ItemStatus::Failed { reason } => {
                        eprintln!("  error: {}: {reason}", item.source.display());
                    }
                }
            }
            if summary.cancelled {
                println!("Export cancelled.");
            }
            println!("{} file(s) exported", summary.exported);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&Output::new(summary))
                .context("failed to encode export summary")?;
            println!("{json}");
        }
        OutputFormat::Paths => {
            for path in summary.result.paths() {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}
