//! Library-level tests for `TreeExporter`.
//!
//! Trees are built in memory with `Node::loaded_folder` over real files in a
//! temp directory, so traversal order and usage flags are exact.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;

use tome::domain::{
    ContentFile, ContentType, ExportFormat, ExportOptions, ExportSource, Node, NodeUsage, Notebook,
};
use tome::export::{
    CancelToken, CollectingSink, ExportError, ExportResult, ExportSink, ItemOutcome, ItemStatus,
    RenderError, RenderRequest, Renderer, Selection, SkipReason, TreeExporter,
};

// ===========================================
// Fixtures
// ===========================================

struct Fixture {
    _temp: TempDir,
    src: PathBuf,
    out: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("nb");
        let out = temp.path().join("out");
        fs::create_dir_all(&src).unwrap();
        Self {
            _temp: temp,
            src,
            out,
        }
    }

    fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.src.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn doc(&self, relative: &str) -> Node {
        let path = self.write(relative, &format!("# {relative}\n"));
        let content_type = ContentType::from_path(&path).unwrap();
        Node::document(ContentFile::new(path, content_type))
    }

    fn folder(&self, relative: &str, children: Vec<Node>) -> Node {
        let path = self.src.join(relative);
        fs::create_dir_all(&path).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        Node::loaded_folder(name, path, children)
    }

    fn options(&self, source: ExportSource, format: ExportFormat) -> ExportOptions {
        ExportOptions {
            source,
            format,
            output_dir: self.out.clone(),
            ..ExportOptions::default()
        }
    }
}

fn folder_selection(node: &Node) -> Selection<'_> {
    Selection {
        folder: Some(node),
        ..Selection::default()
    }
}

fn tree_paths(result: ExportResult) -> Vec<PathBuf> {
    match result {
        ExportResult::Tree(paths) => paths,
        ExportResult::Document(_) => panic!("expected a tree result"),
    }
}

/// Writes a marker file instead of converting.
struct StubRenderer {
    calls: Mutex<Vec<PathBuf>>,
}

impl StubRenderer {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl Renderer for StubRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> Result<PathBuf, RenderError> {
        self.calls.lock().unwrap().push(request.source.to_path_buf());
        fs::write(request.destination, "stub").map_err(|source| RenderError::Write {
            path: request.destination.to_path_buf(),
            source,
        })?;
        Ok(request.destination.to_path_buf())
    }
}

/// Cancels once a given number of files were handled.
struct CancelAfter {
    inner: CollectingSink,
    token: CancelToken,
    after: usize,
}

impl ExportSink for CancelAfter {
    fn on_progress(&mut self, done: usize, total: usize) {
        self.inner.on_progress(done, total);
    }

    fn on_log(&mut self, message: &str) {
        self.inner.on_log(message);
    }

    fn on_item(&mut self, outcome: &ItemOutcome) {
        self.inner.on_item(outcome);
        if self.inner.items.len() >= self.after {
            self.token.cancel();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

// ===========================================
// Folder export
// ===========================================

mod folder_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_folder_mirrors_tree_with_progress_per_level() {
        let fx = Fixture::new();
        let sub = fx.folder("Notes/Sub", vec![fx.doc("Notes/Sub/b.md")]);
        let notes = fx.folder("Notes", vec![fx.doc("Notes/a.md"), sub]);
        let options = fx.options(ExportSource::Folder, ExportFormat::Markdown);
        let mut sink = CollectingSink::new();

        let result = TreeExporter::new()
            .export(&options, folder_selection(&notes), &mut sink)
            .unwrap();

        assert_eq!(
            tree_paths(result),
            vec![
                fx.out.join("Notes/a/a.md"),
                fx.out.join("Notes/Sub/b/b.md"),
            ]
        );
        assert!(fx.out.join("Notes/Sub/b/b.md").is_file());
        assert_eq!(sink.progress, vec![(0, 2), (1, 2), (0, 1), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_progress_totals_count_all_children() {
        let fx = Fixture::new();
        let notes = fx.folder(
            "Notes",
            vec![fx.doc("Notes/a.md"), fx.folder("Notes/Empty", vec![]), fx.doc("Notes/c.txt")],
        );
        let options = fx.options(ExportSource::Folder, ExportFormat::Markdown);
        let mut sink = CollectingSink::new();

        TreeExporter::new()
            .export(&options, folder_selection(&notes), &mut sink)
            .unwrap();

        let top: Vec<_> = sink.progress.iter().filter(|(_, t)| *t == 3).collect();
        assert_eq!(top, vec![&(0, 3), &(1, 3), &(2, 3), &(3, 3)]);
    }

    #[test]
    fn test_non_recursive_folder_skips_subfolders() {
        let fx = Fixture::new();
        let sub = fx.folder("Notes/Sub", vec![fx.doc("Notes/Sub/b.md")]);
        let notes = fx.folder("Notes", vec![fx.doc("Notes/a.md"), sub]);
        let mut options = fx.options(ExportSource::Folder, ExportFormat::Markdown);
        options.recursive = false;
        let mut sink = CollectingSink::new();

        let result = TreeExporter::new()
            .export(&options, folder_selection(&notes), &mut sink)
            .unwrap();

        assert_eq!(tree_paths(result), vec![fx.out.join("Notes/a/a.md")]);
        assert!(!fx.out.join("Notes/Sub").exists());
        assert_eq!(sink.progress, vec![(0, 2), (1, 2), (2, 2)]);
    }

    #[test]
    fn test_recycle_bin_is_never_descended() {
        let fx = Fixture::new();
        let bin = fx
            .folder("Notes/_recycle_bin", vec![fx.doc("Notes/_recycle_bin/old.md")])
            .with_usage(NodeUsage::RecycleBin);
        let notes = fx.folder("Notes", vec![fx.doc("Notes/a.md"), bin]);
        let options = fx.options(ExportSource::Folder, ExportFormat::Markdown);
        let mut sink = CollectingSink::new();

        let result = TreeExporter::new()
            .export(&options, folder_selection(&notes), &mut sink)
            .unwrap();

        assert_eq!(tree_paths(result).len(), 1);
        assert!(!fx.out.join("Notes/_recycle_bin").exists());
    }

    #[test]
    fn test_output_folder_collision_gets_sequence_number() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.out.join("Notes")).unwrap();
        let notes = fx.folder("Notes", vec![fx.doc("Notes/a.md")]);
        let options = fx.options(ExportSource::Folder, ExportFormat::Markdown);

        let result = TreeExporter::new()
            .export(&options, folder_selection(&notes), &mut CollectingSink::new())
            .unwrap();

        assert_eq!(tree_paths(result), vec![fx.out.join("Notes_001/a/a.md")]);
    }

    #[test]
    fn test_folder_source_rejects_document() {
        let fx = Fixture::new();
        let doc = fx.doc("a.md");
        let options = fx.options(ExportSource::Folder, ExportFormat::Markdown);

        let err = TreeExporter::new()
            .export(&options, folder_selection(&doc), &mut CollectingSink::new())
            .unwrap_err();

        assert!(matches!(err, ExportError::NotAFolder(name) if name == "a.md"));
    }

    #[test]
    fn test_missing_selection_is_an_error() {
        let fx = Fixture::new();
        let options = fx.options(ExportSource::Notebook, ExportFormat::Markdown);

        let err = TreeExporter::new()
            .export(&options, Selection::default(), &mut CollectingSink::new())
            .unwrap_err();

        assert_eq!(err.to_string(), "no notebook selected for export");
    }
}

// ===========================================
// Document export and format gating
// ===========================================

mod document_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_lands_in_own_folder() {
        let fx = Fixture::new();
        let doc = fx.doc("Notes/a.md");
        let options = fx.options(ExportSource::Document, ExportFormat::Markdown);
        let mut sink = CollectingSink::new();

        let result = TreeExporter::new().export_document(&options, &doc, &mut sink);

        let output = fx.out.join("a/a.md");
        assert_eq!(result, Some(output.clone()));
        assert_eq!(fs::read_to_string(output).unwrap(), "# Notes/a.md\n");
        assert!(sink.logs[0].starts_with("File ("));
        assert!(sink.items[0].is_exported());
    }

    #[test]
    fn test_document_without_content_is_skipped() {
        let fx = Fixture::new();
        let folder = fx.folder("Notes", vec![]);
        let options = fx.options(ExportSource::Document, ExportFormat::Markdown);
        let mut sink = CollectingSink::new();

        let result = TreeExporter::new().export_document(&options, &folder, &mut sink);

        assert_eq!(result, None);
        assert_eq!(sink.logs, vec!["Skipped document (Notes) without file base."]);
        assert!(matches!(
            sink.items[0].status,
            ItemStatus::Skipped {
                reason: SkipReason::NoContentFile
            }
        ));
    }

    #[test]
    fn test_text_document_is_not_converted() {
        let fx = Fixture::new();
        let doc = fx.doc("todo.txt");
        let options = fx.options(ExportSource::Document, ExportFormat::Html);
        let mut sink = CollectingSink::new();

        let result = TreeExporter::default().export_document(&options, &doc, &mut sink);

        assert_eq!(result, None);
        assert_eq!(
            sink.logs,
            vec![
                "Format Text is not supported to export as HTML.".to_string(),
                format!("Failed to export file ({})", fx.src.join("todo.txt").display()),
            ]
        );
        assert!(!fx.out.join("todo.html").exists());
        assert!(!fx.out.join("todo").exists());
    }

    #[test]
    fn test_text_document_markdown_export_is_refused() {
        let fx = Fixture::new();
        let doc = fx.doc("todo.txt");
        let options = fx.options(ExportSource::Document, ExportFormat::Markdown);
        let mut sink = CollectingSink::new();

        let result = TreeExporter::new().export_document(&options, &doc, &mut sink);

        assert_eq!(result, None);
        assert_eq!(
            sink.logs,
            vec![
                "Format Text is not supported to export as Markdown.".to_string(),
                format!("Failed to export file ({})", fx.src.join("todo.txt").display()),
            ]
        );
        assert!(matches!(
            sink.items[0].status,
            ItemStatus::Skipped {
                reason: SkipReason::UnsupportedContentType
            }
        ));
        assert!(!fx.out.join("todo").exists());
        assert!(!fx.out.join("todo.txt").exists());
    }

    #[test]
    fn test_text_file_in_folder_is_skipped_for_markdown() {
        let fx = Fixture::new();
        let notes = fx.folder("Notes", vec![fx.doc("Notes/a.md"), fx.doc("Notes/c.txt")]);
        let options = fx.options(ExportSource::Folder, ExportFormat::Markdown);
        let mut sink = CollectingSink::new();

        let result = TreeExporter::new()
            .export(&options, folder_selection(&notes), &mut sink)
            .unwrap();

        assert_eq!(tree_paths(result), vec![fx.out.join("Notes/a/a.md")]);
        assert!(!fx.out.join("Notes/c").exists());
        assert!(sink.items[0].is_exported());
        assert!(matches!(
            sink.items[1].status,
            ItemStatus::Skipped {
                reason: SkipReason::UnsupportedContentType
            }
        ));
    }

    #[test]
    fn test_unregistered_format_fails_before_content_check() {
        let fx = Fixture::new();
        let doc = fx.doc("todo.txt");
        let options = fx.options(ExportSource::Document, ExportFormat::Pdf);
        let mut sink = CollectingSink::new();

        TreeExporter::new().export_document(&options, &doc, &mut sink);

        assert_eq!(sink.logs[0], "Unknown target format PDF.");
        assert!(matches!(sink.items[0].status, ItemStatus::Failed { .. }));
    }

    #[test]
    fn test_second_export_does_not_overwrite() {
        let fx = Fixture::new();
        let doc = fx.doc("a.md");
        let options = fx.options(ExportSource::Document, ExportFormat::Markdown);
        let exporter = TreeExporter::new();

        let first = exporter.export_document(&options, &doc, &mut CollectingSink::new());
        let second = exporter.export_document(&options, &doc, &mut CollectingSink::new());

        assert_eq!(first, Some(fx.out.join("a/a.md")));
        assert_eq!(second, Some(fx.out.join("a_001/a.md")));
    }

    #[test]
    fn test_markdown_copies_referenced_media() {
        let fx = Fixture::new();
        let path = fx.write("Notes/a.md", "# A\n\n![shot](img/shot.png)\n");
        fx.write("Notes/img/shot.png", "png");
        let doc = Node::document(ContentFile::new(path, ContentType::Markdown));
        let options = fx.options(ExportSource::Document, ExportFormat::Markdown);

        TreeExporter::new().export_document(&options, &doc, &mut CollectingSink::new());

        assert!(fx.out.join("a/img/shot.png").is_file());
    }

    #[test]
    fn test_renderer_gets_suffixed_destination() {
        let fx = Fixture::new();
        let doc = fx.doc("a.md");
        let mut options = fx.options(ExportSource::Document, ExportFormat::Custom);
        options.custom.target_suffix = ".docx".into();

        let exporter = TreeExporter::new().with_renderer(ExportFormat::Custom, StubRenderer::new());
        let result = exporter.export_document(&options, &doc, &mut CollectingSink::new());

        assert_eq!(result, Some(fx.out.join("a.docx")));
        assert_eq!(fs::read_to_string(fx.out.join("a.docx")).unwrap(), "stub");
    }

    #[test]
    fn test_html_export_writes_page() {
        let fx = Fixture::new();
        let path = fx.write("a.md", "# Hello\n\nSome *text*.\n");
        let doc = Node::document(ContentFile::new(path, ContentType::Markdown));
        let options = fx.options(ExportSource::Document, ExportFormat::Html);

        let result = TreeExporter::default().export_document(&options, &doc, &mut CollectingSink::new());

        let html = fs::read_to_string(result.unwrap()).unwrap();
        assert!(html.contains("<em>text</em>"));
        assert!(html.contains(r##"href="#hello""##));
    }
}

// ===========================================
// Attachments
// ===========================================

mod attachment_tests {
    use super::*;

    #[test]
    fn test_attachments_keep_relative_position() {
        let fx = Fixture::new();
        fx.write("Notes/_attachments/a/report.pdf", "pdf");
        let doc = fx.doc("Notes/a.md").with_attachment_folder("_attachments/a");
        let options = fx.options(ExportSource::Document, ExportFormat::Markdown);

        TreeExporter::new().export_document(&options, &doc, &mut CollectingSink::new());

        assert!(fx.out.join("a/_attachments/a/report.pdf").is_file());
    }

    #[test]
    fn test_media_inside_attachment_folder_shares_it() {
        let fx = Fixture::new();
        let path = fx.write("Notes/a.md", "# A\n\n![scan](_attachments/a/scan.png)\n");
        fx.write("Notes/_attachments/a/scan.png", "png");
        fx.write("Notes/_attachments/a/report.pdf", "pdf");
        let doc = Node::document(ContentFile::new(path, ContentType::Markdown))
            .with_attachment_folder("_attachments/a");
        let options = fx.options(ExportSource::Document, ExportFormat::Markdown);

        TreeExporter::new().export_document(&options, &doc, &mut CollectingSink::new());

        assert!(fx.out.join("a/_attachments/a/scan.png").is_file());
        assert!(fx.out.join("a/_attachments/a/report.pdf").is_file());
        assert!(!fx.out.join("a/_attachments/a_001").exists());
    }

    #[test]
    fn test_attachments_disabled() {
        let fx = Fixture::new();
        fx.write("Notes/_attachments/a/report.pdf", "pdf");
        let doc = fx.doc("Notes/a.md").with_attachment_folder("_attachments/a");
        let mut options = fx.options(ExportSource::Document, ExportFormat::Markdown);
        options.export_attachments = false;

        TreeExporter::new().export_document(&options, &doc, &mut CollectingSink::new());

        assert!(fx.out.join("a/a.md").is_file());
        assert!(!fx.out.join("a/_attachments").exists());
    }

    #[test]
    fn test_attachments_outside_document_folder_use_folder_name() {
        let fx = Fixture::new();
        fx.write("Shared/files/data.csv", "1,2");
        let doc = fx.doc("Notes/a.md").with_attachment_folder("../Shared/files");
        let options = fx.options(ExportSource::Document, ExportFormat::Markdown);

        TreeExporter::new().export_document(&options, &doc, &mut CollectingSink::new());

        assert!(fx.out.join("a/files/data.csv").is_file());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_attachment_folder_colliding_ignoring_case_is_renamed() {
        let fx = Fixture::new();
        fx.write("Notes/A.MD/scan.png", "png");
        let doc = fx.doc("Notes/a.md").with_attachment_folder("A.MD");
        let options = fx.options(ExportSource::Document, ExportFormat::Markdown);

        TreeExporter::new().export_document(&options, &doc, &mut CollectingSink::new());

        assert!(fx.out.join("a/a.md").is_file());
        assert!(fx.out.join("a/A.MD_001/scan.png").is_file());
    }
}

// ===========================================
// Notebook export and cancellation
// ===========================================

mod notebook_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn notebook(fx: &Fixture) -> Notebook {
        let deep = fx.folder("Projects/Deep", vec![fx.doc("Projects/Deep/d.md")]);
        let projects = fx.folder("Projects", vec![fx.doc("Projects/p.md"), deep]);
        let bin = fx
            .folder("_recycle_bin", vec![fx.doc("_recycle_bin/x.md")])
            .with_usage(NodeUsage::RecycleBin);
        let root = Node::loaded_folder("Work", &fx.src, vec![fx.doc("top.md"), projects, bin]);
        Notebook::new("Work", root)
    }

    #[test]
    fn test_notebook_exports_into_named_folder() {
        let fx = Fixture::new();
        let notebook = notebook(&fx);
        let options = fx.options(ExportSource::Notebook, ExportFormat::Markdown);
        let selection = Selection {
            notebook: Some(&notebook),
            ..Selection::default()
        };

        let paths = tree_paths(
            TreeExporter::new()
                .export(&options, selection, &mut CollectingSink::new())
                .unwrap(),
        );

        let base = fx.out.join("notebook_Work");
        assert_eq!(
            paths,
            vec![
                base.join("top/top.md"),
                base.join("Projects/p/p.md"),
                base.join("Projects/Deep/d/d.md"),
            ]
        );
        assert!(!base.join("_recycle_bin").exists());
    }

    #[test]
    fn test_notebook_descends_top_level_even_when_not_recursive() {
        let fx = Fixture::new();
        let notebook = notebook(&fx);
        let mut options = fx.options(ExportSource::Notebook, ExportFormat::Markdown);
        options.recursive = false;

        let paths = TreeExporter::new().export_notebook(&options, &notebook, &mut CollectingSink::new());

        let base = fx.out.join("notebook_Work");
        assert_eq!(paths, vec![base.join("top/top.md"), base.join("Projects/p/p.md")]);
    }

    #[test]
    fn test_cancellation_returns_partial_result() {
        let fx = Fixture::new();
        let notes = fx.folder(
            "Notes",
            vec![fx.doc("Notes/a.md"), fx.doc("Notes/b.md"), fx.doc("Notes/c.md")],
        );
        let options = fx.options(ExportSource::Folder, ExportFormat::Markdown);
        let mut sink = CancelAfter {
            inner: CollectingSink::new(),
            token: CancelToken::new(),
            after: 1,
        };

        let result = TreeExporter::new()
            .export(&options, folder_selection(&notes), &mut sink)
            .unwrap();

        assert_eq!(tree_paths(result), vec![fx.out.join("Notes/a/a.md")]);
        assert!(!fx.out.join("Notes/b").exists());
        assert_eq!(sink.inner.logs.last().map(String::as_str), Some("Export cancelled."));
        assert_eq!(sink.inner.progress, vec![(0, 3), (1, 3)]);
    }

    #[test]
    fn test_cancelled_before_start_exports_nothing() {
        let fx = Fixture::new();
        let token = CancelToken::new();
        token.cancel();
        let mut sink = CollectingSink::new().with_cancel(token);
        let notebook = notebook(&fx);
        let options = fx.options(ExportSource::Notebook, ExportFormat::Markdown);

        let paths = TreeExporter::new().export_notebook(&options, &notebook, &mut sink);

        assert!(paths.is_empty());
        assert_eq!(sink.logs, vec!["Export cancelled."]);
    }
}

#[test]
fn test_exported_paths_are_absolute_under_output() {
    let fx = Fixture::new();
    let notes = fx.folder("Notes", vec![fx.doc("Notes/a.md")]);
    let options = fx.options(ExportSource::Folder, ExportFormat::Markdown);

    let paths = TreeExporter::new().export_folder(&options, &notes, &mut CollectingSink::new());

    assert!(paths.iter().all(|p| p.starts_with(&fx.out) && Path::new(p).is_file()));
}
