//! Filesystem helpers for export: directory creation, copies, relative
//! paths, and collision-avoiding names.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors during file system operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("destination already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl FsError {
    /// Creates an appropriate FsError from an io::Error.
    pub(crate) fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path: path.into() },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path: path.into() },
            _ => FsError::Io {
                path: path.into(),
                source: error,
            },
        }
    }
}

/// How name collisions are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    /// Defer to the host filesystem's own existence check.
    Sensitive,
    /// Treat `Notes` and `notes` as the same name.
    Insensitive,
}

/// Creates a directory and all of its missing parents.
pub fn ensure_dir(path: &Path) -> Result<(), FsError> {
    if path.is_file() {
        return Err(FsError::NotADirectory { path: path.into() });
    }
    fs::create_dir_all(path).map_err(|e| FsError::from_io(path, e))
}

/// Copies a single file, creating the destination's parent directory.
///
/// With `overwrite` unset, an existing destination is an error instead of
/// being replaced.
pub fn copy_file(src: &Path, dest: &Path, overwrite: bool) -> Result<u64, FsError> {
    if !overwrite && dest.exists() {
        return Err(FsError::AlreadyExists { path: dest.into() });
    }
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    fs::copy(src, dest).map_err(|e| FsError::from_io(src, e))
}

/// Recursively copies a directory tree, overwriting files that exist.
///
/// Returns the number of files copied.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<usize, FsError> {
    if !src.is_dir() {
        return Err(FsError::NotADirectory { path: src.into() });
    }
    ensure_dir(dest)?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
            FsError::from_io(&path, source)
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| FsError::NotFound {
                path: entry.path().into(),
            })?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if entry.file_type().is_file() {
            copy_file(entry.path(), &target, true)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Computes `target` relative to `base`, lexically.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use tome::infra::relative_path;
///
/// assert_eq!(
///     relative_path(Path::new("/nb/notes"), Path::new("/nb/notes/_attachments/a")),
///     PathBuf::from("_attachments/a")
/// );
/// assert_eq!(
///     relative_path(Path::new("/nb/notes"), Path::new("/nb/media")),
///     PathBuf::from("../media")
/// );
/// ```
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base: Vec<Component> = base.components().filter(|c| *c != Component::CurDir).collect();
    let target: Vec<Component> = target
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base.len() {
        result.push("..");
    }
    for component in &target[common..] {
        result.push(component.as_os_str());
    }
    result
}

/// Picks a name for `base` + `suffix` that is unused in `dir`.
///
/// The plain name is used when free; otherwise a zero-padded sequence is
/// appended to the base: `notes`, `notes_001`, `notes_002`, ... The suffix
/// (e.g. `.html`, or empty) always stays last.
///
/// # Examples
///
/// ```
/// use tome::infra::{unique_name, CaseSensitivity};
///
/// let dir = tempfile::tempdir().unwrap();
/// assert_eq!(unique_name(dir.path(), "page", ".html", CaseSensitivity::Sensitive), "page.html");
///
/// std::fs::write(dir.path().join("page.html"), "").unwrap();
/// assert_eq!(unique_name(dir.path(), "page", ".html", CaseSensitivity::Sensitive), "page_001.html");
/// ```
pub fn unique_name(dir: &Path, base: &str, suffix: &str, case: CaseSensitivity) -> String {
    let existing = match case {
        CaseSensitivity::Sensitive => None,
        CaseSensitivity::Insensitive => Some(lowercase_entries(dir)),
    };
    let taken = |name: &str| match &existing {
        Some(entries) => entries.contains(&name.to_lowercase()),
        None => dir.join(name).exists(),
    };

    let plain = format!("{base}{suffix}");
    if !taken(&plain) {
        return plain;
    }

    let mut seq: u32 = 1;
    loop {
        let candidate = format!("{base}_{seq:03}{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        seq += 1;
    }
}

/// Returns `path` itself, or a sibling with a sequence number appended when
/// any entry in the parent directory matches its name ignoring case.
///
/// The whole final component is the base, so dotted directory names keep
/// their dots together: `v1.2` becomes `v1.2_001`.
pub fn rename_if_exists_case_insensitive(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    parent.join(unique_name(parent, &name, "", CaseSensitivity::Insensitive))
}

fn lowercase_entries(dir: &Path) -> HashSet<String> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().to_lowercase())
                .collect()
        })
        .unwrap_or_default()
}
