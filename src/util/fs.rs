//! Filesystem utilities.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{glob, Pattern};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Move `src` to `dst` unless `dst` already exists.
///
/// An existing destination is left untouched and `Ok(false)` is returned.
/// When a plain rename is impossible (different file systems) the file is
/// copied into a temporary file beside `dst` and persisted without
/// clobbering, so a concurrent writer can never be overwritten either.
pub fn rename_if_not_exists(src: &Path, dst: &Path) -> Result<bool> {
    if dst.try_exists().with_context(|| format!("failed to stat {}", dst.display()))? {
        return Ok(false);
    }

    if fs::rename(src, dst).is_ok() {
        return Ok(true);
    }

    let parent = dst.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    let mut source =
        fs::File::open(src).with_context(|| format!("failed to open {}", src.display()))?;
    io::copy(&mut source, staged.as_file_mut())
        .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;

    match staged.persist_noclobber(dst) {
        Ok(_) => {
            // The scratch copy is no longer needed; a failure here is harmless.
            let _ = fs::remove_file(src);
            Ok(true)
        }
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error).with_context(|| format!("failed to persist {}", dst.display())),
    }
}

/// Write `contents` to `path` atomically.
///
/// The data goes to a temporary file in the same directory first; the real
/// path is only replaced once the write has fully succeeded.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    staged
        .write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    staged
        .persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// Regular files directly inside `dir`, sorted by file name.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to read directory: {}", dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Files matching `pattern` relative to `base`, sorted.
///
/// Only `pattern` is interpreted; `base` is matched literally even when it
/// contains glob metacharacters.
pub fn glob_files(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = Path::new(&Pattern::escape(&base.to_string_lossy())).join(pattern);
    let pattern_str = full_pattern.to_string_lossy();

    let mut results = Vec::new();
    for entry in glob(&pattern_str).with_context(|| format!("invalid glob pattern: {}", pattern))? {
        match entry {
            Ok(path) if path.is_file() => results.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("glob error: {}", e),
        }
    }

    results.sort();
    Ok(results)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a path with forward slashes, as Bazel labels expect.
pub fn to_label_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
