//! Removing vendored wheels nothing refers to anymore.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::dependency::PackageDependency;
use crate::core::wheel::Storage;
use crate::util::fs::glob_files;

/// Delete wheels in `wheel_dir` that no vendored artifact of `dependencies`
/// uses. Returns the deleted paths, sorted.
///
/// Only `*.whl` files are considered; anything else in the directory is
/// left alone.
pub fn prune_unused_wheels(
    dependencies: &[PackageDependency],
    wheel_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let in_use: BTreeSet<_> = dependencies
        .iter()
        .flat_map(PackageDependency::artifacts)
        .filter_map(|artifact| match artifact.storage() {
            Storage::Vendored { path } => path.file_name().map(|name| name.to_os_string()),
            Storage::Remote => None,
        })
        .collect();

    let mut deleted = Vec::new();
    for path in glob_files(wheel_dir, "*.whl")? {
        let used = path
            .file_name()
            .is_some_and(|name| in_use.contains(name));
        if used {
            continue;
        }

        tracing::info!("Deleting unused wheel: {}", path.display());
        std::fs::remove_file(&path)
            .with_context(|| format!("failed to delete {}", path.display()))?;
        deleted.push(path);
    }

    Ok(deleted)
}
