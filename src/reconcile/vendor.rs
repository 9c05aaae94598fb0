//! Deciding whether a wheel is vendored or referenced by URL.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::wheel::Storage;
use crate::error::GenerateError;
use crate::util::fs::rename_if_not_exists;

/// Final location of a wheel and how the build will get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// File to hash: the vendored copy, or the scratch download.
    pub path: PathBuf,
    pub storage: Storage,
}

/// Vendoring policy for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorPolicy {
    wheel_dir: Option<PathBuf>,
    prefer_remote: bool,
}

impl VendorPolicy {
    /// `wheel_dir` of `None` disables vendoring.
    pub fn new(wheel_dir: Option<PathBuf>, prefer_remote: bool) -> Self {
        VendorPolicy {
            wheel_dir,
            prefer_remote,
        }
    }

    /// Whether a wheel ends up in the wheel directory.
    ///
    /// Wheels without a known URL are always vendored when possible, since
    /// nothing else could reference them.
    pub fn should_vendor(&self, has_link: bool) -> bool {
        self.wheel_dir.is_some() && (!self.prefer_remote || !has_link)
    }

    /// An already vendored copy of `filename` that makes fetching it again
    /// unnecessary.
    pub fn reusable(&self, filename: &str, has_link: bool) -> Option<PathBuf> {
        if !self.should_vendor(has_link) {
            return None;
        }
        let path = self.wheel_dir.as_ref()?.join(filename);
        path.is_file().then_some(path)
    }

    /// Apply the policy to a wheel sitting in the scratch directory.
    ///
    /// A vendored wheel is moved into the wheel directory unless a file of
    /// that name is already there, in which case the existing file is kept
    /// byte for byte and becomes the artifact.
    pub fn place(&self, scratch_file: &Path, has_link: bool) -> Result<Placement> {
        let filename = scratch_file
            .file_name()
            .with_context(|| format!("not a file: {}", scratch_file.display()))?;

        match &self.wheel_dir {
            Some(dir) if self.should_vendor(has_link) => {
                let dest = dir.join(filename);
                if rename_if_not_exists(scratch_file, &dest)? {
                    tracing::debug!("vendored {}", dest.display());
                } else {
                    tracing::debug!("keeping existing {}", dest.display());
                }
                Ok(Placement {
                    path: dest.clone(),
                    storage: Storage::Vendored { path: dest },
                })
            }
            _ if has_link => Ok(Placement {
                path: scratch_file.to_path_buf(),
                storage: Storage::Remote,
            }),
            _ => Err(GenerateError::NoWheelSource(filename.to_string_lossy().into_owned()).into()),
        }
    }
}
