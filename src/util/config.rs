//! Configuration file support.
//!
//! Settings that rarely change between runs can live in a `wheelgen.toml`
//! next to the generated rules (or anywhere, via `--config`):
//!
//! ```toml
//! [generate]
//! wheel_dir = "wheels"
//! prefer_remote = false
//! flavor = "pex"
//! ```
//!
//! Command line flags take precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default config file name, looked up in the output directory.
pub const CONFIG_FILE_NAME: &str = "wheelgen.toml";

/// wheelgen configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation settings
    pub generate: GenerateConfig,
}

/// Settings for `wheelgen generate`. Every field is optional; unset fields
/// fall back to command line defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// File name of the generated .bzl file
    pub output_file: Option<String>,

    /// Wheel directory, relative to the output directory; empty disables vendoring
    pub wheel_dir: Option<PathBuf>,

    /// Reference wheels by URL when one is known instead of vendoring them
    pub prefer_remote: Option<bool>,

    /// Prefix for generated repository rule names
    pub workspace_prefix: Option<String>,

    /// Bazel workspace holding the Python rules
    pub rules_workspace: Option<String>,

    /// Library rule flavor (pyz or pex)
    pub flavor: Option<String>,

    /// Python interpreter used for pip and the wheel tool
    pub python: Option<PathBuf>,

    /// Script printing a wheel's requirements as JSON
    pub wheel_tool: Option<PathBuf>,

    /// Number of wheels processed in parallel
    pub jobs: Option<usize>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, falling back to defaults if the file doesn't exist.
    ///
    /// A file that exists but fails to parse is an error: silently ignoring
    /// it would change the generated rules.
    pub fn load_if_exists(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no config file at {}", path.display());
            Ok(Self::default())
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let ours = &mut self.generate;
        let theirs = other.generate;

        if theirs.output_file.is_some() {
            ours.output_file = theirs.output_file;
        }
        if theirs.wheel_dir.is_some() {
            ours.wheel_dir = theirs.wheel_dir;
        }
        if theirs.prefer_remote.is_some() {
            ours.prefer_remote = theirs.prefer_remote;
        }
        if theirs.workspace_prefix.is_some() {
            ours.workspace_prefix = theirs.workspace_prefix;
        }
        if theirs.rules_workspace.is_some() {
            ours.rules_workspace = theirs.rules_workspace;
        }
        if theirs.flavor.is_some() {
            ours.flavor = theirs.flavor;
        }
        if theirs.python.is_some() {
            ours.python = theirs.python;
        }
        if theirs.wheel_tool.is_some() {
            ours.wheel_tool = theirs.wheel_tool;
        }
        if theirs.jobs.is_some() {
            ours.jobs = theirs.jobs;
        }
    }
}
