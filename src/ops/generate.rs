//! Implementation of `wheelgen generate`.
//!
//! The pipeline: resolve requirements with pip into a private scratch
//! directory, reconcile every wheel found there (in parallel), aggregate
//! the results per package, render the rules and replace the output file.
//! Nothing in the output directory changes before rendering succeeds,
//! except wheels moved into the wheel directory.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::core::dependency::aggregate;
use crate::core::platform::PlatformClassifier;
use crate::emit::{emit, EmitOptions, RuleFlavor, UNZIP_PACKAGES};
use crate::error::GenerateError;
use crate::ops::prune::prune_unused_wheels;
use crate::reconcile::{Reconciled, Reconciler, VendorPolicy, Warning};
use crate::sources::{CachingInspector, Downloader, MetadataInspector, Resolver};
use crate::util::config::GenerateConfig;
use crate::util::fs::{list_files, write_atomic};
use crate::util::process::find_executable;

pub const DEFAULT_OUTPUT_FILE: &str = "pypi_rules.bzl";
pub const DEFAULT_WHEEL_DIR: &str = "wheels";
pub const DEFAULT_WORKSPACE_PREFIX: &str = "pypi_";
pub const DEFAULT_RULES_WORKSPACE: &str = "@rules_pyz";
pub const DEFAULT_WHEEL_TOOL: &str = "./wheeltool.py";
pub const DEFAULT_PYTHON: &str = "python";
pub const DEFAULT_JOBS: usize = 4;

/// Options for the generate command.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// pip requirements file
    pub requirements: PathBuf,

    /// Directory receiving the generated file
    pub output_dir: PathBuf,

    /// File name of the generated file
    pub output_file: String,

    /// Wheel directory relative to `output_dir`; `None` disables vendoring
    pub wheel_dir: Option<PathBuf>,

    /// Reference wheels by URL when one is known
    pub prefer_remote: bool,

    /// Prefix for wheel rule names
    pub workspace_prefix: String,

    /// Workspace providing the library rules
    pub rules_workspace: String,

    pub flavor: RuleFlavor,

    /// Interpreter running pip and the wheel tool
    pub python: PathBuf,

    /// Script printing wheel metadata as JSON
    pub wheel_tool: PathBuf,

    /// Number of wheels reconciled in parallel
    pub jobs: usize,

    /// Delete vendored wheels the new rules no longer use
    pub delete_unused_wheels: bool,

    /// Arguments recorded in the generated file's header
    pub command_line: String,
}

impl GenerateOptions {
    /// Options with every setting at its default.
    pub fn new(requirements: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        GenerateOptions {
            requirements: requirements.into(),
            output_dir: output_dir.into(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            wheel_dir: Some(PathBuf::from(DEFAULT_WHEEL_DIR)),
            prefer_remote: true,
            workspace_prefix: DEFAULT_WORKSPACE_PREFIX.to_string(),
            rules_workspace: DEFAULT_RULES_WORKSPACE.to_string(),
            flavor: RuleFlavor::default(),
            python: PathBuf::from(DEFAULT_PYTHON),
            wheel_tool: PathBuf::from(DEFAULT_WHEEL_TOOL),
            jobs: DEFAULT_JOBS,
            delete_unused_wheels: false,
            command_line: String::new(),
        }
    }

    /// Override defaults with every setting present in `config`.
    ///
    /// An empty wheel directory disables vendoring.
    pub fn apply_config(&mut self, config: &GenerateConfig) -> Result<(), GenerateError> {
        if let Some(output_file) = &config.output_file {
            self.output_file = output_file.clone();
        }
        if let Some(wheel_dir) = &config.wheel_dir {
            self.wheel_dir = (!wheel_dir.as_os_str().is_empty()).then(|| wheel_dir.clone());
        }
        if let Some(prefer_remote) = config.prefer_remote {
            self.prefer_remote = prefer_remote;
        }
        if let Some(prefix) = &config.workspace_prefix {
            self.workspace_prefix = prefix.clone();
        }
        if let Some(workspace) = &config.rules_workspace {
            self.rules_workspace = workspace.clone();
        }
        if let Some(flavor) = &config.flavor {
            self.flavor = flavor.parse()?;
        }
        if let Some(python) = &config.python {
            self.python = python.clone();
        }
        if let Some(wheel_tool) = &config.wheel_tool {
            self.wheel_tool = wheel_tool.clone();
        }
        if let Some(jobs) = config.jobs {
            self.jobs = jobs;
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }

    /// Wheel directory joined onto the output directory.
    pub fn full_wheel_dir(&self) -> Option<PathBuf> {
        self.wheel_dir.as_ref().map(|dir| self.output_dir.join(dir))
    }

    /// Check everything that can be checked before running pip.
    pub fn validate(&self) -> Result<(), GenerateError> {
        if !self.requirements.is_file() {
            return Err(GenerateError::config(format!(
                "requirements file not found: {}",
                self.requirements.display()
            )));
        }
        if !self.output_dir.is_dir() {
            return Err(GenerateError::config(format!(
                "output directory does not exist: {}",
                self.output_dir.display()
            )));
        }
        if self.output_file.is_empty() || self.output_file.contains(['/', '\\']) {
            return Err(GenerateError::config(format!(
                "output file must be a plain file name, got `{}`",
                self.output_file
            )));
        }

        match self.full_wheel_dir() {
            Some(dir) if !dir.exists() => {
                return Err(GenerateError::config(format!(
                    "wheel directory does not exist: {}",
                    dir.display()
                )));
            }
            Some(dir) if !dir.is_dir() => {
                return Err(GenerateError::config(format!(
                    "wheel directory is not a directory: {}",
                    dir.display()
                )));
            }
            None if !self.prefer_remote => {
                return Err(GenerateError::config(
                    "vendoring wheels requires a wheel directory",
                ));
            }
            _ => {}
        }

        if self.jobs == 0 {
            return Err(GenerateError::config("jobs must be at least 1"));
        }
        Ok(())
    }

    /// Check that the Python interpreter can be found.
    pub fn validate_python(&self) -> Result<(), GenerateError> {
        if find_executable(&self.python).is_none() {
            return Err(GenerateError::config(format!(
                "python interpreter not found: {}",
                self.python.display()
            )));
        }
        Ok(())
    }

    fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            flavor: self.flavor,
            workspace_prefix: self.workspace_prefix.clone(),
            rules_workspace: self.rules_workspace.clone(),
            output_dir: self.output_dir.clone(),
            command_line: self.command_line.clone(),
            unzip_packages: UNZIP_PACKAGES,
        }
    }
}

/// The external tools a run talks to.
pub struct Collaborators<'a> {
    pub resolver: &'a dyn Resolver,
    pub inspector: &'a dyn MetadataInspector,
    pub downloader: &'a dyn Downloader,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub output_path: PathBuf,
    /// Number of packages with library targets
    pub packages: usize,
    /// Number of wheel artifacts referenced
    pub wheels: usize,
    pub warnings: Vec<Warning>,
    /// Wheels deleted from the wheel directory
    pub pruned: Vec<PathBuf>,
}

fn is_wheel(path: &Path) -> bool {
    path.extension() == Some(OsStr::new("whl"))
}

/// Run the whole generation pipeline.
pub fn generate(options: &GenerateOptions, collaborators: &Collaborators<'_>) -> Result<GenerateReport> {
    options.validate()?;

    let scratch = tempfile::Builder::new()
        .prefix("wheelgen-")
        .tempdir()
        .context("failed to create scratch directory")?;

    let links = collaborators
        .resolver
        .resolve(&options.requirements, scratch.path())?;
    let wheels: Vec<PathBuf> = list_files(scratch.path())?
        .into_iter()
        .filter(|path| is_wheel(path))
        .collect();
    tracing::info!("Reconciling {} wheels", wheels.len());

    let policy = VendorPolicy::new(options.full_wheel_dir(), options.prefer_remote);
    let inspector = CachingInspector::new(collaborators.inspector);
    let reconciler = Reconciler::new(
        PlatformClassifier::default(),
        &links,
        &policy,
        collaborators.downloader,
        &inspector,
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs)
        .build()
        .context("failed to build thread pool")?;

    let start = Instant::now();
    let reconciled: Vec<Reconciled> = pool.install(|| {
        wheels
            .par_iter()
            .map(|wheel| reconciler.reconcile(wheel, scratch.path()))
            .collect::<Result<Vec<_>>>()
    })?;
    tracing::debug!("reconciled in {:.2?}", start.elapsed());

    let mut warnings = Vec::new();
    let groups: Vec<_> = reconciled
        .into_iter()
        .map(|r| {
            warnings.extend(r.warnings);
            (r.package, r.artifacts)
        })
        .collect();
    let aggregation = aggregate(groups);
    warnings.extend(aggregation.warnings.iter().cloned());

    let contents = emit(
        &aggregation.dependencies,
        &aggregation.installed,
        &options.emit_options(),
    );
    let output_path = options.output_path();
    write_atomic(&output_path, &contents)?;
    tracing::info!("Wrote {}", output_path.display());

    let pruned = match options.full_wheel_dir() {
        Some(dir) if options.delete_unused_wheels => {
            prune_unused_wheels(&aggregation.dependencies, &dir)?
        }
        _ => Vec::new(),
    };

    Ok(GenerateReport {
        output_path,
        packages: aggregation.dependencies.len(),
        wheels: aggregation
            .dependencies
            .iter()
            .map(|dep| dep.artifacts().len())
            .sum(),
        warnings,
        pruned,
    })
}
