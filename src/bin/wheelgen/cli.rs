//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// wheelgen - Bazel rules for Python wheels
#[derive(Parser)]
#[command(name = "wheelgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (includes pip's log)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve requirements and write the rules file
    Generate(GenerateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Path to requirements.txt
    #[arg(long, value_name = "PATH")]
    pub requirements: PathBuf,

    /// Directory where the generated file is placed
    #[arg(long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// File name of the generated .bzl file [default: pypi_rules.bzl]
    #[arg(long, value_name = "NAME")]
    pub output_file: Option<String>,

    /// Directory to vendor wheels into, relative to --output-dir; empty disables
    /// vendoring [default: wheels]
    #[arg(long, value_name = "DIR")]
    pub wheel_dir: Option<String>,

    /// Reference wheels by their index URL when one is known [default: true]
    #[arg(long, value_name = "BOOL")]
    pub prefer_remote: Option<bool>,

    /// Prefix for generated repository rule names [default: pypi_]
    #[arg(long, value_name = "PREFIX")]
    pub workspace_prefix: Option<String>,

    /// Workspace containing the Python rules [default: @rules_pyz]
    #[arg(long, value_name = "WORKSPACE")]
    pub rules_workspace: Option<String>,

    /// Type of library rules to generate: pyz or pex [default: pyz]
    #[arg(long, value_name = "FLAVOR")]
    pub flavor: Option<String>,

    /// Python interpreter used to run pip and the wheel tool [default: python]
    #[arg(long, env = "WHEELGEN_PYTHON", value_name = "PATH")]
    pub python: Option<PathBuf>,

    /// Script printing a wheel's requirements as JSON [default: ./wheeltool.py]
    #[arg(long, value_name = "PATH")]
    pub wheel_tool: Option<PathBuf>,

    /// Number of wheels processed in parallel [default: 4]
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Delete wheels in the wheel directory that are no longer used
    #[arg(long)]
    pub delete_unused_wheels: bool,

    /// Config file [default: <output-dir>/wheelgen.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,

    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
