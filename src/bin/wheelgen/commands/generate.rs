//! `wheelgen generate` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::GenerateArgs;
use wheelgen::ops::{generate, Collaborators, GenerateOptions};
use wheelgen::sources::{HttpDownloader, PipResolver, WheelToolInspector};
use wheelgen::util::config::{Config, GenerateConfig, CONFIG_FILE_NAME};

/// Settings given on the command line, as a config layer.
fn cli_overrides(args: &GenerateArgs) -> Config {
    Config {
        generate: GenerateConfig {
            output_file: args.output_file.clone(),
            wheel_dir: args.wheel_dir.as_ref().map(PathBuf::from),
            prefer_remote: args.prefer_remote,
            workspace_prefix: args.workspace_prefix.clone(),
            rules_workspace: args.rules_workspace.clone(),
            flavor: args.flavor.clone(),
            python: args.python.clone(),
            wheel_tool: args.wheel_tool.clone(),
            jobs: args.jobs,
        },
    }
}

pub fn execute(args: GenerateArgs, verbose: bool) -> Result<()> {
    // Load configuration (file, then command line on top)
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_if_exists(&args.output_dir.join(CONFIG_FILE_NAME))?,
    };
    config.merge(cli_overrides(&args));

    let mut options = GenerateOptions::new(&args.requirements, &args.output_dir);
    options.apply_config(&config.generate)?;
    options.delete_unused_wheels = args.delete_unused_wheels;
    options.command_line = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");

    options.validate()?;
    options.validate_python()?;

    let resolver = PipResolver::new(&options.python, verbose);
    let inspector = WheelToolInspector::new(&options.python, &options.wheel_tool);
    let downloader = HttpDownloader::new()?;

    let report = generate(
        &options,
        &Collaborators {
            resolver: &resolver,
            inspector: &inspector,
            downloader: &downloader,
        },
    )?;

    println!(
        "Wrote {} ({} packages, {} wheels)",
        report.output_path.display(),
        report.packages,
        report.wheels
    );
    if !report.warnings.is_empty() {
        println!("{} warnings, see above", report.warnings.len());
    }
    for path in &report.pruned {
        println!("Deleted unused wheel: {}", path.display());
    }

    Ok(())
}
