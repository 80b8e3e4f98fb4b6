//! Sb2Scrub CLI
//!
//! Command-line interface for sanitizing Scratch 2 project archives.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sb2scrub_core::{
    classify, inspect_bytes, validate_file, ReconstructionReport, StageChildKind, ValidateConfig,
    PROJECT_ENTRY,
};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "sb2scrub")]
#[command(about = "Sanitizing rewriter for Scratch 2 project archives")]
#[command(version)]
struct Cli {
    /// Name of the document entry inside the archive
    #[arg(long, global = true, default_value = PROJECT_ENTRY)]
    entry: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite archives with sanitized project documents
    Validate {
        /// Archive files to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Reconstruct an archive's document in memory and print a summary
    Inspect {
        /// Archive file to inspect
        file: PathBuf,

        /// Print the reconstructed document instead of the summary
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sb2scrub=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = ValidateConfig {
        entry_name: cli.entry,
    };

    match cli.command {
        Commands::Validate { files } => cmd_validate(files, &config),
        Commands::Inspect { file, json } => cmd_inspect(file, json, &config),
    }
}

/// Validate each archive in turn. The first hard failure aborts the run.
fn cmd_validate(files: Vec<PathBuf>, config: &ValidateConfig) -> Result<()> {
    for file in files {
        let outcome = validate_file(&file, config)
            .with_context(|| format!("failed to validate {}", file.display()))?;

        println!("{} -> {}", file.display(), outcome.output.display());
        print_report(&outcome.report);
    }

    Ok(())
}

/// Reconstruct without writing, then summarize what a rewrite would keep.
fn cmd_inspect(file: PathBuf, json: bool, config: &ValidateConfig) -> Result<()> {
    let bytes =
        std::fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;

    let reconstruction = inspect_bytes(&bytes, config)
        .with_context(|| format!("failed to inspect {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reconstruction.document)?);
        return Ok(());
    }

    println!("{}", file.display());
    print_report(&reconstruction.report);

    if let Some(children) = reconstruction.document.get("children").and_then(Value::as_array) {
        for child in children {
            let (kind, name) = match classify(child) {
                StageChildKind::Sprite => ("sprite", child.get("objName")),
                StageChildKind::Watcher => ("watcher", child.get("cmd")),
                StageChildKind::ListWatcher => ("list", child.get("listName")),
                StageChildKind::Unknown => ("unknown", None),
            };
            let name = name.and_then(Value::as_str).unwrap_or("?");
            println!("    {kind:<8} {name}");
        }
    }

    Ok(())
}

fn print_report(report: &ReconstructionReport) {
    println!("  sprites:       {}", report.sprites);
    println!("  watchers:      {}", report.watchers);
    println!("  list watchers: {}", report.list_watchers);
    println!("  variables:     {}", report.variables);
    if report.dropped_children > 0 {
        println!("  dropped:       {} unknown child(ren)", report.dropped_children);
    }
}
