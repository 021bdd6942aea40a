//! docxt CLI - docx template engine.
//!
//! Provides commands for:
//! - `render`: Fill an extracted package with parameters
//! - `placeholders`: List placeholders present in a package
//! - `plaintext`: Print the text of a package

mod commands;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{PlaceholdersArgs, PlaintextArgs, RenderArgs};
use output::Output;

/// docxt - docx template engine.
#[derive(Parser)]
#[command(name = "docxt", version, about)]
struct Cli {
    /// Path to configuration file (default: auto-discover docxt.toml).
    #[arg(short, long, global = true, env = "DOCXT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output (show skipped placeholders and images).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply parameters to a package and write the result.
    Render(RenderArgs),
    /// List placeholders present in a package.
    Placeholders(PlaceholdersArgs),
    /// Print the text of a package, optionally after applying parameters.
    Plaintext(PlaintextArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Render(args) => args.execute(config),
        Commands::Placeholders(args) => args.execute(config),
        Commands::Plaintext(args) => args.execute(config),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
