//! Shortcode CLI.
//!
//! Provides commands for:
//! - `scan`: Print the shortcode tree of a document
//! - `check`: Validate shortcode syntax in many documents
//! - `render`: Resolve shortcodes with the built-in handlers

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, RenderArgs, ScanArgs};
use output::Output;

/// Shortcode - scan, check and render shortcodes in text documents.
#[derive(Parser)]
#[command(name = "shortcode", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover shortcode.toml).
    #[arg(short, long, global = true, env = "SHORTCODE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the shortcodes found in a document.
    Scan(ScanArgs),
    /// Check shortcode syntax in one or more documents.
    Check(CheckArgs),
    /// Resolve shortcodes in a document.
    Render(RenderArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Scan(args) => args.execute(&cli.global),
        Commands::Check(args) => args.execute(&cli.global),
        Commands::Render(args) => args.execute(&cli.global),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}
