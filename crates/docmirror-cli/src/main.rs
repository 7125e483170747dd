//! DocMirror CLI - Mirror a WorkDocs folder tree into an S3 bucket
//!
//! Provides commands for:
//! - Running a reconciliation pass (`sync`)
//! - Inspecting and validating configuration (`config`)

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod output;

use commands::{config::ConfigCommand, sync::SyncCommand, ConfigSource};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "docmirror",
    version,
    about = "Mirror a WorkDocs folder tree into an S3 bucket"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile the source tree into the destination bucket
    Sync(SyncCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let source = ConfigSource::resolve(cli.config.clone());
    // Lenient here; each command loads strictly and reports parse errors.
    let logging = source.load().map(|c| c.logging).unwrap_or_default();
    logging::init(cli.verbose, cli.quiet, &logging)?;

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(format, cli.quiet, &source).await,
        Commands::Config(cmd) => cmd.execute(format, cli.quiet, &source).await,
    }
}
