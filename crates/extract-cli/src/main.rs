//! Diary Extract CLI
//!
//! Turns scanned diary PDFs into one CSV of activity rows per document.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;
mod pdf;

use commands::page::ImageCommand;
use commands::run::RunCommand;

#[derive(Parser)]
#[command(
    name = "diary-extract",
    version,
    about = "Extract diary table rows from scanned PDFs into CSV",
    after_help = "EXAMPLES:\n  \
                  # Every PDF in a folder, one CSV per document\n  \
                  diary-extract run --detector-model model/diarytable_model.onnx scans/\n\n  \
                  # Pages 2-5 only, fresh CSV, annotated pages\n  \
                  diary-extract run --detector-model model.onnx --pages 2-5 --overwrite --annotate week1.pdf\n\n  \
                  # One rendered page\n  \
                  diary-extract image --detector-model model.onnx --diary week1.pdf page_3.png"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process PDF files and folders
    Run(RunCommand),

    /// Process a single page image
    Image(ImageCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Run(cmd) => cmd.execute(),
        Commands::Image(cmd) => cmd.execute(),
    }
}
