//! Batch extraction over PDF files and folders

use super::PipelineArgs;
use crate::pdf::{PdfiumPageSource, DEFAULT_DPI};
use anyhow::{Context as _, Result};
use clap::Args;
use diary_extract_core::{collect_pdf_inputs, BatchRunner, BatchSummary, PageRange};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args)]
pub struct RunCommand {
    /// PDF files or folders of PDF files
    #[arg(value_name = "INPUTS", required = true)]
    pub(crate) inputs: Vec<PathBuf>,

    /// Inclusive 1-based page range, e.g. 2-5
    #[arg(long, value_name = "FIRST-LAST")]
    pub(crate) pages: Option<PageRange>,

    /// Rendering resolution
    #[arg(long, default_value_t = DEFAULT_DPI)]
    pub(crate) dpi: f32,

    /// Print the batch summary as JSON
    #[arg(long)]
    pub(crate) json: bool,

    #[command(flatten)]
    pub(crate) pipeline: PipelineArgs,
}

impl RunCommand {
    pub fn execute(self) -> Result<()> {
        if self.dpi <= 0.0 {
            anyhow::bail!("DPI must be positive (got {})", self.dpi);
        }

        let config = self.pipeline.load_config()?;
        let documents = collect_pdf_inputs(&self.inputs).context("Failed to collect inputs")?;
        if documents.is_empty() {
            anyhow::bail!("No PDF files found in the given inputs");
        }

        info!("=== Diary Extract ===");
        info!("Documents: {}", documents.len());
        info!("Output directory: {}", config.output.output_dir.display());
        if let Some(range) = self.pages {
            info!("Pages: {}", range);
        }

        let pipeline = self.pipeline.build_pipeline(&config)?;
        let source = PdfiumPageSource::new(self.dpi)?;
        let mut runner = BatchRunner::new(pipeline, source, config.output.clone(), config.context_scope)
            .with_page_range(self.pages);

        let summary = runner.run(&documents);

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
            );
        } else {
            print_summary(&summary);
        }

        let stopped = summary.stopped_early().count();
        if stopped == summary.documents.len() {
            anyhow::bail!("All {} documents failed", stopped);
        }
        if stopped > 0 {
            warn!("{} of {} documents stopped early", stopped, summary.documents.len());
        }
        Ok(())
    }
}

fn print_summary(summary: &BatchSummary) {
    println!("Documents:       {}", summary.documents.len());
    println!("Pages processed: {}", summary.pages_processed());
    println!("Pages rejected:  {}", summary.pages_rejected());
    println!("Records written: {}", summary.records_written());

    for report in &summary.documents {
        match &report.error {
            Some(reason) => println!(
                "  {} -> stopped after {} pages: {}",
                report.path.display(),
                report.pages_processed,
                reason
            ),
            None => println!(
                "  {} -> {} ({} records)",
                report.path.display(),
                report.csv_path.display(),
                report.records_written
            ),
        }
    }
}
