//! Single page bitmap extraction

use super::PipelineArgs;
use anyhow::{Context as _, Result};
use clap::Args;
use diary_extract_core::{CsvSink, PageContext};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Args)]
pub struct ImageCommand {
    /// Rendered diary page (PNG, JPEG, ...)
    #[arg(value_name = "IMAGE")]
    pub(crate) input: PathBuf,

    /// Diary identifier written to the Filename column [default: image file name]
    #[arg(long)]
    pub(crate) diary: Option<String>,

    /// Print the extracted records as JSON
    #[arg(long)]
    pub(crate) json: bool,

    #[command(flatten)]
    pub(crate) pipeline: PipelineArgs,
}

impl ImageCommand {
    pub fn execute(self) -> Result<()> {
        if !self.input.exists() {
            anyhow::bail!("Input image does not exist: {}", self.input.display());
        }

        let config = self.pipeline.load_config()?;
        let diary_id = match &self.diary {
            Some(id) => id.clone(),
            None => file_name(&self.input),
        };
        let stem = Path::new(&diary_id)
            .file_stem()
            .map_or_else(|| diary_id.clone(), |s| s.to_string_lossy().into_owned());

        let page = image::open(&self.input)
            .with_context(|| format!("Failed to open image: {}", self.input.display()))?
            .to_rgb8();

        let mut pipeline = self.pipeline.build_pipeline(&config)?;
        let csv_path = config.output.output_dir.join(format!("{stem}.csv"));
        let mut sink = CsvSink::open(&csv_path, config.output.write_mode)?;
        let mut context = PageContext::default();

        let extraction = pipeline.process_page(&page, &diary_id, &mut context, &mut sink)?;
        if !extraction.accepted {
            warn!("{} is not a diary page", self.input.display());
            return Ok(());
        }
        info!("{} records written to {}", extraction.records.len(), csv_path.display());

        if let Some(annotated) = &extraction.annotated {
            let dir = config.output.output_dir.join(format!("{stem}_processed"));
            fs::create_dir_all(&dir)?;
            let path = dir.join("page_1.png");
            annotated
                .save(&path)
                .with_context(|| format!("Failed to save {}", path.display()))?;
            info!("Annotated page saved to {}", path.display());
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&extraction.records)?);
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
