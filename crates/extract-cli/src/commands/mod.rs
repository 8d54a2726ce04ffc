//! Subcommands and the pipeline options they share

pub mod page;
pub mod run;

use anyhow::{Context as _, Result};
use clap::Args;
use diary_extract_core::{AcceptAllPages, DiaryPipeline, PageGate, PipelineConfig, RegionPageGate, WriteMode};
use diary_region_detection::{RegionDetectionConfig, YoloRegionDetector};
use diary_text_recognition::TesseractRecognizer;
use std::path::PathBuf;
use tracing::info;

/// Pipeline with the production detector and recognizer
pub type CliPipeline = DiaryPipeline<YoloRegionDetector, TesseractRecognizer, Box<dyn PageGate>>;

/// Options common to every extraction command; flags override the config file
#[derive(Args)]
pub struct PipelineArgs {
    /// Diary table detection model (ONNX)
    #[arg(long, value_name = "ONNX")]
    detector_model: PathBuf,

    /// Pipeline configuration file (YAML)
    #[arg(long, value_name = "YAML")]
    config: Option<PathBuf>,

    /// Directory for CSV files and annotated pages
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Truncate existing CSV files instead of appending
    #[arg(long)]
    overwrite: bool,

    /// Save annotated page images
    #[arg(long)]
    annotate: bool,

    /// Use the strict detection thresholds (0.6 confidence, 0.8 overlap)
    #[arg(long)]
    strict: bool,

    /// Only process pages on which this model finds a page region (ONNX)
    #[arg(long, value_name = "ONNX")]
    gate_model: Option<PathBuf>,
}

impl PipelineArgs {
    /// Load the config file (or defaults) and apply flag overrides
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if self.strict {
            let strict = RegionDetectionConfig::strict();
            config.detection.confidence_threshold = strict.confidence_threshold;
            config.detection.nms_threshold = strict.nms_threshold;
        }
        if let Some(dir) = &self.output_dir {
            config.output.output_dir = dir.clone();
        }
        if self.overwrite {
            config.output.write_mode = WriteMode::Overwrite;
        }
        if self.annotate {
            config.output.annotate = true;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Load the models named on the command line
    pub fn build_pipeline(&self, config: &PipelineConfig) -> Result<CliPipeline> {
        if !self.detector_model.exists() {
            anyhow::bail!("Detector model does not exist: {}", self.detector_model.display());
        }

        let detector = YoloRegionDetector::new(&self.detector_model, config.detection.clone())
            .context("Failed to load detector model")?;
        let recognizer =
            TesseractRecognizer::new(config.recognition.clone()).context("Failed to initialize Tesseract")?;

        let gate: Box<dyn PageGate> = match &self.gate_model {
            Some(path) => {
                info!("Page gate: {} (min confidence {})", path.display(), config.gate.min_confidence);
                let gate_detector = YoloRegionDetector::new(path, config.detection.clone())
                    .context("Failed to load page gate model")?;
                Box::new(RegionPageGate::new(gate_detector, config.gate.min_confidence))
            }
            None => Box::new(AcceptAllPages),
        };

        Ok(DiaryPipeline::new(detector, recognizer, gate).with_annotation(config.output.annotate))
    }
}
