//! Pipeline configuration, loadable from YAML

use crate::error::{PipelineError, Result};
use crate::sink::WriteMode;
use diary_region_detection::RegionDetectionConfig;
use diary_text_recognition::RecognitionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lifetime of the carried date/location context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextScope {
    /// Cleared at the start of every page
    #[default]
    Page,
    /// Carried across the pages of one document
    Document,
}

/// Where and how results are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `<name>.csv` and `<name>_processed/`
    pub output_dir: PathBuf,
    pub write_mode: WriteMode,
    /// Save an annotated PNG for each processed page
    pub annotate: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            write_mode: WriteMode::Append,
            annotate: false,
        }
    }
}

/// Settings for the region-based page gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Minimum confidence of a `page` region for the page to be processed
    pub min_confidence: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub detection: RegionDetectionConfig,
    pub recognition: RecognitionConfig,
    pub gate: GateConfig,
    pub context_scope: ContextScope,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Parse a YAML document; missing keys take their defaults
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| PipelineError::Config(format!("Failed to parse YAML: {e}")))
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Reject threshold values outside their meaningful range
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f32| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(PipelineError::Config(format!(
                    "{name} must be within 0.0-1.0 (got {value})"
                )))
            }
        };
        unit("detection.confidence_threshold", self.detection.confidence_threshold)?;
        unit("detection.nms_threshold", self.detection.nms_threshold)?;
        unit("gate.min_confidence", self.gate.min_confidence)?;
        if self.detection.input_size == 0 {
            return Err(PipelineError::Config(
                "detection.input_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.detection, RegionDetectionConfig::production());
        assert_eq!(config.context_scope, ContextScope::Page);
        assert_eq!(config.output.write_mode, WriteMode::Append);
        assert_eq!(config.output.output_dir, PathBuf::from("."));
        assert!(!config.output.annotate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config = PipelineConfig::from_yaml_str(
            "detection:\n  confidence_threshold: 0.6\n  nms_threshold: 0.8\n\
             context_scope: document\n\
             output:\n  write_mode: overwrite\n  annotate: true\n",
        )
        .unwrap();

        assert_eq!(config.detection.confidence_threshold, 0.6);
        assert_eq!(config.detection.nms_threshold, 0.8);
        assert_eq!(config.detection.input_size, 640);
        assert_eq!(config.context_scope, ContextScope::Document);
        assert_eq!(config.output.write_mode, WriteMode::Overwrite);
        assert!(config.output.annotate);
        assert_eq!(config.recognition, RecognitionConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let result = PipelineConfig::from_yaml_str("context_scope: weekly\n");
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = PipelineConfig::default();
        config.detection.nms_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.detection.input_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        std::fs::write(&path, "gate:\n  min_confidence: 0.25\n").unwrap();

        let config = PipelineConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.gate.min_confidence, 0.25);

        assert!(matches!(
            PipelineConfig::from_yaml_file(dir.path().join("missing.yaml")),
            Err(PipelineError::Io(_))
        ));
    }
}
