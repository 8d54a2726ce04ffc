use diary_region_detection::RegionDetectionError;
use diary_text_recognition::RecognitionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning diary pages into records
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Region detection failed: {0}")]
    Detection(#[from] RegionDetectionError),

    #[error("Text recognition failed: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("Failed to open document {path}: {reason}")]
    DocumentOpen { path: PathBuf, reason: String },

    #[error("Failed to render page {page}: {reason}")]
    PageRender { page: u32, reason: String },

    #[error("Page range {first}-{last} exceeds document length {count}")]
    PageRange { first: u32, last: u32, count: u32 },

    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

