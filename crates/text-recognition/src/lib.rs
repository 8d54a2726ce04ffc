//! Text recognition contract and backends for diary page regions
//!
//! A recognizer receives one cropped sub-image and returns the text it finds
//! as lines of word entries, each with a quadrilateral in crop coordinates,
//! the recognized text and a confidence score. Backends may return empty
//! lines or partial entries; consumers skip those.
//!
//! # Example
//! ```no_run
//! use diary_text_recognition::{RecognitionConfig, TesseractRecognizer, TextRecognizer};
//! use image::RgbImage;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut recognizer = TesseractRecognizer::new(RecognitionConfig::default())?;
//!
//! let crop = RgbImage::new(200, 40);
//! for line in recognizer.recognize(&crop)? {
//!     for (_, text) in line.iter().filter_map(|word| word.complete()) {
//!         println!("{text}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod tesseract;

pub use tesseract::TesseractRecognizer;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Four corner points, clockwise from top-left, in crop pixel coordinates
pub type Quad = [(f32, f32); 4];

/// Build the quadrilateral of an axis-aligned rectangle
#[must_use]
pub fn quad_from_rect(x: f32, y: f32, width: f32, height: f32) -> Quad {
    [
        (x, y),
        (x + width, y),
        (x + width, y + height),
        (x, y + height),
    ]
}

/// One recognized word or text fragment.
///
/// Either part may be missing when the backend returned a partial result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordEntry {
    pub quad: Option<Quad>,
    pub text: Option<String>,
    pub confidence: f32,
}

impl WordEntry {
    #[must_use]
    pub fn new(quad: Quad, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            quad: Some(quad),
            text: Some(text.into()),
            confidence,
        }
    }

    /// Box and text when both are present
    #[must_use]
    pub fn complete(&self) -> Option<(&Quad, &str)> {
        match (&self.quad, &self.text) {
            (Some(quad), Some(text)) => Some((quad, text.as_str())),
            _ => None,
        }
    }
}

/// Word entries of one text line, in reading order
pub type RecognitionLine = Vec<WordEntry>;

/// Text-recognition contract: one cropped image in, ordered lines out
pub trait TextRecognizer {
    fn recognize(&mut self, image: &RgbImage) -> Result<Vec<RecognitionLine>, RecognitionError>;
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for Box<R> {
    fn recognize(&mut self, image: &RgbImage) -> Result<Vec<RecognitionLine>, RecognitionError> {
        (**self).recognize(image)
    }
}

/// Configuration for text recognition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Tesseract language codes (e.g., "eng", "eng+fra")
    pub language: String,
    /// Minimum confidence threshold (0-100)
    pub min_confidence: i32,
    /// Page segmentation mode (see Tesseract PSM)
    pub page_segmentation_mode: u32,
    /// Tesseract data directory (None = system default)
    pub data_path: Option<String>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            min_confidence: 50,
            page_segmentation_mode: 6, // PSM_SINGLE_BLOCK
            data_path: None,
        }
    }
}

/// Errors that can occur during text recognition
#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Failed to initialize recognizer: {0}")]
    InitError(String),

    #[error("Failed to run recognition: {0}")]
    RecognitionFailed(String),

    #[error("Invalid image dimensions: {0}")]
    InvalidImageDimensions(String),
}
