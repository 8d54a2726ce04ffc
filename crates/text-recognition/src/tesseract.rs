//! Tesseract 5.x recognizer backend
//!
//! Each text line Tesseract finds in the crop becomes one recognition line
//! holding a single word entry for the whole line.

use crate::{quad_from_rect, RecognitionConfig, RecognitionError, RecognitionLine, TextRecognizer, WordEntry};
use image::RgbImage;
use leptess::{LepTess, Variable};
use tracing::debug;

/// Recognizer backed by a long-lived Tesseract instance
pub struct TesseractRecognizer {
    tess: LepTess,
    config: RecognitionConfig,
}

impl TesseractRecognizer {
    /// Create a new recognizer, failing if the language data is missing
    pub fn new(config: RecognitionConfig) -> Result<Self, RecognitionError> {
        let mut tess = LepTess::new(config.data_path.as_deref(), &config.language).map_err(|e| {
            RecognitionError::InitError(format!(
                "Failed to initialize Tesseract with language '{}': {}. \
                 Make sure language data is installed",
                config.language, e
            ))
        })?;

        tess.set_variable(
            Variable::TesseditPagesegMode,
            &config.page_segmentation_mode.to_string(),
        )
        .map_err(|e| RecognitionError::InitError(format!("Failed to set PSM: {e}")))?;

        Ok(Self { tess, config })
    }

    #[must_use]
    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&mut self, image: &RgbImage) -> Result<Vec<RecognitionLine>, RecognitionError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(RecognitionError::InvalidImageDimensions(format!(
                "Image dimensions must be non-zero (got {width}x{height})"
            )));
        }

        // leptess expects encoded image data
        let mut png_buf = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut png_buf, image::ImageFormat::Png)
            .map_err(|e| {
                RecognitionError::RecognitionFailed(format!("Failed to encode crop to PNG: {e}"))
            })?;

        self.tess.set_image_from_mem(png_buf.get_ref()).map_err(|e| {
            RecognitionError::RecognitionFailed(format!("Failed to set image from memory: {e}"))
        })?;

        // None means no text in the crop, which is not an error
        let Some(boxes) = self
            .tess
            .get_component_boxes(leptess::capi::TessPageIteratorLevel_RIL_TEXTLINE, true)
        else {
            return Ok(Vec::new());
        };

        let mut lines = Vec::new();
        for bbox in &boxes {
            let geom = bbox.get_geometry();
            self.tess.set_rectangle(geom.x, geom.y, geom.w, geom.h);

            let text = self
                .tess
                .get_utf8_text()
                .unwrap_or_default()
                .trim()
                .to_string();
            if text.is_empty() {
                lines.push(Vec::new());
                continue;
            }

            let confidence = self.tess.mean_text_conf();
            if confidence < self.config.min_confidence {
                debug!("Dropping '{}' with confidence {}%", text, confidence);
                continue;
            }

            debug!(
                "Recognized '{}' with confidence {}% at ({}, {}, {}, {})",
                text, confidence, geom.x, geom.y, geom.w, geom.h
            );

            let quad = quad_from_rect(
                geom.x as f32,
                geom.y as f32,
                geom.w as f32,
                geom.h as f32,
            );
            lines.push(vec![WordEntry::new(quad, text, confidence as f32 / 100.0)]);
        }

        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    #[ignore] // Requires Tesseract with English language data
    fn test_recognizer_creation() {
        let result = TesseractRecognizer::new(RecognitionConfig::default());
        assert!(
            result.is_ok(),
            "Failed to create recognizer. Make sure Tesseract is installed with English language data."
        );
    }

    #[test]
    fn test_invalid_language_fails() {
        let config = RecognitionConfig {
            language: "invalid_lang_xyz".to_string(),
            ..Default::default()
        };
        assert!(TesseractRecognizer::new(config).is_err());
    }

    #[test]
    #[ignore] // Requires Tesseract with English language data
    fn test_blank_crop_has_little_text() {
        let mut recognizer = TesseractRecognizer::new(RecognitionConfig::default()).unwrap();
        let crop = RgbImage::from_pixel(200, 50, Rgb([255, 255, 255]));

        let lines = recognizer.recognize(&crop).unwrap();
        let words: usize = lines.iter().map(Vec::len).sum();
        assert!(words < 3, "Blank crop should yield little or no text");
    }

    #[test]
    #[ignore] // Requires Tesseract with English language data
    fn test_empty_crop_is_rejected() {
        let mut recognizer = TesseractRecognizer::new(RecognitionConfig::default()).unwrap();
        let result = recognizer.recognize(&RgbImage::new(0, 10));
        assert!(matches!(
            result,
            Err(RecognitionError::InvalidImageDimensions(_))
        ));
    }
}
