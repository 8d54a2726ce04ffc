//! Diary table region detection using a `YOLOv8` model via ONNX Runtime
//!
//! This module locates the structural regions of a scanned diary page: the
//! page itself, the date header, the location header and each table row.
//! The model is a `YOLOv8` network exported to ONNX with four output classes.
//!
//! # Features
//! - Square padding at the top-left origin so page coordinates scale uniformly
//! - Configurable confidence and overlap thresholds (production and strict presets)
//! - Greedy non-maximum suppression, class-agnostic unless configured otherwise
//! - Pure decoding functions usable without a loaded model
//!
//! # Example
//! ```no_run
//! use diary_region_detection::{RegionDetectionConfig, RegionDetector, YoloRegionDetector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RegionDetectionConfig::default();
//! let mut detector = YoloRegionDetector::new("model/diarytable_model.onnx", config)?;
//!
//! let page = image::open("page_1.png")?.to_rgb8();
//! for detection in detector.detect(&page)? {
//!     println!("{}: {:.2}%", detection.class, detection.confidence * 100.0);
//! }
//! # Ok(())
//! # }
//! ```

pub mod postprocess;
pub mod session;

pub use diary_common::RegionClass;
pub use postprocess::{apply_nms, decode_predictions};

use image::{imageops, RgbImage};
use ndarray::Array;
use ort::{session::Session, value::TensorRef};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Number of region classes the diary table model predicts
pub const NUM_CLASSES: usize = RegionClass::ALL.len();

/// Configuration for region detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionDetectionConfig {
    /// Minimum class score for a candidate to be kept (0.0-1.0)
    pub confidence_threshold: f32,
    /// Maximum `IoU` allowed between a kept box and a surviving box (0.0-1.0)
    pub nms_threshold: f32,
    /// Square model input side in pixels
    pub input_size: u32,
    /// Restrict suppression to boxes of the same class
    pub class_aware_nms: bool,
    /// Optional cap on detections returned per page, applied after suppression
    pub max_detections: Option<usize>,
}

impl Default for RegionDetectionConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl RegionDetectionConfig {
    /// Looser thresholds used for batch conversion
    #[must_use]
    pub fn production() -> Self {
        Self {
            confidence_threshold: 0.3,
            nms_threshold: 0.5,
            input_size: 640,
            class_aware_nms: false,
            max_detections: None,
        }
    }

    /// Stricter thresholds for debugging detections
    #[must_use]
    pub fn strict() -> Self {
        Self {
            confidence_threshold: 0.6,
            nms_threshold: 0.8,
            ..Self::production()
        }
    }
}

/// Bounding box in detector input space (top-left corner plus size)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a box from `YOLOv8` center format
    #[must_use]
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    #[must_use]
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Calculate Intersection over Union (`IoU`) with another box
    #[must_use]
    #[inline]
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection_area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union_area = self.area() + other.area() - intersection_area;

        if union_area > 0.0 {
            intersection_area / union_area
        } else {
            0.0
        }
    }
}

/// One candidate region on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: RegionClass,
    /// Maximum class score (0-1)
    pub confidence: f32,
    /// Box in detector input space
    pub bbox: BoundingBox,
    /// Square-padded page side divided by the detector input side
    pub scale: f32,
}

/// Object-detection contract: a full page bitmap in, typed regions out.
///
/// Output order is unspecified; callers sort as they need.
pub trait RegionDetector {
    fn detect(&mut self, page: &RgbImage) -> Result<Vec<Detection>, RegionDetectionError>;
}

impl<D: RegionDetector + ?Sized> RegionDetector for Box<D> {
    fn detect(&mut self, page: &RgbImage) -> Result<Vec<Detection>, RegionDetectionError> {
        (**self).detect(page)
    }
}

/// Region detector backed by the `YOLOv8` diary table ONNX model
pub struct YoloRegionDetector {
    session: Session,
    config: RegionDetectionConfig,
}

impl YoloRegionDetector {
    /// Create a new region detector with the given ONNX model path
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        config: RegionDetectionConfig,
    ) -> Result<Self, RegionDetectionError> {
        info!(
            "Loading diary table model from {}",
            model_path.as_ref().display()
        );

        let session = session::create_cpu_only_session(model_path.as_ref())?;

        info!("Diary table model loaded successfully");

        Ok(Self { session, config })
    }

    #[must_use]
    pub fn config(&self) -> &RegionDetectionConfig {
        &self.config
    }

    /// Convert the padded square canvas to the (1, 3, H, W) normalized input tensor
    fn preprocess(
        square: &RgbImage,
        input_size: u32,
    ) -> Array<f32, ndarray::Dim<[usize; 4]>> {
        let resized = imageops::resize(
            square,
            input_size,
            input_size,
            imageops::FilterType::Triangle,
        );

        let side = input_size as usize;
        let mut input_array = Array::zeros((1, 3, side, side));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            input_array[[0, 0, y, x]] = f32::from(pixel[0]) / 255.0;
            input_array[[0, 1, y, x]] = f32::from(pixel[1]) / 255.0;
            input_array[[0, 2, y, x]] = f32::from(pixel[2]) / 255.0;
        }

        input_array
    }
}

impl RegionDetector for YoloRegionDetector {
    fn detect(&mut self, page: &RgbImage) -> Result<Vec<Detection>, RegionDetectionError> {
        debug!(
            "Running region detection on {}x{} page",
            page.width(),
            page.height()
        );

        let (square, scale) = pad_to_square(page, self.config.input_size)?;
        let input_array = Self::preprocess(&square, self.config.input_size);

        let input_tensor = TensorRef::from_array_view(input_array.view())
            .map_err(|e| RegionDetectionError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| RegionDetectionError::Inference(e.to_string()))?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            RegionDetectionError::Inference(format!("Failed to extract tensor: {e}"))
        })?;
        let dims: Vec<usize> = shape.as_ref().iter().map(|&d| d as usize).collect();
        debug!("ONNX output shape: {:?}", dims);

        let detections = decode_predictions(&dims, data, &self.config, scale)?;
        info!("Detected {} regions", detections.len());

        Ok(detections)
    }
}

/// Pad a page into a black square canvas with the page at the origin.
///
/// Returns the canvas and the ratio of its side to the detector input side.
pub fn pad_to_square(
    page: &RgbImage,
    input_size: u32,
) -> Result<(RgbImage, f32), RegionDetectionError> {
    let (width, height) = page.dimensions();
    if width == 0 || height == 0 {
        return Err(RegionDetectionError::ImageProcessing(format!(
            "Page dimensions must be non-zero (got {width}x{height})"
        )));
    }
    if input_size == 0 {
        return Err(RegionDetectionError::ImageProcessing(
            "Detector input size must be non-zero".to_string(),
        ));
    }

    let side = width.max(height);
    let mut canvas = RgbImage::new(side, side);
    imageops::replace(&mut canvas, page, 0, 0);

    Ok((canvas, side as f32 / input_size as f32))
}

/// Error types for region detection
#[derive(Debug, Error)]
pub enum RegionDetectionError {
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Unexpected model output: {0}")]
    OutputShape(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),
}
