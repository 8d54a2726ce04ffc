use diary_region_detection::{
    RegionDetectionConfig, RegionDetectionError, RegionDetector, YoloRegionDetector,
};
use image::{Rgb, RgbImage};

const MODEL_PATH: &str = "model/diarytable_model.onnx";

/// Create a test page with solid color
fn create_test_page(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_fn(width, height, |_, _| color)
}

#[test]
fn test_missing_model_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let result = YoloRegionDetector::new(
        dir.path().join("missing.onnx"),
        RegionDetectionConfig::default(),
    );
    assert!(matches!(result, Err(RegionDetectionError::ModelNotFound(_))));
}

#[test]
#[ignore] // Requires the diary table ONNX model
fn test_detector_loads_model() {
    let detector = YoloRegionDetector::new(MODEL_PATH, RegionDetectionConfig::default());
    assert!(
        detector.is_ok(),
        "Failed to load diary table model from {MODEL_PATH}"
    );
}

#[test]
#[ignore] // Requires the diary table ONNX model
fn test_blank_page_has_no_rows() {
    let mut detector =
        YoloRegionDetector::new(MODEL_PATH, RegionDetectionConfig::default()).unwrap();
    let page = create_test_page(1240, 1754, Rgb([255, 255, 255]));

    let detections = detector.detect(&page).unwrap();

    assert!(
        detections.len() < 3,
        "Unexpected detections on blank page: {detections:?}"
    );
    for detection in &detections {
        assert!(detection.confidence >= 0.3);
        assert!((detection.scale - 1754.0 / 640.0).abs() < 1e-4);
    }
}

#[test]
#[ignore] // Requires the diary table ONNX model
fn test_presets_respect_confidence_thresholds() {
    let page = create_test_page(1240, 1754, Rgb([240, 240, 240]));

    let mut production =
        YoloRegionDetector::new(MODEL_PATH, RegionDetectionConfig::production()).unwrap();
    let mut strict = YoloRegionDetector::new(MODEL_PATH, RegionDetectionConfig::strict()).unwrap();

    let loose = production.detect(&page).unwrap();
    let tight = strict.detect(&page).unwrap();
    assert!(loose.iter().all(|d| d.confidence >= 0.3));
    assert!(tight.iter().all(|d| d.confidence >= 0.6));
}
