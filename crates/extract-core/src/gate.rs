//! Page gate: decides whether a bitmap is a diary page at all

use crate::error::Result;
use diary_common::RegionClass;
use diary_region_detection::RegionDetector;
use image::RgbImage;
use tracing::debug;

/// Predicate run before any extraction; rejected pages produce nothing
pub trait PageGate {
    fn is_diary_page(&mut self, page: &RgbImage) -> Result<bool>;
}

impl<G: PageGate + ?Sized> PageGate for Box<G> {
    fn is_diary_page(&mut self, page: &RgbImage) -> Result<bool> {
        (**self).is_diary_page(page)
    }
}

/// Gate that accepts every page
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllPages;

impl PageGate for AcceptAllPages {
    fn is_diary_page(&mut self, _page: &RgbImage) -> Result<bool> {
        Ok(true)
    }
}

/// Gate that accepts a page when a detector finds a `page` region on it
pub struct RegionPageGate<D> {
    detector: D,
    min_confidence: f32,
}

impl<D: RegionDetector> RegionPageGate<D> {
    pub fn new(detector: D, min_confidence: f32) -> Self {
        Self {
            detector,
            min_confidence,
        }
    }
}

impl<D: RegionDetector> PageGate for RegionPageGate<D> {
    fn is_diary_page(&mut self, page: &RgbImage) -> Result<bool> {
        let detections = self.detector.detect(page)?;
        let best = detections
            .iter()
            .filter(|d| d.class == RegionClass::Page)
            .map(|d| d.confidence)
            .fold(None, |best: Option<f32>, c| Some(best.map_or(c, |b| b.max(c))));

        debug!("Best page region confidence: {:?}", best);
        Ok(best.is_some_and(|c| c >= self.min_confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diary_region_detection::{BoundingBox, Detection, RegionDetectionError};

    struct FixedDetector(Vec<Detection>);

    impl RegionDetector for FixedDetector {
        fn detect(&mut self, _page: &RgbImage) -> std::result::Result<Vec<Detection>, RegionDetectionError> {
            Ok(self.0.clone())
        }
    }

    fn detection(class: RegionClass, confidence: f32) -> Detection {
        Detection {
            class,
            confidence,
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            scale: 1.0,
        }
    }

    #[test]
    fn test_accept_all() {
        assert!(AcceptAllPages.is_diary_page(&RgbImage::new(1, 1)).unwrap());
    }

    #[test]
    fn test_region_gate_requires_page_class() {
        let page = RgbImage::new(10, 10);

        let mut gate = RegionPageGate::new(
            FixedDetector(vec![detection(RegionClass::Row, 0.99)]),
            0.5,
        );
        assert!(!gate.is_diary_page(&page).unwrap());

        let mut gate = RegionPageGate::new(
            FixedDetector(vec![
                detection(RegionClass::Page, 0.4),
                detection(RegionClass::Page, 0.7),
            ]),
            0.5,
        );
        assert!(gate.is_diary_page(&page).unwrap());

        let mut gate = RegionPageGate::new(FixedDetector(vec![detection(RegionClass::Page, 0.4)]), 0.5);
        assert!(!gate.is_diary_page(&page).unwrap());
    }

    #[test]
    fn test_region_gate_propagates_detector_errors() {
        struct Broken;
        impl RegionDetector for Broken {
            fn detect(&mut self, _page: &RgbImage) -> std::result::Result<Vec<Detection>, RegionDetectionError> {
                Err(RegionDetectionError::Inference("no session".to_string()))
            }
        }

        let mut gate = RegionPageGate::new(Broken, 0.5);
        assert!(gate.is_diary_page(&RgbImage::new(4, 4)).is_err());
    }
}
