//! Decoding of raw `YOLOv8` output into region detections

use crate::{BoundingBox, Detection, RegionClass, RegionDetectionConfig, RegionDetectionError, NUM_CLASSES};
use std::cmp::Ordering;
use tracing::debug;

/// Values per candidate: 4 box coordinates followed by one score per class
const FEATURES: usize = 4 + NUM_CLASSES;

/// Decode a raw `YOLOv8` output tensor into thresholded, suppressed detections.
///
/// `dims` is the output shape: `[1, 8, anchors]` (feature-major, the usual
/// export) or `[1, anchors, 8]` (anchor-major). Boxes stay in detector input
/// space; `scale` is attached to every detection.
pub fn decode_predictions(
    dims: &[usize],
    data: &[f32],
    config: &RegionDetectionConfig,
    scale: f32,
) -> Result<Vec<Detection>, RegionDetectionError> {
    if dims.len() != 3 {
        return Err(RegionDetectionError::OutputShape(format!(
            "Expected 3D output tensor, got {}D",
            dims.len()
        )));
    }

    let (num_anchors, feature_major) = if dims[1] == FEATURES {
        (dims[2], true)
    } else if dims[2] == FEATURES {
        (dims[1], false)
    } else {
        return Err(RegionDetectionError::OutputShape(format!(
            "Expected {FEATURES} features per candidate, got shape {dims:?}"
        )));
    };

    if data.len() < FEATURES * num_anchors {
        return Err(RegionDetectionError::OutputShape(format!(
            "Output holds {} values, shape {dims:?} needs {}",
            data.len(),
            FEATURES * num_anchors
        )));
    }

    let mut candidates = Vec::with_capacity(num_anchors / 10);

    for anchor_idx in 0..num_anchors {
        let feature = |feature_idx: usize| {
            if feature_major {
                data[feature_idx * num_anchors + anchor_idx]
            } else {
                data[anchor_idx * FEATURES + feature_idx]
            }
        };

        // First maximum wins on ties
        let mut best_class = 0usize;
        let mut best_score = feature(4);
        for class_idx in 1..NUM_CLASSES {
            let score = feature(4 + class_idx);
            if score > best_score {
                best_score = score;
                best_class = class_idx;
            }
        }

        // NaN scores fail this comparison and are dropped
        if !(best_score >= config.confidence_threshold) {
            continue;
        }

        let Some(class) = RegionClass::from_index(best_class) else {
            continue;
        };

        candidates.push(Detection {
            class,
            confidence: best_score,
            bbox: BoundingBox::from_center(feature(0), feature(1), feature(2), feature(3)),
            scale,
        });
    }

    debug!("Raw detections before NMS: {}", candidates.len());

    let mut detections = apply_nms(candidates, config.nms_threshold, config.class_aware_nms);
    if let Some(cap) = config.max_detections {
        detections.truncate(cap);
    }

    Ok(detections)
}

/// Greedy non-maximum suppression.
///
/// Candidates are visited by descending confidence; each kept box suppresses
/// every later box whose `IoU` with it exceeds `nms_threshold`. With
/// `class_aware` unset, boxes of different classes suppress each other.
/// The result is ordered by descending confidence.
#[must_use]
pub fn apply_nms(
    mut detections: Vec<Detection>,
    nms_threshold: f32,
    class_aware: bool,
) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut suppressed = vec![false; detections.len()];
    let mut keep = Vec::with_capacity(detections.len());

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..detections.len() {
            if suppressed[j] {
                continue;
            }
            if class_aware && detections[j].class != detections[i].class {
                continue;
            }
            if detections[i].bbox.iou(&detections[j].bbox) > nms_threshold {
                suppressed[j] = true;
            }
        }
        keep.push(i);
    }

    let mut slots: Vec<Option<Detection>> = detections.into_iter().map(Some).collect();
    let kept: Vec<Detection> = keep.into_iter().filter_map(|i| slots[i].take()).collect();

    debug!("Detections after NMS: {}", kept.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a feature-major `[1, 8, n]` tensor from (cx, cy, w, h, scores) rows
    fn feature_major(rows: &[[f32; FEATURES]]) -> (Vec<usize>, Vec<f32>) {
        let n = rows.len();
        let mut data = vec![0.0; FEATURES * n];
        for (anchor, row) in rows.iter().enumerate() {
            for (feature, value) in row.iter().enumerate() {
                data[feature * n + anchor] = *value;
            }
        }
        (vec![1, FEATURES, n], data)
    }

    fn detection(class: RegionClass, confidence: f32, x: f32, y: f32, w: f32, h: f32) -> Detection {
        Detection {
            class,
            confidence,
            bbox: BoundingBox::new(x, y, w, h),
            scale: 1.0,
        }
    }

    #[test]
    fn test_decode_drops_low_scores() {
        let (dims, data) = feature_major(&[
            [100.0, 100.0, 40.0, 20.0, 0.1, 0.2, 0.29, 0.05],
            [300.0, 300.0, 40.0, 20.0, 0.0, 0.0, 0.9, 0.0],
        ]);
        let config = RegionDetectionConfig::production();

        let detections = decode_predictions(&dims, &data, &config, 2.0).unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class, RegionClass::Row);
        assert_eq!(detections[0].confidence, 0.9);
        assert_eq!(detections[0].bbox, BoundingBox::new(280.0, 290.0, 40.0, 20.0));
        assert_eq!(detections[0].scale, 2.0);
    }

    #[test]
    fn test_decode_keeps_score_at_threshold() {
        let (dims, data) = feature_major(&[[10.0, 10.0, 4.0, 4.0, 0.0, 0.0, 0.0, 0.3]]);
        let detections =
            decode_predictions(&dims, &data, &RegionDetectionConfig::production(), 1.0).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class, RegionClass::Location);
    }

    #[test]
    fn test_decode_drops_nan_scores() {
        let (dims, data) = feature_major(&[
            [100.0, 100.0, 40.0, 20.0, f32::NAN, f32::NAN, f32::NAN, f32::NAN],
            [300.0, 300.0, 40.0, 20.0, f32::NAN, 0.1, 0.2, 0.1],
            [500.0, 500.0, 40.0, 20.0, 0.0, 0.0, 0.7, 0.0],
        ]);
        let detections =
            decode_predictions(&dims, &data, &RegionDetectionConfig::production(), 1.0).unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].confidence, 0.7);
        assert!(detections.iter().all(|d| !d.confidence.is_nan()));
    }

    #[test]
    fn test_decode_keeps_every_survivor_without_cap() {
        // 400 disjoint boxes, none suppressed
        let rows: Vec<[f32; FEATURES]> = (0..400)
            .map(|i| {
                let x = (i % 20) as f32 * 30.0 + 10.0;
                let y = (i / 20) as f32 * 30.0 + 10.0;
                [x, y, 10.0, 10.0, 0.0, 0.0, 0.9, 0.0]
            })
            .collect();
        let (dims, data) = feature_major(&rows);

        let config = RegionDetectionConfig::production();
        assert_eq!(config.max_detections, None);
        assert_eq!(decode_predictions(&dims, &data, &config, 1.0).unwrap().len(), 400);

        let capped = RegionDetectionConfig {
            max_detections: Some(5),
            ..RegionDetectionConfig::production()
        };
        assert_eq!(decode_predictions(&dims, &data, &capped, 1.0).unwrap().len(), 5);
    }

    #[test]
    fn test_decode_anchor_major_layout() {
        let rows = [
            [50.0, 20.0, 20.0, 10.0, 0.0, 0.8, 0.1, 0.0],
            [500.0, 20.0, 20.0, 10.0, 0.0, 0.0, 0.1, 0.7],
        ];
        let data: Vec<f32> = rows.iter().flatten().copied().collect();

        let detections = decode_predictions(
            &[1, 2, FEATURES],
            &data,
            &RegionDetectionConfig::production(),
            1.0,
        )
        .unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].class, RegionClass::Date);
        assert_eq!(detections[1].class, RegionClass::Location);
    }

    #[test]
    fn test_decode_rejects_unknown_shape() {
        let config = RegionDetectionConfig::production();
        assert!(decode_predictions(&[1, 84, 10], &[0.0; 840], &config, 1.0).is_err());
        assert!(decode_predictions(&[8, 10], &[0.0; 80], &config, 1.0).is_err());
        assert!(decode_predictions(&[1, FEATURES, 10], &[0.0; 8], &config, 1.0).is_err());
    }

    #[test]
    fn test_decode_with_strict_preset() {
        let (dims, data) = feature_major(&[
            [100.0, 100.0, 40.0, 20.0, 0.0, 0.0, 0.5, 0.0],
            [300.0, 300.0, 40.0, 20.0, 0.0, 0.0, 0.65, 0.0],
        ]);
        let detections =
            decode_predictions(&dims, &data, &RegionDetectionConfig::strict(), 1.0).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].confidence, 0.65);
    }

    #[test]
    fn test_nms_is_class_agnostic_by_default() {
        let detections = vec![
            detection(RegionClass::Row, 0.9, 0.0, 0.0, 100.0, 20.0),
            // a date box almost entirely covering the row
            detection(RegionClass::Date, 0.6, 0.0, 0.0, 100.0, 18.0),
            detection(RegionClass::Row, 0.8, 0.0, 100.0, 100.0, 20.0),
        ];

        let kept = apply_nms(detections.clone(), 0.5, false);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|d| d.class == RegionClass::Row));

        let kept = apply_nms(detections, 0.5, true);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_nms_threshold_is_exclusive() {
        // IoU exactly 1/3
        let detections = vec![
            detection(RegionClass::Row, 0.9, 0.0, 0.0, 10.0, 10.0),
            detection(RegionClass::Row, 0.8, 5.0, 0.0, 10.0, 10.0),
        ];
        assert_eq!(apply_nms(detections.clone(), 1.0 / 3.0, false).len(), 2);
        assert_eq!(apply_nms(detections, 0.3, false).len(), 1);
    }

    #[test]
    fn test_nms_properties_hold() {
        let mut detections = Vec::new();
        for i in 0..12 {
            let offset = (i * 7 % 30) as f32;
            detections.push(detection(
                RegionClass::from_index(i % 4).unwrap(),
                0.3 + (i as f32) * 0.05,
                offset,
                offset * 0.5,
                40.0,
                20.0,
            ));
        }
        let threshold = 0.4;

        let kept = apply_nms(detections.clone(), threshold, false);

        for (i, a) in kept.iter().enumerate() {
            for b in kept.iter().skip(i + 1) {
                assert!(a.bbox.iou(&b.bbox) <= threshold);
            }
        }
        for candidate in &detections {
            if kept.contains(candidate) {
                continue;
            }
            assert!(kept.iter().any(|k| {
                k.bbox.iou(&candidate.bbox) > threshold && k.confidence >= candidate.confidence
            }));
        }
        for pair in kept.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(apply_nms(Vec::new(), 0.5, false).is_empty());
    }
}
