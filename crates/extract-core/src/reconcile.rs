//! Page-space conversion and row geometry correction
//!
//! Detector boxes live in the square, resized input frame. This module maps
//! them back onto the page and repairs `row` boxes that came out too narrow
//! to be a full table row, borrowing the horizontal extent of the row above.

use diary_common::{PixelRect, RegionClass};
use diary_region_detection::{BoundingBox, Detection};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Horizontal extent carried from one row to the next within a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowState {
    pub left: u32,
    pub right: u32,
}

impl RowState {
    /// Default central margin used before the first row of a page
    #[must_use]
    pub fn for_page_width(page_width: u32) -> Self {
        Self {
            left: page_width / 20,
            right: page_width * 19 / 20,
        }
    }
}

/// A detection mapped to page pixels, possibly with corrected row extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconciledBox {
    pub class: RegionClass,
    pub confidence: f32,
    pub rect: PixelRect,
    /// True when left/right came from the previous row instead of the detector
    pub corrected: bool,
}

/// Rows narrower than this are treated as mis-detected fragments
#[must_use]
pub fn min_row_width(page_width: u32) -> u32 {
    page_width * 5 / 7
}

/// Scale a detector-space box to page pixels, clamped to the page
#[must_use]
pub fn to_pixel_rect(bbox: &BoundingBox, scale: f32, page_width: u32, page_height: u32) -> PixelRect {
    let clamp = |value: f32, limit: u32| -> u32 {
        let value = value.round();
        if value <= 0.0 {
            0
        } else {
            (value as u32).min(limit.saturating_sub(1))
        }
    };

    PixelRect::new(
        clamp(bbox.x * scale, page_width),
        clamp(bbox.y * scale, page_height),
        clamp((bbox.x + bbox.width) * scale, page_width),
        clamp((bbox.y + bbox.height) * scale, page_height),
    )
}

/// Map one detection to the page and apply row correction.
///
/// Only `row` boxes read or write `row_state`. After a row is finalized the
/// state takes that row's extent, corrected or not.
pub fn reconcile(
    detection: &Detection,
    page_width: u32,
    page_height: u32,
    row_state: &mut RowState,
) -> ReconciledBox {
    let mut rect = to_pixel_rect(&detection.bbox, detection.scale, page_width, page_height);
    let mut corrected = false;

    if detection.class == RegionClass::Row {
        if rect.width() < min_row_width(page_width) {
            debug!(
                "Row at y={} is {}px wide, using previous extent {}..{}",
                rect.top,
                rect.width(),
                row_state.left,
                row_state.right
            );
            rect.left = row_state.left;
            rect.right = row_state.right;
            corrected = true;
        }
        row_state.left = rect.left;
        row_state.right = rect.right;
    }

    ReconciledBox {
        class: detection.class,
        confidence: detection.confidence,
        rect,
        corrected,
    }
}

/// Reconcile all detections of a page in top-to-bottom order.
///
/// Row state starts from the page's default margin.
#[must_use]
pub fn reconcile_page(detections: &[Detection], page_width: u32, page_height: u32) -> Vec<ReconciledBox> {
    let mut ordered: Vec<&Detection> = detections.iter().collect();
    ordered.sort_by(|a, b| a.bbox.y.partial_cmp(&b.bbox.y).unwrap_or(Ordering::Equal));

    let mut row_state = RowState::for_page_width(page_width);
    ordered
        .into_iter()
        .map(|detection| reconcile(detection, page_width, page_height, &mut row_state))
        .collect()
}
