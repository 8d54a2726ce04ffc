//! Region cropping and per-class text assembly

use crate::reconcile::ReconciledBox;
use diary_common::{PixelRect, RegionClass};
use diary_text_recognition::{Quad, RecognitionLine, TextRecognizer};
use image::{imageops, RgbImage};
use tracing::{debug, warn};

/// Recognized text of one sub-region plus its word boxes in page pixels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionText {
    pub text: String,
    pub word_boxes: Vec<PixelRect>,
}

/// Class-specific text extracted from a reconciled box
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPayload {
    Date(RegionText),
    Location(RegionText),
    Row {
        time_phone: RegionText,
        activity: RegionText,
    },
    /// `page` boxes carry no text
    Empty,
}

/// Split a row into its time/phone quarter and activity remainder
#[must_use]
pub fn split_row(rect: &PixelRect) -> (PixelRect, PixelRect) {
    let split = rect.left + rect.width() / 4;
    (
        PixelRect::new(rect.left, rect.top, split, rect.bottom),
        PixelRect::new(split, rect.top, rect.right, rect.bottom),
    )
}

/// Crop a page region; `None` when the region covers no pixels
#[must_use]
pub fn crop_region(page: &RgbImage, rect: &PixelRect) -> Option<RgbImage> {
    let right = rect.right.min(page.width());
    let bottom = rect.bottom.min(page.height());
    if right <= rect.left || bottom <= rect.top {
        return None;
    }
    Some(imageops::crop_imm(page, rect.left, rect.top, right - rect.left, bottom - rect.top).to_image())
}

/// Join every complete word in recognition order with single spaces.
///
/// Entries missing a box or text, and empty texts, are skipped. Word boxes
/// are shifted by `origin` into page coordinates.
#[must_use]
pub fn assemble_text(lines: &[RecognitionLine], origin: (u32, u32)) -> RegionText {
    let mut tokens = Vec::new();
    let mut word_boxes = Vec::new();

    for (quad, text) in lines.iter().flatten().filter_map(|word| word.complete()) {
        if text.is_empty() {
            continue;
        }
        tokens.push(text);
        word_boxes.push(quad_bounds(quad).offset(origin.0, origin.1));
    }

    RegionText {
        text: tokens.join(" "),
        word_boxes,
    }
}

fn quad_bounds(quad: &Quad) -> PixelRect {
    let xs = quad.iter().map(|p| p.0);
    let ys = quad.iter().map(|p| p.1);
    let to_px = |v: f32| v.max(0.0) as u32;
    PixelRect::new(
        to_px(xs.clone().fold(f32::INFINITY, f32::min)),
        to_px(ys.clone().fold(f32::INFINITY, f32::min)),
        to_px(xs.fold(f32::NEG_INFINITY, f32::max)),
        to_px(ys.fold(f32::NEG_INFINITY, f32::max)),
    )
}

/// Crop `rect` and run one recognition call over it.
///
/// Empty crops and recognizer failures degrade to empty text.
pub fn recognize_region<R: TextRecognizer + ?Sized>(
    recognizer: &mut R,
    page: &RgbImage,
    rect: &PixelRect,
) -> RegionText {
    let Some(crop) = crop_region(page, rect) else {
        debug!("Skipping empty region {:?}", rect);
        return RegionText::default();
    };

    match recognizer.recognize(&crop) {
        Ok(lines) => assemble_text(&lines, (rect.left, rect.top)),
        Err(e) => {
            warn!("Recognition failed for region {:?}: {}", rect, e);
            RegionText::default()
        }
    }
}

/// Extract the class-specific text of one reconciled box
pub fn extract_fields<R: TextRecognizer + ?Sized>(
    recognizer: &mut R,
    region: &ReconciledBox,
    page: &RgbImage,
) -> FieldPayload {
    match region.class {
        RegionClass::Page => FieldPayload::Empty,
        RegionClass::Date => {
            let text = recognize_region(recognizer, page, &region.rect);
            debug!("date: {}", text.text);
            FieldPayload::Date(text)
        }
        RegionClass::Location => {
            let text = recognize_region(recognizer, page, &region.rect);
            debug!("location: {}", text.text);
            FieldPayload::Location(text)
        }
        RegionClass::Row => {
            let (time_rect, activity_rect) = split_row(&region.rect);
            let time_phone = recognize_region(recognizer, page, &time_rect);
            let activity = recognize_region(recognizer, page, &activity_rect);
            debug!("time text: '{}', activity: '{}'", time_phone.text, activity.text);
            FieldPayload::Row {
                time_phone,
                activity,
            }
        }
    }
}
