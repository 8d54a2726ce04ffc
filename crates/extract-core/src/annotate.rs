//! Debug overlay of detected regions and recognized words

use crate::fields::FieldPayload;
use crate::reconcile::ReconciledBox;
use diary_common::PixelRect;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Region kept as detected
pub const DETECTED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// Row whose extent was borrowed from the previous row
pub const CORRECTED_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Word in the time/phone column
pub const TIME_WORD_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Word in the activity column
pub const ACTIVITY_WORD_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

const THICKNESS: u32 = 2;

fn draw_rect(image: &mut RgbImage, rect: &PixelRect, color: Rgb<u8>) {
    for t in 0..THICKNESS {
        let width = rect.width().saturating_sub(2 * t);
        let height = rect.height().saturating_sub(2 * t);
        if width == 0 || height == 0 {
            break;
        }
        let outline = Rect::at((rect.left + t) as i32, (rect.top + t) as i32).of_size(width, height);
        draw_hollow_rect_mut(image, outline, color);
    }
}

/// Draw every region and word box of a page onto a copy of it.
///
/// `regions` and `payloads` are parallel, in the order they were extracted.
#[must_use]
pub fn annotate_page(page: &RgbImage, regions: &[ReconciledBox], payloads: &[FieldPayload]) -> RgbImage {
    let mut canvas = page.clone();

    for (region, payload) in regions.iter().zip(payloads) {
        let color = if region.corrected {
            CORRECTED_COLOR
        } else {
            DETECTED_COLOR
        };
        draw_rect(&mut canvas, &region.rect, color);

        if let FieldPayload::Row {
            time_phone,
            activity,
        } = payload
        {
            for word in &time_phone.word_boxes {
                draw_rect(&mut canvas, word, TIME_WORD_COLOR);
            }
            for word in &activity.word_boxes {
                draw_rect(&mut canvas, word, ACTIVITY_WORD_COLOR);
            }
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::RegionText;
    use diary_common::RegionClass;

    fn region(rect: PixelRect, corrected: bool) -> ReconciledBox {
        ReconciledBox {
            class: RegionClass::Row,
            confidence: 0.9,
            rect,
            corrected,
        }
    }

    #[test]
    fn test_colors_follow_correction_flag() {
        let page = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        let regions = vec![
            region(PixelRect::new(10, 10, 90, 30), false),
            region(PixelRect::new(10, 50, 90, 70), true),
        ];
        let payloads = vec![FieldPayload::Empty, FieldPayload::Empty];

        let annotated = annotate_page(&page, &regions, &payloads);

        assert_eq!(*annotated.get_pixel(10, 10), DETECTED_COLOR);
        assert_eq!(*annotated.get_pixel(11, 11), DETECTED_COLOR);
        assert_eq!(*annotated.get_pixel(10, 50), CORRECTED_COLOR);
        assert_eq!(*annotated.get_pixel(50, 20), Rgb([255, 255, 255]));
        // source page untouched
        assert_eq!(*page.get_pixel(10, 10), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_word_boxes_are_drawn() {
        let page = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        let regions = vec![region(PixelRect::new(0, 0, 99, 40), false)];
        let payloads = vec![FieldPayload::Row {
            time_phone: RegionText {
                text: "9:00".to_string(),
                word_boxes: vec![PixelRect::new(5, 5, 20, 15)],
            },
            activity: RegionText {
                text: "Walk".to_string(),
                word_boxes: vec![PixelRect::new(40, 5, 60, 15)],
            },
        }];

        let annotated = annotate_page(&page, &regions, &payloads);

        assert_eq!(*annotated.get_pixel(5, 5), TIME_WORD_COLOR);
        assert_eq!(*annotated.get_pixel(40, 5), ACTIVITY_WORD_COLOR);
    }

    #[test]
    fn test_degenerate_rect_is_skipped() {
        let page = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
        let regions = vec![region(PixelRect::new(5, 5, 5, 15), false)];
        let annotated = annotate_page(&page, &regions, &[FieldPayload::Empty]);
        assert_eq!(annotated, page);
    }
}
