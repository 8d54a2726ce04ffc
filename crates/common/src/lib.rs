//! Region classes and pixel geometry shared across the diary crates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural region classes produced by the diary table detector.
///
/// The discriminant is the model's output class index and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionClass {
    /// Whole diary page
    Page = 0,
    /// Date header of the page
    Date = 1,
    /// One table row (time/phone column plus activity column)
    Row = 2,
    /// Location header of the page
    Location = 3,
}

impl RegionClass {
    /// All classes in model index order
    pub const ALL: [RegionClass; 4] = [
        RegionClass::Page,
        RegionClass::Date,
        RegionClass::Row,
        RegionClass::Location,
    ];

    /// Map a model class index to a region class
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Model class index
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RegionClass::Page => "page",
            RegionClass::Date => "date",
            RegionClass::Row => "row",
            RegionClass::Location => "location",
        }
    }
}

impl fmt::Display for RegionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned rectangle in page pixel coordinates.
///
/// `right` and `bottom` are exclusive when used as a crop region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelRect {
    #[must_use]
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// True when the rectangle covers no pixels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Shift the rectangle by a non-negative offset
    #[must_use]
    pub fn offset(&self, dx: u32, dy: u32) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_class_index_mapping() {
        assert_eq!(RegionClass::from_index(0), Some(RegionClass::Page));
        assert_eq!(RegionClass::from_index(1), Some(RegionClass::Date));
        assert_eq!(RegionClass::from_index(2), Some(RegionClass::Row));
        assert_eq!(RegionClass::from_index(3), Some(RegionClass::Location));
        assert_eq!(RegionClass::from_index(4), None);

        for class in RegionClass::ALL {
            assert_eq!(RegionClass::from_index(class.index()), Some(class));
        }
    }

    #[test]
    fn test_region_class_serde_names() {
        let json = serde_json::to_string(&RegionClass::Location).unwrap();
        assert_eq!(json, "\"location\"");
        let parsed: RegionClass = serde_json::from_str("\"row\"").unwrap();
        assert_eq!(parsed, RegionClass::Row);
        assert_eq!(RegionClass::Date.to_string(), "date");
    }

    #[test]
    fn test_pixel_rect_dimensions() {
        let rect = PixelRect::new(10, 20, 110, 70);
        assert_eq!(rect.width(), 100);
        assert_eq!(rect.height(), 50);
        assert!(!rect.is_empty());

        let flat = PixelRect::new(10, 20, 110, 20);
        assert!(flat.is_empty());

        let inverted = PixelRect::new(50, 0, 40, 10);
        assert_eq!(inverted.width(), 0);
        assert!(inverted.is_empty());
    }

    #[test]
    fn test_pixel_rect_offset() {
        let rect = PixelRect::new(1, 2, 3, 4).offset(10, 20);
        assert_eq!(rect, PixelRect::new(11, 22, 13, 24));
    }
}
