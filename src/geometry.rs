//! Normalized page geometry for word positions.

use serde::Serialize;

/// A bounding box in page-relative coordinates, stored as corners with each
/// coordinate clamped to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Build a box from an origin plus width/height, the shape OCR engines
    /// report geometry in. Skewed scans can push a box slightly past the
    /// page edge, so every corner is clamped to the unit square before the
    /// platform sees it.
    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x1: clamp_unit(x),
            y1: clamp_unit(y),
            x2: clamp_unit(x + width),
            y2: clamp_unit(y + height),
        }
    }
}

/// Clamp a coordinate to `[0, 1]`.
fn clamp_unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_box_is_unchanged() {
        let bounds = BoundingBox::from_origin_size(0.125, 0.25, 0.25, 0.5);
        assert_eq!(
            bounds,
            BoundingBox {
                x1: 0.125,
                y1: 0.25,
                x2: 0.375,
                y2: 0.75,
            }
        );
    }

    #[test]
    fn test_overflowing_box_is_clamped() {
        // A box hanging off the right and bottom edges of the page.
        let bounds = BoundingBox::from_origin_size(0.75, 0.875, 0.5, 0.5);
        assert_eq!(
            bounds,
            BoundingBox {
                x1: 0.75,
                y1: 0.875,
                x2: 1.0,
                y2: 1.0,
            }
        );

        // A box starting before the page does.
        let bounds = BoundingBox::from_origin_size(-0.25, -0.5, 0.375, 0.25);
        assert_eq!(
            bounds,
            BoundingBox {
                x1: 0.0,
                y1: 0.0,
                x2: 0.125,
                y2: 0.0,
            }
        );
    }

    #[test]
    fn test_corner_ordering_survives_clamping() {
        let boxes = [
            BoundingBox::from_origin_size(1.5, 1.5, 0.5, 0.5),
            BoundingBox::from_origin_size(-2.0, -2.0, 0.5, 0.5),
            BoundingBox::from_origin_size(0.5, 0.5, 5.0, 5.0),
        ];
        for bounds in boxes {
            assert!(bounds.x1 <= bounds.x2);
            assert!(bounds.y1 <= bounds.y2);
            for value in [bounds.x1, bounds.y1, bounds.x2, bounds.y2] {
                assert!((0.0..=1.0).contains(&value));
            }
        }
    }
}
