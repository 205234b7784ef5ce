//! User-drawn regions and crop rectangles

/// One drag on a slide: the two corner points, in whatever order the
/// user dragged (either corner may be "first", and either may lie
/// outside the image).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: (i32, i32),
    pub end: (i32, i32),
}

/// An axis-aligned rectangle with positive area, fully inside the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(start: (i32, i32), end: (i32, i32)) -> Self {
        Self { start, end }
    }

    /// Normalize and clamp to an image of the given size
    ///
    /// Returns `None` when the clamped rectangle has zero width or
    /// height; such regions are discarded rather than persisted.
    pub fn clamped(&self, width: u32, height: u32) -> Option<CropRect> {
        let (x1, x2) = ordered_clamped(self.start.0, self.end.0, width);
        let (y1, y2) = ordered_clamped(self.start.1, self.end.1, height);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(CropRect {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        })
    }
}

fn ordered_clamped(a: i32, b: i32, bound: u32) -> (u32, u32) {
    let lo = a.min(b).clamp(0, bound as i32) as u32;
    let hi = a.max(b).clamp(0, bound as i32) as u32;
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_drag_direction() {
        let forward = Region::new((10, 20), (30, 50)).clamped(100, 100).unwrap();
        let backward = Region::new((30, 50), (10, 20)).clamped(100, 100).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.x, 10);
        assert_eq!(forward.y, 20);
        assert_eq!(forward.width, 20);
        assert_eq!(forward.height, 30);
    }

    #[test]
    fn test_clamps_to_image_bounds() {
        let rect = Region::new((-15, -5), (40, 250)).clamped(100, 100).unwrap();
        assert_eq!(rect, CropRect { x: 0, y: 0, width: 40, height: 100 });
    }

    #[test]
    fn test_zero_area_is_discarded() {
        // Degenerate drag: no horizontal extent
        assert!(Region::new((10, 10), (10, 40)).clamped(100, 100).is_none());
        // Entirely outside the image, collapses to the edge
        assert!(Region::new((150, 10), (200, 40)).clamped(100, 100).is_none());
    }
}
