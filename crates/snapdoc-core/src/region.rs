//! Pixel-space rectangles and bounds clamping.

use serde::{Deserialize, Serialize};

/// A rectangular screen region in absolute pixel coordinates.
///
/// Immutable value object: every operation returns a new `Region`.
/// `left`/`top` are signed because upstream model output can place an
/// origin off-screen; [`Region::clamp`] brings any such rectangle back
/// inside a concrete image before it is used for cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// X of the top-left corner.
    pub left: i32,

    /// Y of the top-left corner.
    pub top: i32,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Create a new region.
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// X of the right edge (exclusive).
    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    /// Y of the bottom edge (exclusive).
    pub fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    /// `(left, top, right, bottom)` bounding box.
    pub fn bbox(&self) -> (i32, i32, i32, i32) {
        (self.left, self.top, self.right(), self.bottom())
    }

    /// Whether the region covers zero pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clamp this region to an image of the given dimensions.
    ///
    /// The result is guaranteed to have a non-negative origin and to
    /// lie entirely within `image_width` x `image_height`. A region
    /// that falls completely outside the image clamps to zero area at
    /// the nearest edge.
    pub fn clamp(&self, image_width: u32, image_height: u32) -> Region {
        let left = self.left.clamp(0, image_width as i32);
        let top = self.top.clamp(0, image_height as i32);
        let max_width = image_width.saturating_sub(left as u32);
        let max_height = image_height.saturating_sub(top as u32);
        Region {
            left,
            top,
            width: self.width.min(max_width),
            height: self.height.min(max_height),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{}) {}x{}",
            self.left, self.top, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox() {
        let region = Region::new(100, 200, 800, 600);
        assert_eq!(region.bbox(), (100, 200, 900, 800));
        assert_eq!(region.right(), 900);
        assert_eq!(region.bottom(), 800);
    }

    #[test]
    fn test_clamp_in_bounds_is_identity() {
        let region = Region::new(10, 20, 100, 50);
        assert_eq!(region.clamp(1920, 1080), region);
    }

    #[test]
    fn test_clamp_negative_origin() {
        let region = Region::new(-50, -10, 200, 100);
        let clamped = region.clamp(1920, 1080);
        assert_eq!(clamped.left, 0);
        assert_eq!(clamped.top, 0);
        assert_eq!(clamped.width, 200);
        assert_eq!(clamped.height, 100);
    }

    #[test]
    fn test_clamp_oversized() {
        let region = Region::new(1800, 1000, 500, 500);
        let clamped = region.clamp(1920, 1080);
        assert_eq!(clamped.left, 1800);
        assert_eq!(clamped.top, 1000);
        assert_eq!(clamped.width, 120);
        assert_eq!(clamped.height, 80);
        assert!(clamped.right() <= 1920);
        assert!(clamped.bottom() <= 1080);
    }

    #[test]
    fn test_clamp_fully_outside() {
        let region = Region::new(5000, 5000, 100, 100);
        let clamped = region.clamp(1920, 1080);
        assert!(clamped.is_empty());
        assert!(clamped.left >= 0 && clamped.top >= 0);
        assert!(clamped.right() <= 1920);
        assert!(clamped.bottom() <= 1080);
    }

    #[test]
    fn test_clamp_never_out_of_bounds() {
        // A spread of hostile rectangles against a 1280x720 image.
        let cases = [
            Region::new(-1000, -1000, 4000, 4000),
            Region::new(0, 0, 1280, 720),
            Region::new(1279, 719, 1, 1),
            Region::new(1280, 720, 10, 10),
            Region::new(-5, 700, 50, 50),
            Region::new(640, -5, 50, 50),
        ];
        for region in cases {
            let clamped = region.clamp(1280, 720);
            assert!(clamped.left >= 0, "left for {region}");
            assert!(clamped.top >= 0, "top for {region}");
            assert!(clamped.right() <= 1280, "right for {region}");
            assert!(clamped.bottom() <= 720, "bottom for {region}");
        }
    }
}
