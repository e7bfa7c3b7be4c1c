/// Axis-aligned pixel rectangle in frame coordinates.
///
/// May extend past the frame edges (e.g. after padding); use [`Region::clamped`]
/// before touching pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a region from `(x1, y1, x2, y2)` corners, truncating to whole pixels.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let x = x1 as i32;
        let y = y1 as i32;
        Self {
            x,
            y,
            width: (x2 as i32 - x).max(0),
            height: (y2 as i32 - y).max(0),
        }
    }

    /// `(x1, y1, x2, y2)` corners.
    pub fn corners(&self) -> (i32, i32, i32, i32) {
        (self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Grows the region by `padding` pixels on every side.
    pub fn padded(&self, padding: i32) -> Region {
        Region {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + 2 * padding,
            height: self.height + 2 * padding,
        }
    }

    /// Intersects the region with a `frame_width` x `frame_height` frame.
    ///
    /// Returns `None` if nothing of the region lies inside the frame.
    pub fn clamped(&self, frame_width: u32, frame_height: u32) -> Option<Region> {
        let (x1, y1, x2, y2) = self.corners();
        let x1 = x1.max(0);
        let y1 = y1.max(0);
        let x2 = x2.min(frame_width as i32);
        let y2 = y2.min(frame_height as i32);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Region::new(x1, y1, x2 - x1, y2 - y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_from_corners_truncates() {
        let r = Region::from_corners(10.7, 20.2, 110.9, 70.1);
        assert_eq!(r, Region::new(10, 20, 100, 50));
    }

    #[test]
    fn test_from_corners_inverted_is_empty() {
        let r = Region::from_corners(50.0, 50.0, 10.0, 10.0);
        assert_eq!(r.width, 0);
        assert_eq!(r.height, 0);
    }

    #[test]
    fn test_corners_roundtrip() {
        let r = Region::new(5, 6, 10, 20);
        assert_eq!(r.corners(), (5, 6, 15, 26));
    }

    #[test]
    fn test_padded_grows_every_side() {
        let r = Region::new(100, 100, 50, 60).padded(30);
        assert_eq!(r, Region::new(70, 70, 110, 120));
    }

    // ── Clamping ─────────────────────────────────────────────────────

    #[rstest]
    #[case::inside(Region::new(10, 10, 20, 20), Some(Region::new(10, 10, 20, 20)))]
    #[case::left_edge(Region::new(-10, 10, 30, 20), Some(Region::new(0, 10, 20, 20)))]
    #[case::bottom_right(Region::new(90, 90, 30, 30), Some(Region::new(90, 90, 10, 10)))]
    #[case::covers_frame(Region::new(-5, -5, 200, 200), Some(Region::new(0, 0, 100, 100)))]
    #[case::outside(Region::new(150, 150, 10, 10), None)]
    #[case::empty(Region::new(10, 10, 0, 10), None)]
    fn test_clamped(#[case] region: Region, #[case] expected: Option<Region>) {
        assert_eq!(region.clamped(100, 100), expected);
    }

    #[test]
    fn test_padding_near_corner_clamps_to_bounds() {
        // Face at the top-left corner: padding cannot go negative.
        let r = Region::new(10, 5, 40, 40).padded(30).clamped(640, 480).unwrap();
        assert_eq!(r, Region::new(0, 0, 80, 75));
    }
}
