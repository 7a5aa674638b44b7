use super::Vec2;

/// Axis-aligned quad placement: `(x, y)` plus extent.
///
/// No orientation is assumed. Negative extents are passed through as-is, so a
/// quad with `width < 0` is mirrored rather than rejected.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// `(x, y)`, `(x + w, y)`, `(x + w, y + h)`, `(x, y + h)`.
    #[inline]
    pub fn corners(self) -> [Vec2; 4] {
        let far_x = self.x + self.width;
        let far_y = self.y + self.height;
        [
            Vec2::new(self.x, self.y),
            Vec2::new(far_x, self.y),
            Vec2::new(far_x, far_y),
            Vec2::new(self.x, far_y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_run_around_the_quad_from_the_origin() {
        let c = Rect::new(10.0, 100.0, 500.0, 500.0).corners();
        assert_eq!(
            c.map(Vec2::to_array),
            [[10.0, 100.0], [510.0, 100.0], [510.0, 600.0], [10.0, 600.0]]
        );
    }

    #[test]
    fn negative_extent_mirrors_the_corners() {
        let c = Rect::new(10.0, 0.0, -4.0, 2.0).corners();
        assert_eq!(c[1], Vec2::new(6.0, 0.0));
        assert_eq!(c[2], Vec2::new(6.0, 2.0));
    }
}
