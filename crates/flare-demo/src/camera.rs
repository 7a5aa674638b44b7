use flare_engine::coords::Viewport;
use glam::{Mat4, Vec2};

/// Orthographic y-down camera over a fixed virtual area.
///
/// The virtual area keeps its aspect ratio: it is scaled to fit the window
/// and centred, with the leftover space visible as bars around it.
#[derive(Debug, Copy, Clone)]
pub struct Camera {
    virtual_size: Vec2,
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            virtual_size: Vec2::new(width, height),
        }
    }

    /// World-space `(min, max)` covered by `viewport`.
    pub fn visible(&self, viewport: Viewport) -> (Vec2, Vec2) {
        if !viewport.is_valid() {
            return (Vec2::ZERO, self.virtual_size);
        }

        let window = Vec2::new(viewport.width, viewport.height);
        let scale = (window / self.virtual_size).min_element();
        let pad = (window / scale - self.virtual_size) * 0.5;
        (-pad, self.virtual_size + pad)
    }

    /// Projection × view; top edge of the virtual area maps to NDC `y = 1`.
    pub fn combined(&self, viewport: Viewport) -> Mat4 {
        let (min, max) = self.visible(viewport);
        Mat4::orthographic_rh(min.x, max.x, max.y, min.y, -1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn ndc(cam: &Camera, viewport: Viewport, x: f32, y: f32) -> Vec2 {
        cam.combined(viewport).project_point3(Vec3::new(x, y, 0.0)).truncate()
    }

    #[test]
    fn square_window_maps_the_virtual_area_exactly() {
        let cam = Camera::new(1000.0, 1000.0);
        let vp = Viewport::new(800.0, 800.0);
        assert!(ndc(&cam, vp, 0.0, 0.0).abs_diff_eq(Vec2::new(-1.0, 1.0), 1e-5));
        assert!(ndc(&cam, vp, 1000.0, 1000.0).abs_diff_eq(Vec2::new(1.0, -1.0), 1e-5));
        assert!(ndc(&cam, vp, 500.0, 500.0).abs_diff_eq(Vec2::ZERO, 1e-5));
    }

    #[test]
    fn wide_window_gets_side_bars() {
        let cam = Camera::new(1000.0, 1000.0);
        let vp = Viewport::new(2000.0, 1000.0);

        let (min, max) = cam.visible(vp);
        assert!(min.abs_diff_eq(Vec2::new(-500.0, 0.0), 1e-3));
        assert!(max.abs_diff_eq(Vec2::new(1500.0, 1000.0), 1e-3));
        assert!(ndc(&cam, vp, 0.0, 0.0).abs_diff_eq(Vec2::new(-0.5, 1.0), 1e-5));
    }

    #[test]
    fn depth_stays_inside_the_clip_volume() {
        let cam = Camera::new(1000.0, 1000.0);
        let z = cam
            .combined(Viewport::new(640.0, 480.0))
            .project_point3(Vec3::new(10.0, 10.0, 0.0))
            .z;
        assert!((0.0..=1.0).contains(&z));
    }

    #[test]
    fn minimised_window_falls_back_to_the_virtual_area() {
        let cam = Camera::new(1000.0, 1000.0);
        assert_eq!(cam.visible(Viewport::new(0.0, 0.0)), (Vec2::ZERO, Vec2::splat(1000.0)));
    }
}
