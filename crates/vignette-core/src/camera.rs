//! View transform used by zoom-to-rect and fit-to-content.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Viewport used until the host reports its real size.
pub const DEFAULT_VIEWPORT: Size = Size::new(1024.0, 768.0);

/// Scale and translation mapping diagram coordinates to the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub offset: Vec2,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Viewport size in screen units.
    pub viewport: Size,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.05,
            max_zoom: 8.0,
            viewport: DEFAULT_VIEWPORT,
        }
    }
}

impl Camera {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Diagram-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.transform().inverse() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Diagram area currently visible in the viewport.
    pub fn visible_rect(&self) -> Rect {
        let top_left = self.screen_to_world(Point::ZERO);
        let bottom_right = self.screen_to_world(Point::new(self.viewport.width, self.viewport.height));
        Rect::from_points(top_left, bottom_right)
    }

    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// Scale and center so that `bounds` fills the viewport minus `padding`
    /// on each side.
    ///
    /// A degenerate rectangle keeps the current zoom and only centers it.
    pub fn zoom_to_rect(&mut self, bounds: Rect, padding: f64) {
        let bounds = bounds.abs();
        if bounds.width() > 0.0 && bounds.height() > 0.0 {
            let available = Size::new(
                (self.viewport.width - padding * 2.0).max(1.0),
                (self.viewport.height - padding * 2.0).max(1.0),
            );
            let scale_x = available.width / bounds.width();
            let scale_y = available.height / bounds.height();
            self.zoom = scale_x.min(scale_y).clamp(self.min_zoom, self.max_zoom);
        }

        let center = bounds.center();
        self.offset = Vec2::new(
            self.viewport.width / 2.0 - center.x * self.zoom,
            self.viewport.height / 2.0 - center.y * self.zoom,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera_is_identity() {
        let camera = Camera::default();
        let p = Point::new(12.0, 34.0);
        assert_eq!(camera.world_to_screen(p), p);
    }

    #[test]
    fn test_zoom_to_rect_fits_and_centers() {
        let mut camera = Camera::new(Size::new(400.0, 300.0));
        camera.zoom_to_rect(Rect::new(100.0, 100.0, 200.0, 300.0), 10.0);

        // Height is the limiting axis: 280 / 200.
        assert!((camera.zoom - 1.4).abs() < 1e-10);
        let center = camera.world_to_screen(Point::new(150.0, 200.0));
        assert!((center.x - 200.0).abs() < 1e-10);
        assert!((center.y - 150.0).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = Camera::new(Size::new(400.0, 300.0));
        camera.zoom_to_rect(Rect::new(0.0, 0.0, 1.0, 1.0), 0.0);
        assert!((camera.zoom - camera.max_zoom).abs() < f64::EPSILON);
    }

    #[test]
    fn test_degenerate_rect_only_centers() {
        let mut camera = Camera::new(Size::new(400.0, 300.0));
        camera.zoom = 2.0;
        camera.zoom_to_rect(Rect::new(50.0, 50.0, 50.0, 50.0), 10.0);
        assert!((camera.zoom - 2.0).abs() < f64::EPSILON);
        let center = camera.world_to_screen(Point::new(50.0, 50.0));
        assert!((center.x - 200.0).abs() < 1e-10);
    }

    #[test]
    fn test_visible_rect_round_trip() {
        let mut camera = Camera::new(Size::new(400.0, 300.0));
        let target = Rect::new(0.0, 0.0, 400.0, 300.0);
        camera.zoom_to_rect(target, 0.0);
        let visible = camera.visible_rect();
        assert!((visible.x0 - target.x0).abs() < 1e-9);
        assert!((visible.y1 - target.y1).abs() < 1e-9);
    }
}
