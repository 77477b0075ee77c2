//! Viewport pan/zoom transform for the in-memory canvas.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Pan offset and zoom factor applied when rasterizing the document.
///
/// Pointer positions forwarded by a host are screen coordinates; paste
/// targets and drawable positions are world coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen-space pan.
    pub offset: Vec2,
    /// 1.0 is 100%.
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.01,
            max_zoom: 20.0,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// World to screen.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.transform().inverse() * screen_point
    }

    /// Non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
    }

    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_to_world_undoes_pan_and_zoom() {
        let mut viewport = Viewport::new();
        viewport.offset = Vec2::new(100.0, 50.0);
        viewport.set_zoom(2.0);

        let world = viewport.screen_to_world(Point::new(120.0, 90.0));
        assert!((world.x - 10.0).abs() < 1e-9);
        assert!((world.y - 20.0).abs() < 1e-9);
        assert_eq!(viewport.transform() * world, Point::new(120.0, 90.0));
    }

    #[test]
    fn test_zoom_clamped_and_reset() {
        let mut viewport = Viewport::new();
        viewport.set_zoom(1000.0);
        assert_eq!(viewport.zoom, viewport.max_zoom);
        viewport.set_zoom(f64::NAN);
        assert_eq!(viewport.zoom, viewport.max_zoom);

        viewport.offset = Vec2::new(5.0, 5.0);
        viewport.reset();
        assert_eq!(viewport.zoom, 1.0);
        assert_eq!(viewport.offset, Vec2::ZERO);
    }
}
