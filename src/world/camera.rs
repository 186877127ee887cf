//! Follow camera
//!
//! Orthographic 2D camera with +Y up. It eases toward a target (the player
//! in gameplay), can be panned and zoomed in the editor, and keeps its
//! focus inside the map.

use macroquad::camera::Camera2D;

use crate::math::{Aabb2, Vec2};

pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FollowCamera2D {
    focus: Vec2,
    zoom: f32,
    /// World units visible vertically at zoom 1
    view_height: f32,
}

impl FollowCamera2D {
    pub fn new(view_height: f32) -> Self {
        Self {
            focus: Vec2::ZERO,
            zoom: 1.0,
            view_height: view_height.max(1.0),
        }
    }

    pub fn focal_point(&self) -> Vec2 {
        self.focus
    }

    pub fn set_focal_point(&mut self, focus: Vec2) {
        if focus.is_finite() {
            self.focus = focus;
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Zoom by wheel steps; each step is 10%.
    pub fn add_zoom(&mut self, steps: f32) {
        self.set_zoom(self.zoom * 1.1f32.powf(steps));
    }

    pub fn pan(&mut self, offset: Vec2) {
        self.set_focal_point(self.focus + offset);
    }

    /// Ease toward `target`. `rate` is the fraction of the remaining
    /// distance closed per second; the step never overshoots.
    pub fn follow(&mut self, target: Vec2, rate: f32, dt: f32) {
        let t = (rate * dt).clamp(0.0, 1.0);
        self.set_focal_point(self.focus.lerp(target, t));
    }

    /// Keep the focal point inside `bounds`.
    pub fn clamp_to(&mut self, bounds: &Aabb2) {
        self.focus = self.focus.clamp(bounds.min, bounds.max);
    }

    /// Half the visible area in world units for a screen aspect ratio.
    pub fn half_view(&self, aspect: f32) -> Vec2 {
        let half_h = self.view_height * 0.5 / self.zoom;
        Vec2::new(half_h * aspect.max(0.01), half_h)
    }

    pub fn view_bounds(&self, aspect: f32) -> Aabb2 {
        Aabb2::from_center_half_extents(self.focus, self.half_view(aspect))
    }

    /// Pixel position (y down) to world position (y up).
    pub fn screen_to_world(&self, screen: Vec2, screen_size: Vec2) -> Vec2 {
        if screen_size.x <= 0.0 || screen_size.y <= 0.0 {
            return self.focus;
        }
        let ndc = Vec2::new(screen.x / screen_size.x * 2.0 - 1.0, 1.0 - screen.y / screen_size.y * 2.0);
        self.focus + ndc * self.half_view(screen_size.x / screen_size.y)
    }

    /// The equivalent macroquad camera.
    pub fn to_camera2d(&self, aspect: f32) -> Camera2D {
        let half = self.half_view(aspect);
        Camera2D {
            target: self.focus,
            zoom: Vec2::new(1.0 / half.x, 1.0 / half.y),
            ..Default::default()
        }
    }
}

impl Default for FollowCamera2D {
    fn default() -> Self {
        Self::new(20.0)
    }
}
