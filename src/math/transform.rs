//! Transform2D
//!
//! Position, rotation (degrees) and per-axis scale of a shape. Collider
//! world shapes are derived from this on every query.

use super::{rotate_degrees, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub position: Vec2,
    /// Counter-clockwise, in degrees
    pub rotation: f32,
    pub scale: Vec2,
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D {
        position: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
    };

    pub fn from_position(position: Vec2) -> Self {
        Self { position, ..Self::IDENTITY }
    }

    pub fn new(position: Vec2, rotation: f32, scale: Vec2) -> Self {
        Self { position, rotation, scale }
    }

    /// Local point to world space: scale, then rotate, then translate.
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.position + rotate_degrees(local * self.scale, self.rotation)
    }

    /// Local direction to world space (rotation only).
    pub fn transform_direction(&self, local: Vec2) -> Vec2 {
        rotate_degrees(local, self.rotation)
    }

    /// Largest absolute scale component, used to scale radii.
    pub fn max_scale(&self) -> f32 {
        self.scale.x.abs().max(self.scale.y.abs())
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.position += offset;
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.rotation += degrees;
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_point() {
        let t = Transform2D::new(Vec2::new(10.0, 0.0), 90.0, Vec2::new(2.0, 2.0));
        let p = t.transform_point(Vec2::new(1.0, 0.0));
        // (1,0) scaled to (2,0), rotated to (0,2), translated to (10,2)
        assert!((p.x - 10.0).abs() < 1e-4);
        assert!((p.y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_identity() {
        let p = Transform2D::IDENTITY.transform_point(Vec2::new(3.0, -4.0));
        assert_eq!(p, Vec2::new(3.0, -4.0));
        assert_eq!(Transform2D::default().max_scale(), 1.0);
    }
}
