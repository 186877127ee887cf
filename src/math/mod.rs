//! 2D math for the physics core
//!
//! Vectors come from macroquad (glam). This module adds what the engine
//! needs on top: a position/rotation/scale transform and the primitive
//! shapes colliders are built from.
//!
//! # Module Organization
//!
//! - `transform` - Transform2D (position, rotation in degrees, scale)
//! - `geometry` - Disc2, Aabb2, Obb2, Pillbox2 and closest-point helpers

pub mod geometry;
pub mod transform;

pub use geometry::{
    closest_point_on_segment, closest_points_between_segments, Aabb2, Core, Disc2, Obb2, Pillbox2,
};
pub use macroquad::math::Vec2;
pub use transform::Transform2D;

/// Below this length a vector is treated as zero.
pub const EPSILON: f32 = 1e-6;

/// Unit vector for an angle in degrees, measured counter-clockwise from +X.
pub fn direction_from_degrees(degrees: f32) -> Vec2 {
    let r = degrees.to_radians();
    Vec2::new(r.cos(), r.sin())
}

/// Angle of a vector in degrees, counter-clockwise from +X.
pub fn degrees_of(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

/// Rotate a vector counter-clockwise by an angle in degrees.
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    let dir = direction_from_degrees(degrees);
    Vec2::new(v.x * dir.x - v.y * dir.y, v.x * dir.y + v.y * dir.x)
}

/// Replace NaN/infinite components with a fallback.
pub fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}
