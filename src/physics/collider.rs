//! Collider2D
//!
//! A collider is stored in the owner's local space and resolved to world
//! space against the owner's `Transform2D` on every query, so moving or
//! scaling a shape never leaves a stale collider behind.

use crate::math::{finite_or, Aabb2, Disc2, Pillbox2, Transform2D, Vec2};
use super::collision::{overlap, Manifold2};

/// The closed set of collider geometries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Disc(Disc2),
    Aabb(Aabb2),
    Pillbox(Pillbox2),
}

impl ColliderShape {
    pub fn center(&self) -> Vec2 {
        match self {
            ColliderShape::Disc(d) => d.center,
            ColliderShape::Aabb(b) => b.center(),
            ColliderShape::Pillbox(p) => p.center(),
        }
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        match self {
            ColliderShape::Disc(d) => d.contains_point(p),
            ColliderShape::Aabb(b) => b.contains_point(p),
            ColliderShape::Pillbox(pill) => pill.contains_point(p),
        }
    }

    pub fn bounds(&self) -> Aabb2 {
        match self {
            ColliderShape::Disc(d) => Aabb2::from_center_half_extents(d.center, Vec2::splat(d.radius)),
            ColliderShape::Aabb(b) => *b,
            ColliderShape::Pillbox(p) => p.bounds(),
        }
    }

    /// Every shape seen as a pillbox. Discs and boxes are the degenerate
    /// cases (no extents / no radius).
    pub fn as_pillbox(&self) -> Pillbox2 {
        match self {
            ColliderShape::Disc(d) => Pillbox2::from_disc(*d),
            ColliderShape::Aabb(b) => Pillbox2::from_aabb(*b),
            ColliderShape::Pillbox(p) => *p,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collider2D {
    /// Local-space geometry
    shape: ColliderShape,
    is_colliding: bool,
}

impl Collider2D {
    pub fn new(shape: ColliderShape) -> Self {
        Self { shape: sanitize(shape), is_colliding: false }
    }

    pub fn disc(center: Vec2, radius: f32) -> Self {
        Self::new(ColliderShape::Disc(Disc2::new(center, radius)))
    }

    pub fn aabb(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(ColliderShape::Aabb(Aabb2::from_center_half_extents(center, half_extents)))
    }

    pub fn pillbox(center: Vec2, radius: f32, half_extents: Vec2, right: Vec2) -> Self {
        Self::new(ColliderShape::Pillbox(Pillbox2::new(center, radius, half_extents, right)))
    }

    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    /// The pillbox parameters, if this is a pillbox collider.
    pub fn as_pillbox(&self) -> Option<&Pillbox2> {
        match &self.shape {
            ColliderShape::Pillbox(p) => Some(p),
            _ => None,
        }
    }

    /// True if this collider touched anything during the last step.
    pub fn is_colliding(&self) -> bool {
        self.is_colliding
    }

    pub(crate) fn set_colliding(&mut self, colliding: bool) {
        self.is_colliding = colliding;
    }

    /// Resolve the local geometry against the owner's transform.
    ///
    /// Centers go through the full transform. Directions are rotated only.
    /// Extents scale per axis and radii by the largest scale component.
    /// An AABB stays axis-aligned regardless of rotation.
    pub fn world_shape(&self, transform: &Transform2D) -> ColliderShape {
        let scale = transform.scale.abs();
        let world = match self.shape {
            ColliderShape::Disc(d) => ColliderShape::Disc(Disc2::new(
                transform.transform_point(d.center),
                d.radius * transform.max_scale(),
            )),
            ColliderShape::Aabb(b) => ColliderShape::Aabb(Aabb2::from_center_half_extents(
                transform.transform_point(b.center()),
                b.half_extents() * scale,
            )),
            ColliderShape::Pillbox(p) => ColliderShape::Pillbox(Pillbox2::new(
                transform.transform_point(p.obb.center),
                p.radius * transform.max_scale(),
                p.obb.half_extents * scale,
                transform.transform_direction(p.obb.right),
            )),
        };
        sanitize(world)
    }

    pub fn contains_point(&self, transform: &Transform2D, p: Vec2) -> bool {
        self.world_shape(transform).contains_point(p)
    }

    /// Narrow-phase test against another collider. The manifold normal
    /// points from `self` toward `other`.
    pub fn is_touching(
        &self,
        transform: &Transform2D,
        other: &Collider2D,
        other_transform: &Transform2D,
    ) -> Option<Manifold2> {
        overlap(&self.world_shape(transform), &other.world_shape(other_transform))
    }
}

/// Clamp degenerate parameters: negative or non-finite radii and extents
/// become zero, non-finite centers become the origin.
fn sanitize(shape: ColliderShape) -> ColliderShape {
    let radius = |r: f32| finite_or(r, 0.0).max(0.0);
    let point = |v: Vec2| Vec2::new(finite_or(v.x, 0.0), finite_or(v.y, 0.0));
    let extents = |v: Vec2| point(v).abs();

    match shape {
        ColliderShape::Disc(d) => ColliderShape::Disc(Disc2::new(point(d.center), radius(d.radius))),
        ColliderShape::Aabb(b) => {
            let (min, max) = (point(b.min), point(b.max));
            ColliderShape::Aabb(Aabb2::new(min, max))
        }
        ColliderShape::Pillbox(p) => ColliderShape::Pillbox(Pillbox2::new(
            point(p.obb.center),
            radius(p.radius),
            extents(p.obb.half_extents),
            point(p.obb.right),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_shape_follows_transform() {
        let c = Collider2D::pillbox(Vec2::new(1.0, 0.0), 0.5, Vec2::new(2.0, 0.0), Vec2::X);
        let t = Transform2D::new(Vec2::new(10.0, 10.0), 90.0, Vec2::ONE);
        match c.world_shape(&t) {
            ColliderShape::Pillbox(p) => {
                assert!(p.center().distance(Vec2::new(10.0, 11.0)) < 1e-4);
                assert!(p.obb.right.distance(Vec2::Y) < 1e-4);
                assert!((p.radius - 0.5).abs() < 1e-6);
            }
            other => panic!("expected pillbox, got {:?}", other),
        }
    }

    #[test]
    fn test_scale_applies_to_radius_and_extents() {
        let c = Collider2D::pillbox(Vec2::ZERO, 1.0, Vec2::new(1.0, 1.0), Vec2::X);
        let t = Transform2D::new(Vec2::ZERO, 0.0, Vec2::new(2.0, 3.0));
        let p = c.world_shape(&t).as_pillbox();
        assert_eq!(p.obb.half_extents, Vec2::new(2.0, 3.0));
        assert_eq!(p.radius, 3.0);
    }

    #[test]
    fn test_degenerate_parameters_are_clamped() {
        let c = Collider2D::pillbox(Vec2::new(f32::NAN, 1.0), -2.0, Vec2::new(-1.0, f32::INFINITY), Vec2::ZERO);
        let p = c.as_pillbox().copied().unwrap();
        assert_eq!(p.radius, 0.0);
        assert_eq!(p.obb.half_extents, Vec2::new(1.0, 0.0));
        assert_eq!(p.center(), Vec2::new(0.0, 1.0));
        assert_eq!(p.obb.right, Vec2::X);
    }

    #[test]
    fn test_contains_point() {
        let c = Collider2D::disc(Vec2::ZERO, 1.0);
        let t = Transform2D::from_position(Vec2::new(5.0, 0.0));
        assert!(c.contains_point(&t, Vec2::new(5.5, 0.0)));
        assert!(!c.contains_point(&t, Vec2::new(0.5, 0.0)));
    }
}
