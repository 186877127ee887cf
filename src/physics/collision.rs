//! Narrow phase
//!
//! `overlap` dispatches on the pair of collider variants. Disc and AABB
//! pairs have closed-form tests; anything involving a pillbox is reduced to
//! its core (point, segment or box), tested core-to-core, then inflated by
//! the combined radii.
//!
//! Contract for every test: `overlap(a, b)` and `overlap(b, a)` agree on
//! whether the shapes touch and on the penetration depth, and the normal
//! always points from the first argument toward the second. Touching means
//! strictly positive depth.

use crate::math::{
    closest_point_on_segment, closest_points_between_segments, Aabb2, Core, Disc2, Pillbox2, Vec2,
    EPSILON,
};
use super::collider::ColliderShape;

/// Contact information for a touching pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Manifold2 {
    /// Unit vector from A toward B
    pub normal: Vec2,
    /// Overlap distance along `normal`, always > 0
    pub depth: f32,
}

impl Manifold2 {
    pub fn new(normal: Vec2, depth: f32) -> Self {
        Self { normal, depth }
    }

    /// The same contact seen from the other body.
    pub fn flipped(self) -> Self {
        Self { normal: -self.normal, depth: self.depth }
    }
}

/// Direction used when the geometry gives none (coincident centers).
fn fallback_normal(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).try_normalize().unwrap_or(Vec2::Y)
}

fn touching(normal: Vec2, depth: f32) -> Option<Manifold2> {
    (depth > 0.0 && depth.is_finite()).then(|| Manifold2::new(normal, depth))
}

/// Test two world-space shapes.
pub fn overlap(a: &ColliderShape, b: &ColliderShape) -> Option<Manifold2> {
    match (a, b) {
        (ColliderShape::Disc(a), ColliderShape::Disc(b)) => disc_vs_disc(a, b),
        (ColliderShape::Aabb(a), ColliderShape::Aabb(b)) => aabb_vs_aabb(a, b),
        (ColliderShape::Disc(d), ColliderShape::Aabb(b)) => disc_vs_aabb(d, b),
        (ColliderShape::Aabb(b), ColliderShape::Disc(d)) => disc_vs_aabb(d, b).map(Manifold2::flipped),
        (ColliderShape::Pillbox(_), _) | (_, ColliderShape::Pillbox(_)) => {
            pillbox_vs_pillbox(&a.as_pillbox(), &b.as_pillbox())
        }
    }
}

pub fn disc_vs_disc(a: &Disc2, b: &Disc2) -> Option<Manifold2> {
    point_vs_point(a.center, a.radius, b.center, b.radius)
}

fn point_vs_point(pa: Vec2, ra: f32, pb: Vec2, rb: f32) -> Option<Manifold2> {
    let dist = pa.distance(pb);
    touching(fallback_normal(pa, pb), ra + rb - dist)
}

pub fn aabb_vs_aabb(a: &Aabb2, b: &Aabb2) -> Option<Manifold2> {
    let ox = a.max.x.min(b.max.x) - a.min.x.max(b.min.x);
    let oy = a.max.y.min(b.max.y) - a.min.y.max(b.min.y);
    if ox <= 0.0 || oy <= 0.0 {
        return None;
    }
    let d = b.center() - a.center();
    if ox < oy {
        let sign = if d.x >= 0.0 { 1.0 } else { -1.0 };
        touching(Vec2::new(sign, 0.0), ox)
    } else {
        let sign = if d.y >= 0.0 { 1.0 } else { -1.0 };
        touching(Vec2::new(0.0, sign), oy)
    }
}

/// Disc A against box B.
pub fn disc_vs_aabb(disc: &Disc2, aabb: &Aabb2) -> Option<Manifold2> {
    let c = disc.center;
    if aabb.contains_point(c) {
        // Center inside: leave through the nearest face. If that face is
        // the box's right side, the box lies to the disc's left.
        let faces = [
            (c.x - aabb.min.x, Vec2::X),
            (aabb.max.x - c.x, -Vec2::X),
            (c.y - aabb.min.y, Vec2::Y),
            (aabb.max.y - c.y, -Vec2::Y),
        ];
        let (dist, normal) = faces
            .iter()
            .copied()
            .fold((f32::MAX, Vec2::Y), |best, f| if f.0 < best.0 { f } else { best });
        return touching(normal, dist + disc.radius);
    }

    let closest = aabb.closest_point(c);
    let dist = closest.distance(c);
    touching(fallback_normal(c, closest), disc.radius - dist)
}

/// Rounded box against rounded box, by core.
pub fn pillbox_vs_pillbox(a: &Pillbox2, b: &Pillbox2) -> Option<Manifold2> {
    let (ra, rb) = (a.radius, b.radius);
    match (a.core(), b.core()) {
        (Core::Point(pa), Core::Point(pb)) => point_vs_point(pa, ra, pb, rb),
        (Core::Point(p), Core::Segment(s0, s1)) => point_vs_segment(p, ra, s0, s1, rb),
        (Core::Segment(s0, s1), Core::Point(p)) => {
            point_vs_segment(p, rb, s0, s1, ra).map(Manifold2::flipped)
        }
        (Core::Segment(a0, a1), Core::Segment(b0, b1)) => {
            let (pa, pb) = closest_points_between_segments(a0, a1, b0, b1);
            let dist = pa.distance(pb);
            if dist > EPSILON {
                touching((pb - pa) / dist, ra + rb - dist)
            } else {
                // Crossing or collinear cores
                core_vs_core(&a.core(), ra, &b.core(), rb)
            }
        }
        (ca, cb) => core_vs_core(&ca, ra, &cb, rb),
    }
}

/// Capsule-style test: point with radius `rp` against segment with radius `rs`.
/// Normal points from the point toward the segment.
fn point_vs_segment(p: Vec2, rp: f32, s0: Vec2, s1: Vec2, rs: f32) -> Option<Manifold2> {
    let q = closest_point_on_segment(p, s0, s1);
    let dist = q.distance(p);
    if dist > EPSILON {
        return touching((q - p) / dist, rp + rs - dist);
    }
    // Point on the segment: push across it
    let normal = match (s1 - s0).try_normalize() {
        Some(dir) => {
            let n = dir.perp();
            if n.dot((s0 + s1) * 0.5 - p) < 0.0 {
                -n
            } else {
                n
            }
        }
        None => Vec2::Y,
    };
    touching(normal, rp + rs)
}

/// General core test: separating axes to decide whether the cores overlap,
/// edge-to-edge distance when they don't.
fn core_vs_core(ca: &Core, ra: f32, cb: &Core, rb: f32) -> Option<Manifold2> {
    let axes: Vec<Vec2> = ca.axes().into_iter().chain(cb.axes()).collect();
    let mut separated = axes.is_empty();
    let mut best_push = f32::MAX;
    let mut best_normal = fallback_normal(ca.center(), cb.center());

    for axis in &axes {
        let (amin, amax) = ca.project(*axis);
        let (bmin, bmax) = cb.project(*axis);
        if amax < bmin - EPSILON || bmax < amin - EPSILON {
            separated = true;
            break;
        }
        // Distance A must travel along -axis (B is ahead) or +axis (B is behind)
        let ahead = amax - bmin;
        let behind = bmax - amin;
        let (push, normal) = if ahead <= behind { (ahead, *axis) } else { (behind, -*axis) };
        if push < best_push {
            best_push = push;
            best_normal = normal;
        }
    }

    if !separated {
        return touching(best_normal, best_push.max(0.0) + ra + rb);
    }

    let mut best: Option<(Vec2, Vec2, f32)> = None;
    for (a0, a1) in ca.edges() {
        for (b0, b1) in cb.edges() {
            let (pa, pb) = closest_points_between_segments(a0, a1, b0, b1);
            let d = pa.distance_squared(pb);
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((pa, pb, d));
            }
        }
    }
    let (pa, pb, dist_sq) = best?;
    let dist = dist_sq.sqrt();
    let normal = if dist > EPSILON { (pb - pa) / dist } else { fallback_normal(ca.center(), cb.center()) };
    touching(normal, ra + rb - dist)
}
