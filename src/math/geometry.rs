//! Primitive 2D shapes
//!
//! A `Pillbox2` is an oriented box inflated by a radius (a rectangle with
//! rounded corners). When one or both half-extents are zero its core
//! collapses to a segment (a capsule) or a point (a disc). The narrow phase
//! works on that core, then inflates by the radii.

use super::{Vec2, EPSILON};

/// Circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disc2 {
    pub center: Vec2,
    pub radius: f32,
}

impl Disc2 {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        self.center.distance_squared(p) <= self.radius * self.radius
    }
}

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2 {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min: min.min(max), max: min.max(max) }
    }

    pub fn from_center_half_extents(center: Vec2, half_extents: Vec2) -> Self {
        let h = half_extents.abs();
        Self { min: center - h, max: center + h }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    pub fn overlaps(&self, other: &Aabb2) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn to_obb(&self) -> Obb2 {
        Obb2::new(self.center(), self.half_extents(), Vec2::X)
    }
}

/// Oriented box. `right` is a unit vector; `up` is `right` rotated 90° CCW.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb2 {
    pub center: Vec2,
    pub half_extents: Vec2,
    pub right: Vec2,
}

impl Obb2 {
    pub fn new(center: Vec2, half_extents: Vec2, right: Vec2) -> Self {
        let right = right.try_normalize().unwrap_or(Vec2::X);
        Self { center, half_extents: half_extents.abs(), right }
    }

    pub fn up(&self) -> Vec2 {
        self.right.perp()
    }

    /// Corners in order BL, BR, TR, TL.
    pub fn corners(&self) -> [Vec2; 4] {
        let r = self.right * self.half_extents.x;
        let u = self.up() * self.half_extents.y;
        [
            self.center - r - u,
            self.center + r - u,
            self.center + r + u,
            self.center - r + u,
        ]
    }

    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        let local = p - self.center;
        let x = local.dot(self.right).clamp(-self.half_extents.x, self.half_extents.x);
        let y = local.dot(self.up()).clamp(-self.half_extents.y, self.half_extents.y);
        self.center + self.right * x + self.up() * y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        let local = p - self.center;
        local.dot(self.right).abs() <= self.half_extents.x
            && local.dot(self.up()).abs() <= self.half_extents.y
    }
}

/// The part of a pillbox left after removing the radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Core {
    Point(Vec2),
    Segment(Vec2, Vec2),
    Box([Vec2; 4]),
}

impl Core {
    pub fn center(&self) -> Vec2 {
        match *self {
            Core::Point(p) => p,
            Core::Segment(a, b) => (a + b) * 0.5,
            Core::Box(c) => (c[0] + c[2]) * 0.5,
        }
    }

    /// Boundary edges. A point is one zero-length edge.
    pub fn edges(&self) -> Vec<(Vec2, Vec2)> {
        match *self {
            Core::Point(p) => vec![(p, p)],
            Core::Segment(a, b) => vec![(a, b)],
            Core::Box(c) => vec![(c[0], c[1]), (c[1], c[2]), (c[2], c[3]), (c[3], c[0])],
        }
    }

    /// Candidate separating axes contributed by this core.
    pub fn axes(&self) -> Vec<Vec2> {
        match *self {
            Core::Point(_) => Vec::new(),
            Core::Segment(a, b) => match (b - a).try_normalize() {
                Some(d) => vec![d, d.perp()],
                None => Vec::new(),
            },
            Core::Box(c) => [c[1] - c[0], c[3] - c[0]]
                .iter()
                .filter_map(|e| e.try_normalize())
                .collect(),
        }
    }

    /// Min/max of the core projected onto an axis.
    pub fn project(&self, axis: Vec2) -> (f32, f32) {
        let pts: Vec<Vec2> = match *self {
            Core::Point(p) => vec![p],
            Core::Segment(a, b) => vec![a, b],
            Core::Box(c) => c.to_vec(),
        };
        pts.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
            let d = p.dot(axis);
            (lo.min(d), hi.max(d))
        })
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        match *self {
            Core::Point(c) => c.distance_squared(p) <= EPSILON * EPSILON,
            Core::Segment(a, b) => closest_point_on_segment(p, a, b).distance_squared(p) <= EPSILON * EPSILON,
            Core::Box(c) => {
                let obb = Obb2::new(
                    (c[0] + c[2]) * 0.5,
                    Vec2::new((c[1] - c[0]).length() * 0.5, (c[3] - c[0]).length() * 0.5),
                    c[1] - c[0],
                );
                obb.contains_point(p)
            }
        }
    }
}

/// Rounded oriented box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pillbox2 {
    pub obb: Obb2,
    pub radius: f32,
}

impl Pillbox2 {
    pub fn new(center: Vec2, radius: f32, half_extents: Vec2, right: Vec2) -> Self {
        Self {
            obb: Obb2::new(center, half_extents, right),
            radius: radius.max(0.0),
        }
    }

    /// A pillbox with no extents: a disc.
    pub fn from_disc(disc: Disc2) -> Self {
        Self::new(disc.center, disc.radius, Vec2::ZERO, Vec2::X)
    }

    /// A pillbox with no radius: a plain box.
    pub fn from_aabb(aabb: Aabb2) -> Self {
        Self { obb: aabb.to_obb(), radius: 0.0 }
    }

    pub fn center(&self) -> Vec2 {
        self.obb.center
    }

    pub fn core(&self) -> Core {
        let e = self.obb.half_extents;
        let c = self.obb.center;
        match (e.x > EPSILON, e.y > EPSILON) {
            (false, false) => Core::Point(c),
            (true, false) => {
                let r = self.obb.right * e.x;
                Core::Segment(c - r, c + r)
            }
            (false, true) => {
                let u = self.obb.up() * e.y;
                Core::Segment(c - u, c + u)
            }
            (true, true) => Core::Box(self.obb.corners()),
        }
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        self.obb.closest_point(p).distance_squared(p) <= self.radius * self.radius
    }

    /// World-space bounds including the radius.
    pub fn bounds(&self) -> Aabb2 {
        let corners = self.obb.corners();
        let mut min = corners[0];
        let mut max = corners[0];
        for c in &corners[1..] {
            min = min.min(*c);
            max = max.max(*c);
        }
        let r = Vec2::splat(self.radius);
        Aabb2 { min: min - r, max: max + r }
    }
}

/// Closest point to `p` on segment `a`-`b`.
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= EPSILON * EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest points between segments `p1`-`q1` and `p2`-`q2`.
/// Crossing segments return the crossing point twice.
pub fn closest_points_between_segments(p1: Vec2, q1: Vec2, p2: Vec2, q2: Vec2) -> (Vec2, Vec2) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);
    let eps = EPSILON * EPSILON;

    if a <= eps && e <= eps {
        return (p1, p2);
    }

    let (s, t);
    if a <= eps {
        s = 0.0;
        t = (f / e).clamp(0.0, 1.0);
    } else {
        let c = d1.dot(r);
        if e <= eps {
            t = 0.0;
            s = (-c / a).clamp(0.0, 1.0);
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let s0 = if denom.abs() > eps {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t0 = (b * s0 + f) / e;
            if t0 < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t0 > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            } else {
                t = t0;
                s = s0;
            }
        }
    }

    (p1 + d1 * s, p2 + d2 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-4
    }

    #[test]
    fn test_pillbox_core_collapses() {
        let disc = Pillbox2::new(Vec2::ZERO, 1.0, Vec2::ZERO, Vec2::X);
        assert!(matches!(disc.core(), Core::Point(_)));

        let capsule = Pillbox2::new(Vec2::ZERO, 1.0, Vec2::new(2.0, 0.0), Vec2::X);
        match capsule.core() {
            Core::Segment(a, b) => {
                assert!(approx(a, Vec2::new(-2.0, 0.0)));
                assert!(approx(b, Vec2::new(2.0, 0.0)));
            }
            other => panic!("expected segment, got {:?}", other),
        }

        let tall = Pillbox2::new(Vec2::ZERO, 1.0, Vec2::new(0.0, 3.0), Vec2::X);
        assert!(matches!(tall.core(), Core::Segment(_, _)));

        let rounded_box = Pillbox2::new(Vec2::ZERO, 1.0, Vec2::ONE, Vec2::X);
        assert!(matches!(rounded_box.core(), Core::Box(_)));
    }

    #[test]
    fn test_obb_closest_point_rotated() {
        let obb = Obb2::new(Vec2::ZERO, Vec2::new(2.0, 1.0), Vec2::Y);
        // Long axis now points along +Y
        let p = obb.closest_point(Vec2::new(0.0, 10.0));
        assert!(approx(p, Vec2::new(0.0, 2.0)));
        assert!(obb.contains_point(Vec2::new(0.5, 1.5)));
        assert!(!obb.contains_point(Vec2::new(1.5, 0.0)));
    }

    #[test]
    fn test_segment_closest_points_parallel() {
        let (a, b) = closest_points_between_segments(
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(3.0, 2.0),
        );
        assert!((a.distance(b) - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_segment_closest_points_crossing() {
        let (a, b) = closest_points_between_segments(
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(0.0, 1.0),
        );
        assert!(approx(a, Vec2::ZERO));
        assert!(approx(b, Vec2::ZERO));
    }

    #[test]
    fn test_segment_degenerate_to_points() {
        let p = Vec2::new(1.0, 1.0);
        let (a, b) = closest_points_between_segments(p, p, Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0));
        assert!(approx(a, p));
        assert!(approx(b, Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_pillbox_contains_point_and_bounds() {
        let pill = Pillbox2::new(Vec2::ZERO, 0.5, Vec2::new(1.0, 0.0), Vec2::X);
        assert!(pill.contains_point(Vec2::new(1.4, 0.0)));
        assert!(!pill.contains_point(Vec2::new(1.6, 0.0)));
        let b = pill.bounds();
        assert!((b.min.x + 1.5).abs() < 1e-5);
        assert!((b.max.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_core_projection() {
        let core = Core::Segment(Vec2::new(-1.0, 0.0), Vec2::new(3.0, 0.0));
        assert_eq!(core.project(Vec2::X), (-1.0, 3.0));
        assert_eq!(Core::Point(Vec2::new(2.0, 5.0)).project(Vec2::Y), (5.0, 5.0));
    }
}
