//! Contact resolution
//!
//! One pass per contact: split the positional correction by inverse mass,
//! then exchange a normal impulse (with restitution) and a clamped friction
//! impulse. Effectively static bodies have zero inverse mass and so take
//! no share of either.

use crate::math::Vec2;
use super::collision::Manifold2;
use super::rigidbody::Rigidbody2D;

/// Combined bounciness of two surfaces.
pub fn combine_restitution(a: f32, b: f32) -> f32 {
    a * b
}

/// Combined friction of two surfaces.
pub fn combine_friction(a: f32, b: f32) -> f32 {
    (a * b).max(0.0).sqrt()
}

/// Positional corrections for A and B, in that order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub a: Vec2,
    pub b: Vec2,
}

impl Correction {
    pub const NONE: Correction = Correction { a: Vec2::ZERO, b: Vec2::ZERO };
}

/// Resolve one contact between `a` and `b`. Velocities are updated in
/// place; the caller applies the returned corrections to the owners'
/// transforms.
pub fn resolve_contact(a: &mut Rigidbody2D, b: &mut Rigidbody2D, manifold: &Manifold2) -> Correction {
    let ia = a.effective_inverse_mass();
    let ib = b.effective_inverse_mass();
    let total = ia + ib;
    if total <= 0.0 {
        return Correction::NONE;
    }

    let n = manifold.normal;
    let correction = Correction {
        a: a.restrictions().mask(-n * manifold.depth * (ia / total)),
        b: b.restrictions().mask(n * manifold.depth * (ib / total)),
    };

    let relative = b.velocity - a.velocity;
    let approach = relative.dot(n);
    if approach < 0.0 {
        let ma = a.material();
        let mb = b.material();
        let e = combine_restitution(ma.restitution, mb.restitution);
        let j = -(1.0 + e) * approach / total;
        a.velocity -= n * j * ia;
        b.velocity += n * j * ib;

        if let Some(tangent) = (relative - n * approach).try_normalize() {
            let mu = combine_friction(ma.friction, mb.friction);
            let jt = (-relative.dot(tangent) / total).clamp(-j * mu, j * mu);
            a.velocity -= tangent * jt * ia;
            b.velocity += tangent * jt * ib;
        }
    }

    a.apply_restrictions();
    b.apply_restrictions();
    correction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Handle;
    use crate::physics::rigidbody::{PhysicsMaterial, SimulationType};

    fn body(sim_type: SimulationType, mass: f32) -> Rigidbody2D {
        let mut b = Rigidbody2D::new(Handle::NULL, mass);
        b.set_original_simulation_type(sim_type);
        b
    }

    #[test]
    fn test_combine_rules() {
        assert_eq!(combine_restitution(0.5, 0.5), 0.25);
        assert!((combine_friction(0.25, 1.0) - 0.5).abs() < 1e-6);
        assert_eq!(combine_friction(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_correction_split_by_inverse_mass() {
        let mut a = body(SimulationType::Dynamic, 1.0);
        let mut b = body(SimulationType::Dynamic, 3.0);
        let m = Manifold2::new(Vec2::X, 0.8);
        let c = resolve_contact(&mut a, &mut b, &m);
        // ia = 1, ib = 1/3: A takes 3/4 of the depth
        assert!((c.a.x + 0.6).abs() < 1e-5);
        assert!((c.b.x - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_static_body_takes_nothing() {
        let mut wall = body(SimulationType::Static, 1.0);
        let mut ball = body(SimulationType::Dynamic, 1.0);
        ball.velocity = Vec2::new(-2.0, 0.0);
        let c = resolve_contact(&mut wall, &mut ball, &Manifold2::new(Vec2::X, 0.5));
        assert_eq!(c.a, Vec2::ZERO);
        assert!((c.b.x - 0.5).abs() < 1e-6);
        assert_eq!(wall.velocity, Vec2::ZERO);
        // Inelastic by default: approach speed removed
        assert!(ball.velocity.x.abs() < 1e-5);
    }

    #[test]
    fn test_both_static_is_noop() {
        let mut a = body(SimulationType::Static, 1.0);
        let mut b = body(SimulationType::Static, 1.0);
        assert_eq!(resolve_contact(&mut a, &mut b, &Manifold2::new(Vec2::Y, 1.0)), Correction::NONE);
    }

    #[test]
    fn test_restitution_bounces() {
        let mut wall = body(SimulationType::Static, 1.0);
        wall.set_material(PhysicsMaterial { restitution: 1.0, ..Default::default() });
        let mut ball = body(SimulationType::Dynamic, 1.0);
        ball.set_material(PhysicsMaterial { restitution: 1.0, ..Default::default() });
        ball.velocity = Vec2::new(0.0, -3.0);
        resolve_contact(&mut wall, &mut ball, &Manifold2::new(Vec2::Y, 0.1));
        assert!((ball.velocity.y - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_separating_bodies_keep_velocity() {
        let mut a = body(SimulationType::Dynamic, 1.0);
        let mut b = body(SimulationType::Dynamic, 1.0);
        b.velocity = Vec2::new(1.0, 0.0);
        resolve_contact(&mut a, &mut b, &Manifold2::new(Vec2::X, 0.1));
        assert_eq!(b.velocity, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_restricted_axis_gets_no_correction() {
        let mut a = body(SimulationType::Dynamic, 1.0);
        a.set_restrictions(true, false, false);
        let mut b = body(SimulationType::Static, 1.0);
        let c = resolve_contact(&mut a, &mut b, &Manifold2::new(Vec2::new(1.0, 1.0).normalize(), 1.0));
        assert_eq!(c.a.x, 0.0);
        assert!(c.a.y < 0.0);
    }
}
