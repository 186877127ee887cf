//! 2D Rigid-Body Physics
//!
//! The `PhysicsSystem` owns every rigidbody. Shapes own their transforms and
//! hand them to the system through `TransformSource` for the duration of a
//! step, so bodies never hold references into the shape storage.
//!
//! # Step order
//!
//! 1. Integrate every enabled, effectively dynamic body (forces, gravity,
//!    damping, restrictions, then position and rotation)
//! 2. Test every unordered pair of enabled bodies with colliders, skipping
//!    pairs where both are effectively static
//! 3. Resolve each touching pair immediately and record it as a contact
//!
//! Pair order is the arena's slot order, so the result is deterministic for
//! a given set of bodies.
//!
//! # Module Organization
//!
//! - `rigidbody` - Rigidbody2D, simulation type, material, restrictions
//! - `collider` - Collider2D (disc, AABB, pillbox) in owner-local space
//! - `collision` - Narrow phase and Manifold2
//! - `solver` - Positional correction and impulses

pub mod collider;
pub mod collision;
pub mod rigidbody;
pub mod solver;

pub use collider::{Collider2D, ColliderShape};
pub use collision::{overlap, Manifold2};
pub use rigidbody::{BodyRestrictions, PhysicsMaterial, Rigidbody2D, SimulationType, MIN_MASS};
pub use solver::resolve_contact;

use crate::arena::{Arena, Handle};
use crate::math::{Transform2D, Vec2};

/// Handle to a body inside the `PhysicsSystem`.
pub type BodyHandle = Handle;

/// Where the system finds the transform a body moves.
pub trait TransformSource {
    fn transform(&self, owner: Handle) -> Option<&Transform2D>;
    fn transform_mut(&mut self, owner: Handle) -> Option<&mut Transform2D>;
}

/// A pair that touched during the last step. `manifold.normal` points
/// from `a` toward `b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub manifold: Manifold2,
}

impl Contact {
    pub fn involves(&self, body: BodyHandle) -> bool {
        self.a == body || self.b == body
    }

    /// The body on the other side of this contact from `body`.
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.a == body {
            Some(self.b)
        } else if self.b == body {
            Some(self.a)
        } else {
            None
        }
    }
}

pub struct PhysicsSystem {
    bodies: Arena<Rigidbody2D>,
    contacts: Vec<Contact>,
    gravity: Vec2,
    steps: u64,
}

impl PhysicsSystem {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            bodies: Arena::new(),
            contacts: Vec::new(),
            gravity,
            steps: 0,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    // =========================================================================
    // Bodies
    // =========================================================================

    /// Create a body moving `owner`'s transform.
    pub fn create_rigidbody(&mut self, owner: Handle, mass: f32) -> BodyHandle {
        self.bodies.insert(Rigidbody2D::new(owner, mass))
    }

    /// Remove a body. Contacts naming it are dropped too.
    pub fn remove_rigidbody(&mut self, body: BodyHandle) -> Option<Rigidbody2D> {
        let removed = self.bodies.remove(body);
        if removed.is_some() {
            self.contacts.retain(|c| !c.involves(body));
        }
        removed
    }

    pub fn body(&self, body: BodyHandle) -> Option<&Rigidbody2D> {
        self.bodies.get(body)
    }

    pub fn body_mut(&mut self, body: BodyHandle) -> Option<&mut Rigidbody2D> {
        self.bodies.get_mut(body)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Rigidbody2D)> {
        self.bodies.iter()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Drop every body, e.g. when a map is unloaded.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Contacts found by the last `step`.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// True if `a` and `b` touched during the last step.
    pub fn are_touching(&self, a: BodyHandle, b: BodyHandle) -> bool {
        self.contacts.iter().any(|c| c.involves(a) && c.other(a) == Some(b))
    }

    /// Number of completed steps.
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32, world: &mut impl TransformSource) {
        self.contacts.clear();
        for (_, body) in self.bodies.iter_mut() {
            if let Some(collider) = body.collider_mut() {
                collider.set_colliding(false);
            }
        }

        if dt > 0.0 {
            self.integrate(dt, &mut *world);
        }
        self.detect_and_resolve(&mut *world);
        self.steps += 1;

        log::trace!(
            "physics step {}: {} bodies, {} contacts",
            self.steps,
            self.bodies.len(),
            self.contacts.len()
        );
    }

    fn integrate(&mut self, dt: f32, world: &mut impl TransformSource) {
        let gravity = self.gravity;
        for (handle, body) in self.bodies.iter_mut() {
            if !body.is_enabled() {
                continue;
            }
            match world.transform_mut(body.owner()) {
                Some(transform) => body.integrate(transform, gravity, dt),
                None => log::trace!("body {:?} has no owner transform, skipped", handle),
            }
        }
    }

    fn detect_and_resolve(&mut self, world: &mut impl TransformSource) {
        let handles = self.bodies.handles();
        for (i, &ha) in handles.iter().enumerate() {
            for &hb in &handles[i + 1..] {
                let Some(manifold) = self.test_pair(ha, hb, &*world) else {
                    continue;
                };
                let Some((a, b)) = self.bodies.get2_mut(ha, hb) else {
                    continue;
                };

                for body in [&mut *a, &mut *b] {
                    if let Some(collider) = body.collider_mut() {
                        collider.set_colliding(true);
                    }
                }
                let correction = resolve_contact(a, b, &manifold);
                let (owner_a, owner_b) = (a.owner(), b.owner());

                if let Some(t) = world.transform_mut(owner_a) {
                    t.position += correction.a;
                }
                if let Some(t) = world.transform_mut(owner_b) {
                    t.position += correction.b;
                }
                self.contacts.push(Contact { a: ha, b: hb, manifold });
            }
        }
    }

    /// Narrow-phase test for one pair, or `None` if the pair is skipped or
    /// not touching.
    fn test_pair(&self, ha: BodyHandle, hb: BodyHandle, world: &impl TransformSource) -> Option<Manifold2> {
        let a = self.bodies.get(ha)?;
        let b = self.bodies.get(hb)?;
        if !a.is_enabled() || !b.is_enabled() || (a.is_static() && b.is_static()) {
            return None;
        }
        let (ca, cb) = (a.collider()?, b.collider()?);
        let ta = world.transform(a.owner())?;
        let tb = world.transform(b.owner())?;
        ca.is_touching(ta, cb, tb)
    }
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transforms stored in an arena, indexed by the body's owner handle.
    struct Transforms(Arena<Transform2D>);

    impl TransformSource for Transforms {
        fn transform(&self, owner: Handle) -> Option<&Transform2D> {
            self.0.get(owner)
        }
        fn transform_mut(&mut self, owner: Handle) -> Option<&mut Transform2D> {
            self.0.get_mut(owner)
        }
    }

    fn spawn_disc(
        physics: &mut PhysicsSystem,
        world: &mut Transforms,
        pos: Vec2,
        radius: f32,
        sim_type: SimulationType,
    ) -> BodyHandle {
        let owner = world.0.insert(Transform2D::from_position(pos));
        let body = physics.create_rigidbody(owner, 1.0);
        let b = physics.body_mut(body).unwrap();
        b.set_original_simulation_type(sim_type);
        b.set_collider(Collider2D::disc(Vec2::ZERO, radius));
        body
    }

    #[test]
    fn test_overlapping_discs_are_pushed_apart() {
        let mut physics = PhysicsSystem::default();
        let mut world = Transforms(Arena::new());
        let a = spawn_disc(&mut physics, &mut world, Vec2::ZERO, 1.0, SimulationType::Dynamic);
        let b = spawn_disc(&mut physics, &mut world, Vec2::new(1.5, 0.0), 1.0, SimulationType::Dynamic);

        physics.step(0.0, &mut world);
        assert_eq!(physics.contacts().len(), 1);
        assert!((physics.contacts()[0].manifold.depth - 0.5).abs() < 1e-5);
        assert!(physics.are_touching(a, b));
        assert!(physics.body(a).unwrap().collider().unwrap().is_colliding());

        let pa = world.0.iter().next().unwrap().1.position;
        assert!((pa.x + 0.25).abs() < 1e-5);

        // Separated now: no contact on the next step
        physics.step(0.0, &mut world);
        assert!(physics.contacts().is_empty());
        assert!(!physics.body(b).unwrap().collider().unwrap().is_colliding());
    }

    #[test]
    fn test_static_pairs_are_skipped() {
        let mut physics = PhysicsSystem::default();
        let mut world = Transforms(Arena::new());
        spawn_disc(&mut physics, &mut world, Vec2::ZERO, 1.0, SimulationType::Static);
        spawn_disc(&mut physics, &mut world, Vec2::new(0.5, 0.0), 1.0, SimulationType::Static);
        physics.step(1.0 / 60.0, &mut world);
        assert!(physics.contacts().is_empty());
    }

    #[test]
    fn test_static_body_is_immovable() {
        let mut physics = PhysicsSystem::new(Vec2::new(0.0, -9.8));
        let mut world = Transforms(Arena::new());
        let wall = spawn_disc(&mut physics, &mut world, Vec2::ZERO, 1.0, SimulationType::Static);
        spawn_disc(&mut physics, &mut world, Vec2::new(0.0, 1.8), 1.0, SimulationType::Dynamic);

        for _ in 0..120 {
            physics.body_mut(wall).unwrap().add_force(Vec2::new(50.0, 50.0));
            physics.step(1.0 / 60.0, &mut world);
        }
        let owner = physics.body(wall).unwrap().owner();
        assert_eq!(world.transform(owner).unwrap().position, Vec2::ZERO);
        assert_eq!(physics.body(wall).unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_frozen_body_does_not_integrate() {
        let mut physics = PhysicsSystem::default();
        let mut world = Transforms(Arena::new());
        let body = spawn_disc(&mut physics, &mut world, Vec2::ZERO, 1.0, SimulationType::Dynamic);
        physics.body_mut(body).unwrap().velocity = Vec2::new(1.0, 0.0);
        physics.body_mut(body).unwrap().set_simulation_type(SimulationType::Static);
        physics.step(1.0, &mut world);
        let owner = physics.body(body).unwrap().owner();
        assert_eq!(world.transform(owner).unwrap().position, Vec2::ZERO);

        physics.body_mut(body).unwrap().reset_simulation_type();
        physics.step(0.5, &mut world);
        assert!(world.transform(owner).unwrap().position.x > 0.0);
    }

    #[test]
    fn test_removed_body_drops_contacts() {
        let mut physics = PhysicsSystem::default();
        let mut world = Transforms(Arena::new());
        let a = spawn_disc(&mut physics, &mut world, Vec2::ZERO, 1.0, SimulationType::Dynamic);
        spawn_disc(&mut physics, &mut world, Vec2::new(1.0, 0.0), 1.0, SimulationType::Static);
        physics.step(0.0, &mut world);
        assert_eq!(physics.contacts().len(), 1);
        assert!(physics.remove_rigidbody(a).is_some());
        assert!(physics.contacts().is_empty());
        assert!(physics.remove_rigidbody(a).is_none());
        assert_eq!(physics.body_count(), 1);
    }
}
