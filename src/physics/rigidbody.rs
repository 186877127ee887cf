//! Rigidbody2D
//!
//! Physical state of one shape: mass, velocities, accumulated force and the
//! material coefficients. The body never integrates itself; the
//! `PhysicsSystem` calls `integrate` once per step with the owner's
//! transform.
//!
//! Simulation type is a two-field state: the authored type (what the level
//! file says) and an optional override (the editor freezes a selected body
//! to STATIC). Clearing the override always restores the authored type.

use crate::arena::Handle;
use crate::math::{finite_or, Transform2D, Vec2};
use super::collider::Collider2D;

/// Smallest mass a body may have. Zero/negative masses are clamped to this.
pub const MIN_MASS: f32 = 0.001;

/// STATIC bodies never move; DYNAMIC bodies are integrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SimulationType {
    #[default]
    Static,
    Dynamic,
}

impl SimulationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationType::Static => "static",
            SimulationType::Dynamic => "dynamic",
        }
    }

    /// Parse the level-file spelling. Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Some(SimulationType::Static),
            "dynamic" => Some(SimulationType::Dynamic),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SimulationType::Static => SimulationType::Dynamic,
            SimulationType::Dynamic => SimulationType::Static,
        }
    }
}

/// Axis locks. A locked component of velocity is zeroed every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BodyRestrictions {
    pub x: bool,
    pub y: bool,
    pub rotation: bool,
}

impl BodyRestrictions {
    pub const NONE: BodyRestrictions = BodyRestrictions { x: false, y: false, rotation: false };

    pub fn new(x: bool, y: bool, rotation: bool) -> Self {
        Self { x, y, rotation }
    }

    /// Zero the locked components of a linear vector.
    pub fn mask(&self, v: Vec2) -> Vec2 {
        Vec2::new(if self.x { 0.0 } else { v.x }, if self.y { 0.0 } else { v.y })
    }
}

/// Surface and damping coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsMaterial {
    /// Bounciness in [0, 1]
    pub restitution: f32,
    /// Coulomb friction coefficient, >= 0
    pub friction: f32,
    /// Linear damping per second, >= 0
    pub drag: f32,
    /// Angular damping per second, >= 0
    pub angular_drag: f32,
}

impl PhysicsMaterial {
    /// Clamp every coefficient into its valid range. Non-finite values fall
    /// back to the defaults.
    pub fn sanitized(self) -> Self {
        let d = PhysicsMaterial::default();
        Self {
            restitution: finite_or(self.restitution, d.restitution).clamp(0.0, 1.0),
            friction: finite_or(self.friction, d.friction).max(0.0),
            drag: finite_or(self.drag, d.drag).max(0.0),
            angular_drag: finite_or(self.angular_drag, d.angular_drag).max(0.0),
        }
    }
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self { restitution: 0.0, friction: 0.2, drag: 0.5, angular_drag: 0.0 }
    }
}

/// Multiplicative damping for one step: in [0, 1], so it never amplifies
/// or reverses a velocity.
pub fn damping_factor(drag: f32, dt: f32) -> f32 {
    (1.0 - drag.max(0.0) * dt.max(0.0)).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct Rigidbody2D {
    /// The shape whose transform this body moves
    owner: Handle,
    mass: f32,
    inverse_mass: f32,
    pub velocity: Vec2,
    /// Degrees per second
    pub angular_velocity: f32,
    force: Vec2,
    material: PhysicsMaterial,
    authored_type: SimulationType,
    override_type: Option<SimulationType>,
    restrictions: BodyRestrictions,
    collider: Option<Collider2D>,
    enabled: bool,
}

impl Rigidbody2D {
    pub fn new(owner: Handle, mass: f32) -> Self {
        let mut body = Self {
            owner,
            mass: 1.0,
            inverse_mass: 1.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            material: PhysicsMaterial::default(),
            authored_type: SimulationType::Static,
            override_type: None,
            restrictions: BodyRestrictions::NONE,
            collider: None,
            enabled: true,
        };
        body.set_mass(mass);
        body
    }

    pub fn owner(&self) -> Handle {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Handle) {
        self.owner = owner;
    }

    // =========================================================================
    // Mass
    // =========================================================================

    /// Set mass and recompute the inverse. Non-finite or non-positive
    /// masses are clamped to `MIN_MASS`.
    pub fn set_mass(&mut self, mass: f32) {
        let clamped = if mass.is_finite() { mass.max(MIN_MASS) } else { MIN_MASS };
        if clamped != mass {
            log::warn!("Rigidbody2D: mass {} clamped to {}", mass, clamped);
        }
        self.mass = clamped;
        self.inverse_mass = 1.0 / clamped;
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Inverse mass as seen by the solver: zero while effectively static.
    pub fn effective_inverse_mass(&self) -> f32 {
        if self.is_static() {
            0.0
        } else {
            self.inverse_mass
        }
    }

    // =========================================================================
    // Forces
    // =========================================================================

    /// Accumulate a force for the next step. Ignored on static bodies.
    pub fn add_force(&mut self, force: Vec2) {
        if self.is_static() || !force.is_finite() {
            return;
        }
        self.force += force;
    }

    pub fn force(&self) -> Vec2 {
        self.force
    }

    // =========================================================================
    // Material
    // =========================================================================

    pub fn set_material(&mut self, material: PhysicsMaterial) {
        self.material = material.sanitized();
    }

    pub fn material(&self) -> PhysicsMaterial {
        self.material
    }

    // =========================================================================
    // Simulation type
    // =========================================================================

    /// Set the authored type (level file / editor spawn).
    pub fn set_original_simulation_type(&mut self, sim_type: SimulationType) {
        self.authored_type = sim_type;
    }

    pub fn original_simulation_type(&self) -> SimulationType {
        self.authored_type
    }

    /// Temporarily override the type. The authored type is untouched.
    pub fn set_simulation_type(&mut self, sim_type: SimulationType) {
        self.override_type = Some(sim_type);
    }

    /// Drop the override and go back to the authored type.
    pub fn reset_simulation_type(&mut self) {
        self.override_type = None;
    }

    /// Effective type: the override if set, else the authored type.
    pub fn simulation_type(&self) -> SimulationType {
        self.override_type.unwrap_or(self.authored_type)
    }

    pub fn is_static(&self) -> bool {
        self.simulation_type() == SimulationType::Static
    }

    pub fn is_overridden(&self) -> bool {
        self.override_type.is_some()
    }

    // =========================================================================
    // Restrictions
    // =========================================================================

    pub fn set_restrictions(&mut self, x: bool, y: bool, rotation: bool) {
        self.restrictions = BodyRestrictions::new(x, y, rotation);
        self.apply_restrictions();
    }

    pub fn restrictions(&self) -> BodyRestrictions {
        self.restrictions
    }

    /// Zero the locked velocity components.
    pub fn apply_restrictions(&mut self) {
        self.velocity = self.restrictions.mask(self.velocity);
        if self.restrictions.rotation {
            self.angular_velocity = 0.0;
        }
    }

    // =========================================================================
    // Collider
    // =========================================================================

    /// Attach a collider, replacing any previous one.
    pub fn set_collider(&mut self, collider: Collider2D) -> &mut Collider2D {
        self.collider.insert(collider)
    }

    /// Swap in a new collider, returning the old one.
    pub fn replace_collider(&mut self, collider: Collider2D) -> Option<Collider2D> {
        self.collider.replace(collider)
    }

    pub fn collider(&self) -> Option<&Collider2D> {
        self.collider.as_ref()
    }

    pub fn collider_mut(&mut self) -> Option<&mut Collider2D> {
        self.collider.as_mut()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    // =========================================================================
    // Integration
    // =========================================================================

    /// Advance one step: forces into velocity, damping, restrictions, then
    /// velocity into the owner's transform. Static bodies are left alone.
    /// The force buffer is cleared either way.
    pub fn integrate(&mut self, transform: &mut Transform2D, gravity: Vec2, dt: f32) {
        if self.is_static() || dt <= 0.0 {
            self.force = Vec2::ZERO;
            return;
        }

        let acceleration = self.force * self.inverse_mass + gravity;
        self.velocity += acceleration * dt;
        self.velocity *= damping_factor(self.material.drag, dt);
        self.angular_velocity *= damping_factor(self.material.angular_drag, dt);
        self.apply_restrictions();

        if !self.velocity.is_finite() {
            self.velocity = Vec2::ZERO;
        }
        if !self.angular_velocity.is_finite() {
            self.angular_velocity = 0.0;
        }

        transform.position += self.velocity * dt;
        transform.rotation += self.angular_velocity * dt;
        self.force = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic_body() -> Rigidbody2D {
        let mut body = Rigidbody2D::new(Handle::NULL, 1.0);
        body.set_original_simulation_type(SimulationType::Dynamic);
        body
    }

    #[test]
    fn test_mass_is_clamped() {
        let mut body = Rigidbody2D::new(Handle::NULL, 0.0);
        assert_eq!(body.mass(), MIN_MASS);
        body.set_mass(-3.0);
        assert_eq!(body.mass(), MIN_MASS);
        body.set_mass(f32::NAN);
        assert_eq!(body.mass(), MIN_MASS);
        body.set_mass(4.0);
        assert!((body.effective_inverse_mass() - 0.0).abs() < 1e-6); // static
        body.set_original_simulation_type(SimulationType::Dynamic);
        assert!((body.effective_inverse_mass() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_add_force_ignored_when_static() {
        let mut body = Rigidbody2D::new(Handle::NULL, 1.0);
        body.add_force(Vec2::new(5.0, 0.0));
        assert_eq!(body.force(), Vec2::ZERO);

        let mut body = dynamic_body();
        body.add_force(Vec2::new(5.0, 0.0));
        body.add_force(Vec2::new(0.0, 1.0));
        assert_eq!(body.force(), Vec2::new(5.0, 1.0));
    }

    #[test]
    fn test_override_restores_authored_type() {
        let mut body = dynamic_body();
        body.set_simulation_type(SimulationType::Static);
        assert!(body.is_static());
        assert_eq!(body.original_simulation_type(), SimulationType::Dynamic);

        // Overriding twice still restores the authored type
        body.set_simulation_type(SimulationType::Static);
        body.reset_simulation_type();
        assert_eq!(body.simulation_type(), SimulationType::Dynamic);
        assert!(!body.is_overridden());
    }

    #[test]
    fn test_static_body_never_moves() {
        let mut body = Rigidbody2D::new(Handle::NULL, 1.0);
        body.velocity = Vec2::new(3.0, 3.0);
        body.angular_velocity = 90.0;
        let mut t = Transform2D::from_position(Vec2::new(1.0, 2.0));
        for _ in 0..100 {
            body.add_force(Vec2::new(100.0, -50.0));
            body.integrate(&mut t, Vec2::new(0.0, -9.8), 1.0 / 60.0);
        }
        assert_eq!(t.position, Vec2::new(1.0, 2.0));
        assert_eq!(t.rotation, 0.0);
    }

    #[test]
    fn test_damping_never_amplifies() {
        for drag in [0.0, 0.1, 0.5, 1.0, 10.0, 1000.0] {
            for dt in [1.0 / 120.0, 1.0 / 60.0, 0.1, 1.0] {
                let mut body = dynamic_body();
                body.set_material(PhysicsMaterial { drag, angular_drag: drag, ..Default::default() });
                body.velocity = Vec2::new(3.0, -4.0);
                body.angular_velocity = -45.0;
                let before = body.velocity.length();
                let mut t = Transform2D::IDENTITY;
                body.integrate(&mut t, Vec2::ZERO, dt);
                assert!(body.velocity.length() <= before + 1e-6, "drag {} dt {}", drag, dt);
                // Never reverses direction
                assert!(body.velocity.x >= 0.0 && body.velocity.y <= 0.0);
                assert!(body.angular_velocity <= 0.0 && body.angular_velocity >= -45.0);
            }
        }
    }

    #[test]
    fn test_integration_moves_and_clears_force() {
        let mut body = dynamic_body();
        body.set_material(PhysicsMaterial { drag: 0.0, ..Default::default() });
        body.add_force(Vec2::new(2.0, 0.0));
        let mut t = Transform2D::IDENTITY;
        body.integrate(&mut t, Vec2::ZERO, 0.5);
        // v = 2 * 0.5 = 1, x = 1 * 0.5
        assert!((body.velocity.x - 1.0).abs() < 1e-6);
        assert!((t.position.x - 0.5).abs() < 1e-6);
        assert_eq!(body.force(), Vec2::ZERO);
    }

    #[test]
    fn test_restrictions_zero_locked_axes() {
        let mut body = dynamic_body();
        body.set_material(PhysicsMaterial { drag: 0.0, ..Default::default() });
        body.set_restrictions(true, false, true);
        body.velocity = Vec2::new(5.0, 5.0);
        body.angular_velocity = 30.0;
        let mut t = Transform2D::IDENTITY;
        body.integrate(&mut t, Vec2::ZERO, 1.0);
        assert_eq!(t.position.x, 0.0);
        assert!((t.position.y - 5.0).abs() < 1e-6);
        assert_eq!(t.rotation, 0.0);
    }

    #[test]
    fn test_material_is_sanitized() {
        let mut body = dynamic_body();
        body.set_material(PhysicsMaterial {
            restitution: 3.0,
            friction: -1.0,
            drag: f32::NAN,
            angular_drag: -0.5,
        });
        let m = body.material();
        assert_eq!(m.restitution, 1.0);
        assert_eq!(m.friction, 0.0);
        assert_eq!(m.drag, 0.5);
        assert_eq!(m.angular_drag, 0.0);
    }

    #[test]
    fn test_simulation_type_parse() {
        assert_eq!(SimulationType::parse("Dynamic"), Some(SimulationType::Dynamic));
        assert_eq!(SimulationType::parse(" static "), Some(SimulationType::Static));
        assert_eq!(SimulationType::parse("kinematic"), None);
    }
}
