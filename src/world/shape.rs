//! Shape entities
//!
//! A shape is the game-facing object: it owns a transform and one
//! rigidbody (by handle into the `PhysicsSystem`), and carries the gameplay
//! state: alignment, health, selection, and the dead/garbage flags.
//!
//! Lifecycle: alive → dead/garbage → removed. `die()` and `mark_garbage()`
//! only flag the shape; the `Map` sweep removes it and its body later.

use macroquad::color::{Color, BLACK, BLUE, MAGENTA, MAROON, RED, WHITE, YELLOW};

use crate::input::{GameKey, InputQuery};
use crate::math::{Aabb2, Pillbox2, Transform2D, Vec2};
use crate::physics::{BodyHandle, ColliderShape, PhysicsSystem, SimulationType};
use crate::render::{add_verts_for_pillbox, RenderContext, Vertex2D};

/// Faction tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Alignment {
    Player,
    #[default]
    Neutral,
    Ally,
    Enemy,
}

impl Alignment {
    pub const ALL: [Alignment; 4] = [Alignment::Player, Alignment::Neutral, Alignment::Ally, Alignment::Enemy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Player => "player",
            Alignment::Neutral => "neutral",
            Alignment::Ally => "ally",
            Alignment::Enemy => "enemy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|a| a.as_str().eq_ignore_ascii_case(s))
    }

    /// Next alignment in editor cycling order.
    pub fn next(self) -> Self {
        match self {
            Alignment::Player => Alignment::Neutral,
            Alignment::Neutral => Alignment::Ally,
            Alignment::Ally => Alignment::Enemy,
            Alignment::Enemy => Alignment::Player,
        }
    }
}

/// Concrete shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Rounded box around a pillbox collider
    Pill,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Pill => "pill",
        }
    }
}

pub const DEFAULT_HEALTH: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct Shape {
    pub transform: Transform2D,
    kind: ShapeKind,
    body: BodyHandle,
    alignment: Alignment,
    health: f32,
    collision_damage: f32,
    movement_speed: f32,
    /// Seconds left before player input is read again
    input_suppression: f32,
    selected: bool,
    is_dead: bool,
    is_garbage: bool,
}

impl Shape {
    pub fn new(kind: ShapeKind, transform: Transform2D, body: BodyHandle, alignment: Alignment) -> Self {
        Self {
            transform,
            kind,
            body,
            alignment,
            health: DEFAULT_HEALTH,
            collision_damage: 0.0,
            movement_speed: 0.0,
            input_suppression: 0.0,
            selected: false,
            is_dead: false,
            is_garbage: false,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Fixed once the shape exists.
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn is_player(&self) -> bool {
        self.alignment == Alignment::Player
    }

    // =========================================================================
    // Transform
    // =========================================================================

    pub fn position(&self) -> Vec2 {
        self.transform.position
    }

    /// No validation; callers clamp.
    pub fn set_position(&mut self, position: Vec2) {
        self.transform.position = position;
    }

    pub fn set_transform(&mut self, transform: Transform2D) {
        self.transform = transform;
    }

    // =========================================================================
    // Health
    // =========================================================================

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn set_health(&mut self, health: f32) {
        self.health = health;
    }

    /// Subtract `amount` from health. Returns true if this killed the shape.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.health -= amount;
        if self.health <= 0.0 && !self.is_dead {
            self.die();
            return true;
        }
        false
    }

    pub fn die(&mut self) {
        self.is_dead = true;
        self.is_garbage = true;
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    pub fn is_garbage(&self) -> bool {
        self.is_garbage
    }

    pub fn mark_garbage(&mut self) {
        self.is_garbage = true;
    }

    pub fn collision_damage(&self) -> f32 {
        self.collision_damage
    }

    pub fn set_collision_damage(&mut self, damage: f32) {
        self.collision_damage = damage.max(0.0);
    }

    pub fn movement_speed(&self) -> f32 {
        self.movement_speed
    }

    pub fn set_movement_speed(&mut self, speed: f32) {
        self.movement_speed = speed.max(0.0);
    }

    /// Ignore movement input for `seconds` (the longer of the current and
    /// new timer wins).
    pub fn suppress_input(&mut self, seconds: f32) {
        self.input_suppression = self.input_suppression.max(seconds);
    }

    pub fn is_input_suppressed(&self) -> bool {
        self.input_suppression > 0.0
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    // =========================================================================
    // Per-frame
    // =========================================================================

    /// Tick timers and, for the player, turn movement keys into force.
    pub fn update(&mut self, dt: f32, input: &dyn InputQuery, physics: &mut PhysicsSystem) {
        self.input_suppression = (self.input_suppression - dt).max(0.0);
        if !self.is_player() || !self.is_alive() || self.is_input_suppressed() {
            return;
        }

        let mut dir = Vec2::ZERO;
        if input.is_key_down(GameKey::Up) {
            dir.y += 1.0;
        }
        if input.is_key_down(GameKey::Down) {
            dir.y -= 1.0;
        }
        if input.is_key_down(GameKey::Right) {
            dir.x += 1.0;
        }
        if input.is_key_down(GameKey::Left) {
            dir.x -= 1.0;
        }
        let Some(dir) = dir.try_normalize() else {
            return;
        };
        if let Some(body) = physics.body_mut(self.body) {
            let force = dir * self.movement_speed * body.mass();
            body.add_force(force);
        }
    }

    /// Collider resolved against this shape's transform.
    pub fn world_shape(&self, physics: &PhysicsSystem) -> Option<ColliderShape> {
        let collider = physics.body(self.body)?.collider()?;
        Some(collider.world_shape(&self.transform))
    }

    pub fn contains_point(&self, physics: &PhysicsSystem, p: Vec2) -> bool {
        self.world_shape(physics).is_some_and(|s| s.contains_point(p))
    }

    /// True when the collider no longer overlaps the map bounds at all.
    pub fn is_out_of_bounds(&self, bounds: &Aabb2, physics: &PhysicsSystem) -> bool {
        match self.world_shape(physics) {
            Some(shape) => !shape.bounds().overlaps(bounds),
            None => !bounds.contains_point(self.position()),
        }
    }

    /// Debug color: selection, then simulation type and contact state.
    pub fn debug_color(&self, physics: &PhysicsSystem) -> Color {
        if self.selected {
            return WHITE;
        }
        if !self.is_alive() {
            return MAROON;
        }
        let Some(body) = physics.body(self.body) else {
            return MAROON;
        };
        let colliding = body.collider().is_some_and(|c| c.is_colliding());
        match (body.simulation_type(), colliding) {
            (SimulationType::Dynamic, true) => RED,
            (SimulationType::Dynamic, false) => BLUE,
            (SimulationType::Static, true) => MAGENTA,
            (SimulationType::Static, false) => YELLOW,
        }
    }

    /// Border color shows the alignment.
    pub fn border_color(&self) -> Color {
        match self.alignment {
            Alignment::Player => Color::new(0.2, 1.0, 0.3, 1.0),
            Alignment::Neutral => BLACK,
            Alignment::Ally => Color::new(0.3, 0.8, 1.0, 1.0),
            Alignment::Enemy => Color::new(1.0, 0.4, 0.1, 1.0),
        }
    }

    pub fn render(&self, physics: &PhysicsSystem, ctx: &mut dyn RenderContext) {
        let Some(world) = self.world_shape(physics) else {
            return;
        };
        let mut verts: Vec<Vertex2D> = Vec::new();
        match self.kind {
            ShapeKind::Pill => {
                let pill: Pillbox2 = world.as_pillbox();
                add_verts_for_pillbox(&mut verts, &pill, self.debug_color(physics), self.border_color());
            }
        }
        ctx.bind_material("default");
        ctx.draw_vertex_array(&verts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Handle;
    use crate::input::NoInput;
    use crate::physics::Collider2D;

    /// Key state for driving player movement in tests.
    struct HeldKeys(Vec<GameKey>);

    impl InputQuery for HeldKeys {
        fn mouse_world_position(&self) -> Vec2 {
            Vec2::ZERO
        }
        fn is_key_down(&self, key: GameKey) -> bool {
            self.0.contains(&key)
        }
        fn was_key_pressed(&self, _key: GameKey) -> bool {
            false
        }
    }

    fn pill_with_body(physics: &mut PhysicsSystem, alignment: Alignment) -> Shape {
        let body = physics.create_rigidbody(Handle::NULL, 2.0);
        let b = physics.body_mut(body).unwrap();
        b.set_original_simulation_type(SimulationType::Dynamic);
        b.set_collider(Collider2D::pillbox(Vec2::ZERO, 0.5, Vec2::new(1.0, 0.0), Vec2::X));
        Shape::new(ShapeKind::Pill, Transform2D::IDENTITY, body, alignment)
    }

    #[test]
    fn test_take_damage_kills_once() {
        let mut physics = PhysicsSystem::default();
        let mut shape = pill_with_body(&mut physics, Alignment::Enemy);
        assert!(!shape.take_damage(0.4));
        assert!(shape.is_alive());
        assert!(shape.take_damage(0.6));
        assert!(!shape.is_alive());
        assert!(shape.is_garbage());
        assert!(!shape.take_damage(1.0));
    }

    #[test]
    fn test_mark_garbage_keeps_alive() {
        let mut physics = PhysicsSystem::default();
        let mut shape = pill_with_body(&mut physics, Alignment::Neutral);
        shape.mark_garbage();
        assert!(shape.is_garbage());
        assert!(shape.is_alive());
    }

    #[test]
    fn test_alignment_cycle_and_parse() {
        let mut a = Alignment::Player;
        for _ in 0..4 {
            a = a.next();
        }
        assert_eq!(a, Alignment::Player);
        assert_eq!(Alignment::parse("ENEMY"), Some(Alignment::Enemy));
        assert_eq!(Alignment::parse("boss"), None);
    }

    #[test]
    fn test_player_movement_pushes_body() {
        let mut physics = PhysicsSystem::default();
        let mut shape = pill_with_body(&mut physics, Alignment::Player);
        shape.set_movement_speed(5.0);
        shape.update(0.016, &HeldKeys(vec![GameKey::Right]), &mut physics);
        // force = dir * speed * mass
        assert_eq!(physics.body(shape.body()).unwrap().force(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_suppressed_or_non_player_ignores_input() {
        let mut physics = PhysicsSystem::default();
        let mut player = pill_with_body(&mut physics, Alignment::Player);
        player.set_movement_speed(5.0);
        player.suppress_input(0.5);
        player.update(0.1, &HeldKeys(vec![GameKey::Up]), &mut physics);
        assert_eq!(physics.body(player.body()).unwrap().force(), Vec2::ZERO);
        assert!(player.is_input_suppressed());

        let mut ally = pill_with_body(&mut physics, Alignment::Ally);
        ally.set_movement_speed(5.0);
        ally.update(0.1, &HeldKeys(vec![GameKey::Up]), &mut physics);
        assert_eq!(physics.body(ally.body()).unwrap().force(), Vec2::ZERO);

        ally.update(0.1, &NoInput, &mut physics);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut physics = PhysicsSystem::default();
        let mut shape = pill_with_body(&mut physics, Alignment::Neutral);
        let bounds = Aabb2::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        shape.set_position(Vec2::new(5.0, 5.0));
        assert!(!shape.is_out_of_bounds(&bounds, &physics));
        // Partly outside still counts as inside
        shape.set_position(Vec2::new(-1.0, 5.0));
        assert!(!shape.is_out_of_bounds(&bounds, &physics));
        shape.set_position(Vec2::new(-5.0, 5.0));
        assert!(shape.is_out_of_bounds(&bounds, &physics));
    }

    #[test]
    fn test_debug_colors() {
        let mut physics = PhysicsSystem::default();
        let mut shape = pill_with_body(&mut physics, Alignment::Neutral);
        assert_eq!(shape.debug_color(&physics), BLUE);
        physics.body_mut(shape.body()).unwrap().set_simulation_type(SimulationType::Static);
        assert_eq!(shape.debug_color(&physics), YELLOW);
        shape.set_selected(true);
        assert_eq!(shape.debug_color(&physics), WHITE);
    }
}
