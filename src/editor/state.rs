//! Editor state
//!
//! Everything the editor remembers between frames: the parameters the next
//! shape will be built with, and the mouse gesture in progress.

use macroquad::color::Color;

use crate::config::EditorConfig;
use crate::context::GameContext;
use crate::events::EventArgs;
use crate::input::{GameKey, InputQuery};
use crate::math::{Pillbox2, Vec2};
use crate::physics::{PhysicsSystem, SimulationType};
use crate::render::{add_verts_for_pillbox, RenderContext};
use crate::world::{Alignment, ColliderRecord, Map, RigidbodyRecord, ShapeHandle, ShapeRecord, TransformRecord};

/// Drags shorter than this spawn a round pill at the click point.
pub const MIN_DRAG: f32 = 0.05;

const PREVIEW_FILL: Color = Color::new(1.0, 1.0, 1.0, 0.25);

/// Mouse gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Idle,
    /// Dragging out a new shape from `start`
    Constructing { start: Vec2 },
    /// Moving a selected shape; `offset` is shape position minus cursor
    Dragging { shape: ShapeHandle, offset: Vec2 },
}

pub struct EditorState {
    config: EditorConfig,
    radius: f32,
    mass: f32,
    restitution: f32,
    friction: f32,
    drag: f32,
    angular_drag: f32,
    /// Simulation type of the next spawned shape
    sim_type: SimulationType,
    /// Alignment of the next spawned shape
    alignment: Alignment,
    gesture: Gesture,
    cursor: Vec2,
}

impl EditorState {
    pub fn new(config: &EditorConfig) -> Self {
        let mut state = Self {
            config: config.clone(),
            radius: 0.0,
            mass: 0.0,
            restitution: 0.0,
            friction: 0.0,
            drag: 0.0,
            angular_drag: 0.0,
            sim_type: SimulationType::Dynamic,
            alignment: Alignment::Neutral,
            gesture: Gesture::Idle,
            cursor: Vec2::ZERO,
        };
        state.set_radius(config.radius);
        state.set_mass(config.mass);
        state.set_restitution(config.restitution);
        state.set_friction(config.friction);
        state.set_drag(config.drag);
        state.set_angular_drag(config.angular_drag);
        state
    }

    // =========================================================================
    // Spawn parameters (all clamped to the configured limits)
    // =========================================================================

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = self.config.radius_limits.clamp(radius);
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = self.config.mass_limits.clamp(mass);
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = self.config.restitution_limits.clamp(restitution);
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn set_friction(&mut self, friction: f32) {
        self.friction = self.config.friction_limits.clamp(friction);
    }

    pub fn drag(&self) -> f32 {
        self.drag
    }

    pub fn set_drag(&mut self, drag: f32) {
        self.drag = self.config.drag_limits.clamp(drag);
    }

    pub fn angular_drag(&self) -> f32 {
        self.angular_drag
    }

    pub fn set_angular_drag(&mut self, angular_drag: f32) {
        self.angular_drag = self.config.angular_drag_limits.clamp(angular_drag);
    }

    pub fn sim_type(&self) -> SimulationType {
        self.sim_type
    }

    pub fn toggle_sim_type(&mut self) {
        self.sim_type = self.sim_type.toggled();
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn cycle_alignment(&mut self) {
        self.alignment = self.alignment.next();
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Level record for a pill filling the rectangle `start`..`end`, built
    /// with the current parameters. Tiny drags give a round pill centered
    /// on `start`.
    pub fn build_record(&self, start: Vec2, end: Vec2) -> ShapeRecord {
        let size = (end - start).abs();
        let (center, extents) = if size.max_element() < MIN_DRAG {
            (start, Vec2::ZERO)
        } else {
            ((start + end) * 0.5, (size * 0.5 - Vec2::splat(self.radius)).max(Vec2::ZERO))
        };

        ShapeRecord {
            rigidbody: RigidbodyRecord {
                restitution: self.restitution,
                friction: self.friction,
                mass: self.mass,
                angular_drag: self.angular_drag,
                drag: self.drag,
                angular_velocity: 0.0,
                sim_type: self.sim_type,
                ..Default::default()
            },
            collider: ColliderRecord {
                radius: self.radius,
                extents,
                local_center: Vec2::ZERO,
                local_right: Vec2::X,
            },
            transform: TransformRecord {
                position: center,
                alignment: self.alignment,
                ..Default::default()
            },
        }
    }

    /// The pill the current construction drag would spawn.
    pub fn preview(&self) -> Option<Pillbox2> {
        let Gesture::Constructing { start } = self.gesture else {
            return None;
        };
        let rec = self.build_record(start, self.cursor);
        let c = rec.collider;
        Some(Pillbox2::new(rec.transform.position + c.local_center, c.radius, c.extents, c.local_right))
    }

    // =========================================================================
    // Per-frame
    // =========================================================================

    /// Apply this frame's editor input to `map`.
    pub fn update(&mut self, map: &mut Map, input: &dyn InputQuery, ctx: &mut GameContext) {
        self.cursor = input.mouse_world_position();
        self.handle_keys(map, input, ctx);

        if input.was_mouse_pressed() {
            self.begin_gesture(map, ctx);
        }
        if let Gesture::Dragging { shape, offset } = self.gesture {
            let target = (self.cursor + offset).clamp(Vec2::ZERO, map.map_dims());
            match map.shape_mut(shape) {
                Some(s) => s.set_position(target),
                None => self.gesture = Gesture::Idle,
            }
        }
        if input.was_mouse_released() {
            self.end_gesture(map, ctx);
        }
    }

    fn handle_keys(&mut self, map: &mut Map, input: &dyn InputQuery, ctx: &mut GameContext) {
        if input.was_key_pressed(GameKey::CycleAlignment) {
            self.cycle_alignment();
            log::debug!("Editor: next alignment {}", self.alignment.as_str());
        }
        if input.was_key_pressed(GameKey::ToggleSimType) {
            self.toggle_sim_type();
            log::debug!("Editor: next simulation type {}", self.sim_type.as_str());
        }
        if input.was_key_pressed(GameKey::RadiusUp) {
            self.set_radius(self.radius + self.config.radius_step);
        }
        if input.was_key_pressed(GameKey::RadiusDown) {
            self.set_radius(self.radius - self.config.radius_step);
        }
        if input.was_key_pressed(GameKey::MassUp) {
            self.set_mass(self.mass + self.config.mass_step);
        }
        if input.was_key_pressed(GameKey::MassDown) {
            self.set_mass(self.mass - self.config.mass_step);
        }
        let step = self.config.material_step;
        if input.was_key_pressed(GameKey::RestitutionUp) {
            self.set_restitution(self.restitution + step);
        }
        if input.was_key_pressed(GameKey::RestitutionDown) {
            self.set_restitution(self.restitution - step);
        }
        if input.was_key_pressed(GameKey::FrictionUp) {
            self.set_friction(self.friction + step);
        }
        if input.was_key_pressed(GameKey::FrictionDown) {
            self.set_friction(self.friction - step);
        }
        if input.was_key_pressed(GameKey::DragUp) {
            self.set_drag(self.drag + step);
        }
        if input.was_key_pressed(GameKey::DragDown) {
            self.set_drag(self.drag - step);
        }
        if input.was_key_pressed(GameKey::AngularDragUp) {
            self.set_angular_drag(self.angular_drag + step);
        }
        if input.was_key_pressed(GameKey::AngularDragDown) {
            self.set_angular_drag(self.angular_drag - step);
        }
        if input.was_key_pressed(GameKey::Delete) {
            self.delete_target(map, &ctx.physics);
        }
        if input.was_key_pressed(GameKey::Save) {
            let args = EventArgs::new().with("fileName", &self.config.save_path);
            ctx.events.fire("save", args);
        }
    }

    /// Flag the selection, or failing that the shape under the cursor. The
    /// map's sweep removes it and clears the selection.
    fn delete_target(&mut self, map: &mut Map, physics: &PhysicsSystem) {
        let target = map.selected().or_else(|| map.shape_at(self.cursor, physics));
        let Some(handle) = target else {
            return;
        };
        if let Some(shape) = map.shape_mut(handle) {
            shape.mark_garbage();
            log::debug!("Editor: deleted {:?}", handle);
        }
        if matches!(self.gesture, Gesture::Dragging { shape, .. } if shape == handle) {
            self.gesture = Gesture::Idle;
        }
    }

    fn begin_gesture(&mut self, map: &mut Map, ctx: &mut GameContext) {
        match map.shape_at(self.cursor, &ctx.physics) {
            Some(handle) if map.select(handle, &mut ctx.physics) => {
                let offset = map.shape(handle).map(|s| s.position() - self.cursor).unwrap_or(Vec2::ZERO);
                self.gesture = Gesture::Dragging { shape: handle, offset };
            }
            _ => {
                map.clear_selection(&mut ctx.physics);
                self.gesture = Gesture::Constructing { start: self.cursor };
            }
        }
    }

    fn end_gesture(&mut self, map: &mut Map, ctx: &mut GameContext) {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => {}
            Gesture::Dragging { .. } => map.clear_selection(&mut ctx.physics),
            Gesture::Constructing { start } => {
                let rec = self.build_record(start, self.cursor);
                let handle = map.spawn_shape(&rec, ctx);
                log::debug!(
                    "Editor: spawned {} {} pill {:?} at {:?}",
                    self.alignment.as_str(),
                    self.sim_type.as_str(),
                    handle,
                    rec.transform.position
                );
            }
        }
    }

    /// Construction preview, drawn over the map.
    pub fn render(&self, renderer: &mut dyn RenderContext) {
        let Some(pill) = self.preview() else {
            return;
        };
        let mut verts = Vec::new();
        add_verts_for_pillbox(&mut verts, &pill, PREVIEW_FILL, Color::new(1.0, 1.0, 1.0, 0.8));
        renderer.bind_material("default");
        renderer.draw_vertex_array(&verts);
    }
}
