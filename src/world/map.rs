//! Map
//!
//! The world container for one level: the shape store, terrain, camera, end
//! zone and the path the level came from.
//!
//! Shapes live in a slot `Arena`, so handles held elsewhere (the player,
//! the editor selection) stay valid until the shape is removed and resolve
//! to nothing afterwards. Removal is deferred: gameplay and the editor only
//! flag shapes as garbage, and `garbage_collection` sweeps them at the end
//! of `update`, after clearing the player and selection references.

use std::fs;
use std::path::{Path, PathBuf};

use macroquad::color::Color;

use crate::arena::{Arena, Handle};
use crate::context::GameContext;
use crate::events::EventArgs;
use crate::input::{GameKey, InputQuery, NoInput};
use crate::math::{Aabb2, Transform2D, Vec2};
use crate::physics::{
    BodyRestrictions, Collider2D, PhysicsMaterial, PhysicsSystem, Rigidbody2D, SimulationType, TransformSource,
};
use crate::render::{add_verts_for_disc, add_verts_for_ring, build_grid_mesh, Mesh2D, RenderContext, DISC_SIDES};
use super::camera::FollowCamera2D;
use super::level::{
    parse_level_lenient, save_level, ColliderRecord, LevelData, LevelError, RigidbodyRecord, ShapeRecord,
    TransformRecord,
};
use super::shape::{Alignment, Shape, ShapeKind};

pub type ShapeHandle = Handle;

/// Editor camera pan speed in world units per second at zoom 1.
const PAN_SPEED: f32 = 12.0;

const TERRAIN_LIGHT: Color = Color::new(0.16, 0.17, 0.2, 1.0);
const TERRAIN_DARK: Color = Color::new(0.13, 0.14, 0.17, 1.0);
const END_ZONE_COLOR: Color = Color::new(0.2, 0.9, 0.4, 0.35);

impl TransformSource for Arena<Shape> {
    fn transform(&self, owner: Handle) -> Option<&Transform2D> {
        self.get(owner).map(|s| &s.transform)
    }

    fn transform_mut(&mut self, owner: Handle) -> Option<&mut Transform2D> {
        self.get_mut(owner).map(|s| &mut s.transform)
    }
}

/// Apply a level record to a freshly created body.
fn configure_body(body: &mut Rigidbody2D, rec: &ShapeRecord) {
    let rb = &rec.rigidbody;
    body.set_mass(rb.mass);
    body.set_material(PhysicsMaterial {
        restitution: rb.restitution,
        friction: rb.friction,
        drag: rb.drag,
        angular_drag: rb.angular_drag,
    });
    body.set_original_simulation_type(rb.sim_type);
    // Restrictions mask velocity when set; the authored spin must survive
    // until the first step so a load/save pair keeps it.
    body.set_restrictions(rb.x_restricted, rb.y_restricted, rb.rot_restricted);
    body.angular_velocity = rb.angular_velocity;
    let c = &rec.collider;
    body.set_collider(Collider2D::pillbox(c.local_center, c.radius, c.extents, c.local_right));
}

pub struct Map {
    shapes: Arena<Shape>,
    player: Option<ShapeHandle>,
    selected: Option<ShapeHandle>,
    camera: FollowCamera2D,
    map_dims: Vec2,
    end_zone: Vec2,
    terrain: Mesh2D,
    /// File the level was loaded from; reloads read it again
    source: Option<PathBuf>,
    /// Level as last applied, for reloading maps that have no file
    initial: LevelData,
    loaded: bool,
    /// Hazards, bounds and the end zone only apply in gameplay
    gameplay_rules: bool,
    pending_reload: bool,
    level_complete: bool,
    reload_count: u32,
}

impl Map {
    pub fn new() -> Self {
        let initial = LevelData::default();
        Self {
            shapes: Arena::new(),
            player: None,
            selected: None,
            camera: FollowCamera2D::default(),
            map_dims: initial.map_dims,
            end_zone: initial.end_zone,
            terrain: Mesh2D::default(),
            source: None,
            initial,
            loaded: false,
            gameplay_rules: true,
            pending_reload: false,
            level_complete: false,
            reload_count: 0,
        }
    }

    // =========================================================================
    // Load / save
    // =========================================================================

    /// Load a level file. A missing or corrupt file is not fatal: the map
    /// still ends up loaded, with whatever could be parsed (possibly no
    /// shapes). Returns false if the file could not be read at all.
    pub fn load<P: AsRef<Path>>(&mut self, path: P, ctx: &mut GameContext) -> bool {
        let path = path.as_ref();
        let (data, ok) = match fs::read_to_string(path) {
            Ok(text) => (parse_level_lenient(&text), true),
            Err(e) => {
                log::warn!("Map: could not read {}: {}, loading empty map", path.display(), e);
                (LevelData::default(), false)
            }
        };
        self.source = Some(path.to_path_buf());
        self.apply_level(data, ctx);
        log::info!("Map: loaded {} ({} shapes)", path.display(), self.shapes.len());
        ok
    }

    /// Populate from already-parsed level data. The map has no source file
    /// afterwards; `reload` re-applies this data.
    pub fn load_from_data(&mut self, data: LevelData, ctx: &mut GameContext) {
        self.source = None;
        self.apply_level(data, ctx);
    }

    /// Load the same level again.
    pub fn reload(&mut self, ctx: &mut GameContext) {
        self.reload_count += 1;
        match self.source.clone() {
            Some(path) => {
                log::info!("Map: reloading {}", path.display());
                self.load(path, ctx);
            }
            None => {
                log::info!("Map: reloading from memory");
                self.apply_level(self.initial.clone(), ctx);
            }
        }
    }

    fn apply_level(&mut self, data: LevelData, ctx: &mut GameContext) {
        self.unload(&mut ctx.physics);

        self.map_dims = data.map_dims;
        self.end_zone = data.end_zone;
        self.terrain = build_grid_mesh(self.map_dims, 1.0, TERRAIN_LIGHT, TERRAIN_DARK);
        for rec in &data.shapes {
            self.spawn_shape(rec, ctx);
        }

        let focus = self.player_shape().map(|p| p.position()).unwrap_or(self.map_dims * 0.5);
        self.camera.set_focal_point(focus);
        self.initial = data;
        self.pending_reload = false;
        self.level_complete = false;
        self.loaded = true;
    }

    /// Remove every shape and its body.
    pub fn unload(&mut self, physics: &mut PhysicsSystem) {
        self.clear_selection(physics);
        for shape in self.shapes.clear() {
            physics.remove_rigidbody(shape.body());
        }
        self.player = None;
        self.loaded = false;
    }

    /// Write every live shape to a level file.
    pub fn save<P: AsRef<Path>>(&self, path: P, ctx: &GameContext) -> Result<(), LevelError> {
        let path = path.as_ref();
        let data = self.to_level_data(&ctx.physics);
        save_level(&data, path)?;
        log::info!("Map: saved {} shapes to {}", data.shapes.len(), path.display());
        Ok(())
    }

    /// Snapshot the map as level data. Bodies frozen by the editor are
    /// written with their authored simulation type.
    pub fn to_level_data(&self, physics: &PhysicsSystem) -> LevelData {
        LevelData {
            map_dims: self.map_dims,
            end_zone: self.end_zone,
            shapes: self
                .shapes
                .iter()
                .filter_map(|(_, shape)| shape_record(shape, physics))
                .collect(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    // =========================================================================
    // Shape store
    // =========================================================================

    /// Create a shape (and its body) from a level record.
    pub fn spawn_shape(&mut self, rec: &ShapeRecord, ctx: &mut GameContext) -> ShapeHandle {
        let body = ctx.physics.create_rigidbody(Handle::NULL, rec.rigidbody.mass);
        if let Some(b) = ctx.physics.body_mut(body) {
            configure_body(b, rec);
        }

        let t = &rec.transform;
        let mut shape = Shape::new(
            ShapeKind::Pill,
            Transform2D::new(t.position, t.rotation, t.scale),
            body,
            t.alignment,
        );
        shape.set_collision_damage(ctx.config.gameplay.collision_damage);
        shape.set_movement_speed(ctx.config.gameplay.player_speed);
        self.add_shape(shape, &mut ctx.physics)
    }

    /// Store a shape in the first free slot and point its body at it.
    /// The first PLAYER-aligned shape becomes the map's player.
    pub fn add_shape(&mut self, shape: Shape, physics: &mut PhysicsSystem) -> ShapeHandle {
        let body = shape.body();
        let is_player = shape.is_player();
        let handle = self.shapes.insert(shape);
        if let Some(b) = physics.body_mut(body) {
            b.set_owner(handle);
        }

        if is_player {
            match self.player {
                None => self.player = Some(handle),
                Some(_) => log::warn!("Map: extra player-aligned shape {:?} is not tracked as the player", handle),
            }
        }
        handle
    }

    /// Remove a shape and its body now. Stale handles are a no-op.
    /// Does not shrink the store.
    pub fn remove_shape(&mut self, handle: ShapeHandle, physics: &mut PhysicsSystem) -> bool {
        let Some(shape) = self.shapes.remove(handle) else {
            return false;
        };
        physics.remove_rigidbody(shape.body());
        if self.player == Some(handle) {
            self.player = None;
        }
        if self.selected == Some(handle) {
            self.selected = None;
        }
        true
    }

    /// Sweep every garbage shape, clearing the selection and player
    /// references first. Returns how many shapes were removed.
    pub fn garbage_collection(&mut self, physics: &mut PhysicsSystem) -> usize {
        let garbage: Vec<ShapeHandle> = self
            .shapes
            .iter()
            .filter(|(_, s)| s.is_garbage())
            .map(|(h, _)| h)
            .collect();

        for &handle in &garbage {
            if self.selected == Some(handle) {
                self.clear_selection(physics);
            }
            if self.player == Some(handle) {
                self.player = None;
            }
            self.remove_shape(handle, physics);
        }

        if !garbage.is_empty() {
            log::debug!("Map: collected {} shapes", garbage.len());
        }
        garbage.len()
    }

    pub fn shape(&self, handle: ShapeHandle) -> Option<&Shape> {
        self.shapes.get(handle)
    }

    pub fn shape_mut(&mut self, handle: ShapeHandle) -> Option<&mut Shape> {
        self.shapes.get_mut(handle)
    }

    pub fn shapes(&self) -> impl Iterator<Item = (ShapeHandle, &Shape)> {
        self.shapes.iter()
    }

    /// Live shapes.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Slots in the backing store, live or free.
    pub fn slot_count(&self) -> usize {
        self.shapes.capacity()
    }

    pub fn player(&self) -> Option<ShapeHandle> {
        self.player
    }

    pub fn player_shape(&self) -> Option<&Shape> {
        self.player.and_then(|h| self.shapes.get(h))
    }

    /// Topmost live shape under `point`.
    pub fn shape_at(&self, point: Vec2, physics: &PhysicsSystem) -> Option<ShapeHandle> {
        self.shapes
            .iter()
            .filter(|(_, s)| s.is_alive() && !s.is_garbage() && s.contains_point(physics, point))
            .map(|(h, _)| h)
            .last()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selected(&self) -> Option<ShapeHandle> {
        self.selected
    }

    /// Select a shape and freeze its body until the selection is cleared.
    pub fn select(&mut self, handle: ShapeHandle, physics: &mut PhysicsSystem) -> bool {
        self.clear_selection(physics);
        let Some(shape) = self.shapes.get_mut(handle) else {
            return false;
        };
        if !shape.is_alive() {
            return false;
        }
        shape.set_selected(true);
        if let Some(body) = physics.body_mut(shape.body()) {
            body.set_simulation_type(SimulationType::Static);
            body.velocity = Vec2::ZERO;
            body.angular_velocity = 0.0;
        }
        self.selected = Some(handle);
        true
    }

    /// Drop the selection and give its body back its authored type.
    pub fn clear_selection(&mut self, physics: &mut PhysicsSystem) {
        let Some(handle) = self.selected.take() else {
            return;
        };
        if let Some(shape) = self.shapes.get_mut(handle) {
            shape.set_selected(false);
            if let Some(body) = physics.body_mut(shape.body()) {
                body.reset_simulation_type();
            }
        }
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// The playable area, `[0, mapDims]`.
    pub fn bounds(&self) -> Aabb2 {
        Aabb2::new(Vec2::ZERO, self.map_dims)
    }

    pub fn map_dims(&self) -> Vec2 {
        self.map_dims
    }

    pub fn end_zone(&self) -> Vec2 {
        self.end_zone
    }

    pub fn set_end_zone(&mut self, end_zone: Vec2) {
        self.end_zone = end_zone;
    }

    pub fn camera(&self) -> &FollowCamera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut FollowCamera2D {
        &mut self.camera
    }

    pub fn terrain(&self) -> &Mesh2D {
        &self.terrain
    }

    // =========================================================================
    // Gameplay state
    // =========================================================================

    pub fn set_gameplay_rules(&mut self, enabled: bool) {
        self.gameplay_rules = enabled;
    }

    pub fn gameplay_rules(&self) -> bool {
        self.gameplay_rules
    }

    pub fn is_level_complete(&self) -> bool {
        self.level_complete
    }

    /// Times this map has been reloaded since creation.
    pub fn reload_count(&self) -> u32 {
        self.reload_count
    }

    /// Flag every shape and reload once this frame's sweep is done.
    pub fn request_reload(&mut self) {
        if self.pending_reload {
            return;
        }
        self.pending_reload = true;
        for (_, shape) in self.shapes.iter_mut() {
            shape.mark_garbage();
        }
    }

    // =========================================================================
    // Per-frame
    // =========================================================================

    /// Advance one frame: camera, shapes, physics, gameplay rules, then
    /// the garbage sweep (and a reload if one was requested).
    pub fn update(&mut self, dt: f32, input: &dyn InputQuery, ctx: &mut GameContext) {
        if !self.loaded {
            return;
        }

        self.update_camera(dt, input, ctx);

        if dt > 0.0 {
            let shape_input: &dyn InputQuery = if self.gameplay_rules { input } else { &NoInput };
            for (_, shape) in self.shapes.iter_mut() {
                if shape.is_alive() {
                    shape.update(dt, shape_input, &mut ctx.physics);
                }
            }
            ctx.physics.step(dt, &mut self.shapes);

            if self.gameplay_rules {
                self.apply_hazards(ctx);
                self.check_bounds(ctx);
                self.check_end_zone(ctx);
            }
        }

        self.garbage_collection(&mut ctx.physics);
        if self.pending_reload {
            self.reload(ctx);
        }
    }

    fn update_camera(&mut self, dt: f32, input: &dyn InputQuery, ctx: &GameContext) {
        let scroll = input.scroll_delta();
        if scroll != 0.0 {
            self.camera.add_zoom(scroll);
        }

        let player_pos = self.player_shape().map(|p| p.position());
        match player_pos {
            Some(pos) if self.gameplay_rules => {
                self.camera.follow(pos, ctx.config.gameplay.camera_follow_rate, dt);
            }
            _ => {
                let mut pan = Vec2::ZERO;
                for (key, dir) in [
                    (GameKey::Up, Vec2::Y),
                    (GameKey::Down, -Vec2::Y),
                    (GameKey::Right, Vec2::X),
                    (GameKey::Left, -Vec2::X),
                ] {
                    if input.is_key_down(key) {
                        pan += dir;
                    }
                }
                self.camera.pan(pan * PAN_SPEED * dt / self.camera.zoom());
            }
        }
        let bounds = self.bounds();
        self.camera.clamp_to(&bounds);
    }

    /// Enemies touching the player hurt it; dropping below the reload
    /// threshold restarts the level.
    fn apply_hazards(&mut self, ctx: &mut GameContext) {
        let Some(player_handle) = self.player else {
            return;
        };
        let Some(player_body) = self.shapes.get(player_handle).map(|p| p.body()) else {
            return;
        };

        let mut damage = 0.0;
        for contact in ctx.physics.contacts() {
            let Some(other) = contact.other(player_body) else {
                continue;
            };
            let Some(owner) = ctx.physics.body(other).map(|b| b.owner()) else {
                continue;
            };
            if let Some(shape) = self.shapes.get(owner) {
                if shape.alignment() == Alignment::Enemy && shape.is_alive() {
                    damage += shape.collision_damage();
                }
            }
        }
        if damage <= 0.0 {
            return;
        }

        let gameplay = &ctx.config.gameplay;
        let Some(player) = self.shapes.get_mut(player_handle) else {
            return;
        };
        player.take_damage(damage);
        player.suppress_input(gameplay.hit_input_suppression);
        let health = player.health();
        log::debug!("Map: player hit for {:.3}, health {:.3}", damage, health);

        if health < gameplay.reload_health {
            log::info!("Map: player health {:.3} below {:.3}, reloading", health, gameplay.reload_health);
            self.request_reload();
        }
    }

    /// Shapes that left the map are collected; the player leaving reloads.
    fn check_bounds(&mut self, ctx: &GameContext) {
        let bounds = self.bounds();
        let outside: Vec<ShapeHandle> = self
            .shapes
            .iter()
            .filter(|(_, s)| !s.is_garbage() && s.is_out_of_bounds(&bounds, &ctx.physics))
            .map(|(h, _)| h)
            .collect();

        for handle in outside {
            if self.player == Some(handle) {
                log::info!("Map: player left the map, reloading");
                self.request_reload();
            } else if let Some(shape) = self.shapes.get_mut(handle) {
                shape.mark_garbage();
            }
        }
    }

    fn check_end_zone(&mut self, ctx: &mut GameContext) {
        if self.level_complete {
            return;
        }
        let Some(player) = self.player_shape() else {
            return;
        };
        if !player.is_alive() {
            return;
        }
        let radius = ctx.config.gameplay.end_zone_radius;
        if player.position().distance(self.end_zone) <= radius {
            self.level_complete = true;
            log::info!("Map: end zone reached");
            ctx.events.fire("level_complete", EventArgs::new());
        }
    }

    /// Terrain, end zone, then every live shape.
    pub fn render(&self, ctx: &GameContext, renderer: &mut dyn RenderContext) {
        if !self.loaded {
            return;
        }
        renderer.bind_material("terrain");
        renderer.draw_mesh(&self.terrain);

        let radius = ctx.config.gameplay.end_zone_radius;
        let mut verts = Vec::new();
        add_verts_for_disc(&mut verts, self.end_zone, radius, END_ZONE_COLOR, DISC_SIDES);
        add_verts_for_ring(&mut verts, self.end_zone, radius, 0.08, END_ZONE_COLOR, DISC_SIDES);
        renderer.bind_material("default");
        renderer.draw_vertex_array(&verts);

        for (_, shape) in self.shapes.iter() {
            if shape.is_alive() {
                shape.render(&ctx.physics, renderer);
            }
        }
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::new()
    }
}

/// Level record for one shape, read back from its body and collider.
fn shape_record(shape: &Shape, physics: &PhysicsSystem) -> Option<ShapeRecord> {
    let body = physics.body(shape.body())?;
    let material = body.material();
    let BodyRestrictions { x, y, rotation } = body.restrictions();
    let pill = body.collider()?.shape().as_pillbox();

    Some(ShapeRecord {
        rigidbody: RigidbodyRecord {
            restitution: material.restitution,
            friction: material.friction,
            mass: body.mass(),
            angular_drag: material.angular_drag,
            drag: material.drag,
            angular_velocity: body.angular_velocity,
            x_restricted: x,
            y_restricted: y,
            rot_restricted: rotation,
            sim_type: body.original_simulation_type(),
        },
        collider: ColliderRecord {
            radius: pill.radius,
            extents: pill.obb.half_extents,
            local_center: pill.obb.center,
            local_right: pill.obb.right,
        },
        transform: TransformRecord {
            position: shape.transform.position,
            scale: shape.transform.scale,
            rotation: shape.transform.rotation,
            alignment: shape.alignment(),
        },
    })
}
