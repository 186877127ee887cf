//! Pillbox Sandbox: a 2D rigid-body physics sandbox with a level editor
//!
//! Shapes live in a `Map`, each owning one rigidbody in the shared
//! `PhysicsSystem`. The map steps physics once per frame, applies the
//! gameplay rules (hazards, bounds, end zone) and then sweeps shapes that
//! were flagged for removal. The `Game` state machine picks which map is
//! live and whether it runs as gameplay or in the editor.

pub mod arena;
pub mod config;
pub mod context;
pub mod editor;
pub mod events;
pub mod game;
pub mod input;
pub mod math;
pub mod physics;
pub mod render;
pub mod world;

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
