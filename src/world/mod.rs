//! World module - shapes, level files, and the map that holds them
//!
//! - `shape` - Shape entities (alignment, health, gameplay flags)
//! - `level` - XML level records, load and save
//! - `map` - One loaded level: shape store, terrain, end zone, rules
//! - `camera` - Follow/pan camera over the map

pub mod camera;
pub mod level;
pub mod map;
pub mod shape;

pub use camera::FollowCamera2D;
pub use level::{
    load_level, parse_level, parse_level_lenient, save_level, write_level, ColliderRecord, LevelData, LevelError,
    RigidbodyRecord, ShapeRecord, TransformRecord,
};
pub use map::{Map, ShapeHandle};
pub use shape::{Alignment, Shape, ShapeKind, DEFAULT_HEALTH};
