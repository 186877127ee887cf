//! Level Editor
//!
//! Mouse-driven editing of the current map:
//! - Drag on empty space to build a pill from the drag rectangle
//! - Click a shape to select it (its body is frozen while held) and drag it
//! - Delete flags the selection (or the hovered shape) for the next sweep
//! - Tab cycles the alignment of the next shape, T toggles static/dynamic

mod state;

pub use state::*;
