//! Input
//!
//! Game code asks for logical keys (`GameKey`) through the `InputQuery`
//! trait instead of reading the keyboard directly. The binary uses
//! `MacroquadInput`; tests and headless runs use `NoInput` or their own
//! doubles.

mod state;

pub use state::MacroquadInput;

use crate::math::Vec2;

/// Logical keys the world, editor and clock respond to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKey {
    Up,
    Down,
    Left,
    Right,
    /// Mark the selected shape for deletion
    Delete,
    /// Cycle alignment of the next spawned shape
    CycleAlignment,
    /// Flip static/dynamic for the next spawned shape
    ToggleSimType,
    RadiusUp,
    RadiusDown,
    MassUp,
    MassDown,
    RestitutionUp,
    RestitutionDown,
    FrictionUp,
    FrictionDown,
    DragUp,
    DragDown,
    AngularDragUp,
    AngularDragDown,
    Pause,
    SlowDown,
    SpeedUp,
    ResetTime,
    Save,
    Back,
}

impl GameKey {
    pub const ALL: [GameKey; 25] = [
        GameKey::Up,
        GameKey::Down,
        GameKey::Left,
        GameKey::Right,
        GameKey::Delete,
        GameKey::CycleAlignment,
        GameKey::ToggleSimType,
        GameKey::RadiusUp,
        GameKey::RadiusDown,
        GameKey::MassUp,
        GameKey::MassDown,
        GameKey::RestitutionUp,
        GameKey::RestitutionDown,
        GameKey::FrictionUp,
        GameKey::FrictionDown,
        GameKey::DragUp,
        GameKey::DragDown,
        GameKey::AngularDragUp,
        GameKey::AngularDragDown,
        GameKey::Pause,
        GameKey::SlowDown,
        GameKey::SpeedUp,
        GameKey::ResetTime,
        GameKey::Save,
        GameKey::Back,
    ];
}

/// Read-only view of this frame's input.
pub trait InputQuery {
    /// Cursor position in world space.
    fn mouse_world_position(&self) -> Vec2;
    fn is_key_down(&self, key: GameKey) -> bool;
    /// True only on the frame the key went down.
    fn was_key_pressed(&self, key: GameKey) -> bool;

    fn is_mouse_down(&self) -> bool {
        false
    }
    fn was_mouse_pressed(&self) -> bool {
        false
    }
    fn was_mouse_released(&self) -> bool {
        false
    }
    /// Wheel movement this frame, positive away from the user.
    fn scroll_delta(&self) -> f32 {
        0.0
    }
}

/// Nothing held, cursor at the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputQuery for NoInput {
    fn mouse_world_position(&self) -> Vec2 {
        Vec2::ZERO
    }
    fn is_key_down(&self, _key: GameKey) -> bool {
        false
    }
    fn was_key_pressed(&self, _key: GameKey) -> bool {
        false
    }
}
