//! Keyboard and mouse input from macroquad
//!
//! Snapshotted once per frame by `poll`, so every system sees the same
//! cursor position for the whole update.

use macroquad::input::{
    is_key_down, is_key_pressed, is_mouse_button_down, is_mouse_button_pressed, is_mouse_button_released,
    mouse_position, mouse_wheel, KeyCode, MouseButton,
};
use macroquad::window::{screen_height, screen_width};

use crate::math::Vec2;
use crate::world::FollowCamera2D;
use super::{GameKey, InputQuery};

/// Physical keys bound to each logical key.
fn bindings(key: GameKey) -> &'static [KeyCode] {
    match key {
        GameKey::Up => &[KeyCode::W, KeyCode::Up],
        GameKey::Down => &[KeyCode::S, KeyCode::Down],
        GameKey::Left => &[KeyCode::A, KeyCode::Left],
        GameKey::Right => &[KeyCode::D, KeyCode::Right],
        GameKey::Delete => &[KeyCode::Delete, KeyCode::Backspace],
        GameKey::CycleAlignment => &[KeyCode::Tab],
        GameKey::ToggleSimType => &[KeyCode::T],
        GameKey::RadiusUp => &[KeyCode::Equal, KeyCode::KpAdd],
        GameKey::RadiusDown => &[KeyCode::Minus, KeyCode::KpSubtract],
        GameKey::MassUp => &[KeyCode::RightBracket],
        GameKey::MassDown => &[KeyCode::LeftBracket],
        GameKey::RestitutionUp => &[KeyCode::Y],
        GameKey::RestitutionDown => &[KeyCode::H],
        GameKey::FrictionUp => &[KeyCode::U],
        GameKey::FrictionDown => &[KeyCode::J],
        GameKey::DragUp => &[KeyCode::I],
        GameKey::DragDown => &[KeyCode::K],
        GameKey::AngularDragUp => &[KeyCode::O],
        GameKey::AngularDragDown => &[KeyCode::L],
        GameKey::Pause => &[KeyCode::P],
        GameKey::SlowDown => &[KeyCode::Comma],
        GameKey::SpeedUp => &[KeyCode::Period],
        GameKey::ResetTime => &[KeyCode::Slash],
        GameKey::Save => &[KeyCode::F5],
        GameKey::Back => &[KeyCode::Escape],
    }
}

#[derive(Debug, Clone, Default)]
pub struct MacroquadInput {
    mouse_world: Vec2,
    mouse_down: bool,
    mouse_pressed: bool,
    mouse_released: bool,
    scroll: f32,
    down: Vec<GameKey>,
    pressed: Vec<GameKey>,
}

impl MacroquadInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call once per frame before updating the game.
    pub fn poll(&mut self, camera: &FollowCamera2D) {
        let (mx, my) = mouse_position();
        let screen = Vec2::new(screen_width(), screen_height());
        self.mouse_world = camera.screen_to_world(Vec2::new(mx, my), screen);

        self.mouse_down = is_mouse_button_down(MouseButton::Left);
        self.mouse_pressed = is_mouse_button_pressed(MouseButton::Left);
        self.mouse_released = is_mouse_button_released(MouseButton::Left);
        let wheel = mouse_wheel().1;
        self.scroll = if wheel == 0.0 { 0.0 } else { wheel.signum() };

        self.down.clear();
        self.pressed.clear();
        for key in GameKey::ALL {
            let codes = bindings(key);
            if codes.iter().any(|&c| is_key_down(c)) {
                self.down.push(key);
            }
            if codes.iter().any(|&c| is_key_pressed(c)) {
                self.pressed.push(key);
            }
        }
    }
}

impl InputQuery for MacroquadInput {
    fn mouse_world_position(&self) -> Vec2 {
        self.mouse_world
    }

    fn is_key_down(&self, key: GameKey) -> bool {
        self.down.contains(&key)
    }

    fn was_key_pressed(&self, key: GameKey) -> bool {
        self.pressed.contains(&key)
    }

    fn is_mouse_down(&self) -> bool {
        self.mouse_down
    }

    fn was_mouse_pressed(&self) -> bool {
        self.mouse_pressed
    }

    fn was_mouse_released(&self) -> bool {
        self.mouse_released
    }

    fn scroll_delta(&self) -> f32 {
        self.scroll
    }
}
