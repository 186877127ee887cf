//! Game clock
//!
//! Time dilation and pause as a multiplier on the frame delta. The world
//! only ever sees the scaled delta; pausing hands it zero.

use crate::config::PhysicsConfig;
use crate::input::{GameKey, InputQuery};

/// Longest frame the simulation will advance in one update (seconds).
/// Hitches and window drags beyond this are dropped, not replayed.
pub const MAX_FRAME_DT: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct GameClock {
    scale: f32,
    paused: bool,
    min_scale: f32,
    max_scale: f32,
    step: f32,
}

impl GameClock {
    pub fn new(config: &PhysicsConfig) -> Self {
        let min_scale = config.min_time_scale.max(f32::EPSILON);
        Self {
            scale: 1.0,
            paused: false,
            min_scale,
            max_scale: config.max_time_scale.max(min_scale),
            step: config.time_scale_step.max(1.0),
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = if scale.is_finite() { scale.clamp(self.min_scale, self.max_scale) } else { 1.0 };
    }

    pub fn speed_up(&mut self) {
        self.set_scale(self.scale * self.step);
    }

    pub fn slow_down(&mut self) {
        self.set_scale(self.scale / self.step);
    }

    /// Back to real time, unpaused.
    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Delta time the world should advance for a real frame of `frame_dt`.
    pub fn scaled_dt(&self, frame_dt: f32) -> f32 {
        if self.paused || !frame_dt.is_finite() {
            return 0.0;
        }
        frame_dt.clamp(0.0, MAX_FRAME_DT) * self.scale
    }

    pub fn handle_input(&mut self, input: &dyn InputQuery) {
        if input.was_key_pressed(GameKey::Pause) {
            self.toggle_pause();
            log::info!("Clock: {}", if self.paused { "paused" } else { "resumed" });
        }
        if input.was_key_pressed(GameKey::SpeedUp) {
            self.speed_up();
            log::info!("Clock: time scale {}", self.scale);
        }
        if input.was_key_pressed(GameKey::SlowDown) {
            self.slow_down();
            log::info!("Clock: time scale {}", self.scale);
        }
        if input.was_key_pressed(GameKey::ResetTime) {
            self.reset();
        }
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_is_clamped() {
        let mut clock = GameClock::default();
        for _ in 0..10 {
            clock.speed_up();
        }
        assert_eq!(clock.scale(), 4.0);
        for _ in 0..10 {
            clock.slow_down();
        }
        assert_eq!(clock.scale(), 0.125);
        clock.set_scale(f32::NAN);
        assert_eq!(clock.scale(), 1.0);
    }

    #[test]
    fn test_pause_gives_zero_dt() {
        let mut clock = GameClock::default();
        clock.speed_up();
        assert_eq!(clock.scaled_dt(0.02), 0.04);
        clock.toggle_pause();
        assert_eq!(clock.scaled_dt(0.02), 0.0);
        clock.reset();
        assert!(!clock.is_paused());
        assert_eq!(clock.scaled_dt(0.02), 0.02);
    }

    #[test]
    fn test_long_frames_are_capped() {
        let clock = GameClock::default();
        assert_eq!(clock.scaled_dt(2.0), MAX_FRAME_DT);
        assert_eq!(clock.scaled_dt(-1.0), 0.0);
    }
}
