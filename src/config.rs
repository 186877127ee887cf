//! Game configuration
//!
//! Read from `assets/config.ron`. Every struct is `#[serde(default)]`, so a
//! config file only has to name the values it changes:
//!
//! ```ron
//! (
//!     levels: ["assets/levels/level0.xml", "assets/levels/level1.xml"],
//!     gameplay: (player_speed: 8.0),
//! )
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: i32,
    pub height: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Pillbox Sandbox".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Acceleration applied to every dynamic body. Zero for top-down play.
    pub gravity: [f32; 2],
    pub min_time_scale: f32,
    pub max_time_scale: f32,
    /// Multiplier applied per slow-down / speed-up press
    pub time_scale_step: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0],
            min_time_scale: 0.125,
            max_time_scale: 4.0,
            time_scale_step: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Player health below this reloads the level
    pub reload_health: f32,
    /// Damage an enemy deals per frame of contact
    pub collision_damage: f32,
    pub player_speed: f32,
    pub end_zone_radius: f32,
    /// Fraction of the distance to the player closed per second
    pub camera_follow_rate: f32,
    /// Seconds of ignored movement input after a hit
    pub hit_input_suppression: f32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            reload_health: 0.5,
            collision_damage: 0.05,
            player_speed: 5.0,
            end_zone_radius: 1.0,
            camera_follow_rate: 4.0,
            hit_input_suppression: 0.25,
        }
    }
}

/// Inclusive range an editor control is clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub min: f32,
    pub max: f32,
}

impl Limits {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp `v` into range. NaN becomes `min`; a reversed range is
    /// treated as its sorted form.
    pub fn clamp(&self, v: f32) -> f32 {
        let (lo, hi) = if self.min <= self.max { (self.min, self.max) } else { (self.max, self.min) };
        if v.is_nan() {
            lo
        } else {
            v.clamp(lo, hi)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub radius: f32,
    pub mass: f32,
    pub restitution: f32,
    pub friction: f32,
    pub drag: f32,
    pub angular_drag: f32,
    pub radius_limits: Limits,
    pub mass_limits: Limits,
    pub restitution_limits: Limits,
    pub friction_limits: Limits,
    pub drag_limits: Limits,
    pub angular_drag_limits: Limits,
    /// Amount one radius key press changes the radius
    pub radius_step: f32,
    /// Amount one mass key press changes the mass
    pub mass_step: f32,
    /// Amount one key press changes restitution, friction, drag or angular drag
    pub material_step: f32,
    /// Where F5 saves in the editor
    pub save_path: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            mass: 1.0,
            restitution: 0.0,
            friction: 0.2,
            drag: 0.5,
            angular_drag: 0.0,
            radius_limits: Limits::new(0.0, 10.0),
            mass_limits: Limits::new(0.1, 100.0),
            restitution_limits: Limits::new(0.0, 1.0),
            friction_limits: Limits::new(0.0, 2.0),
            drag_limits: Limits::new(0.0, 10.0),
            angular_drag_limits: Limits::new(0.0, 10.0),
            radius_step: 0.1,
            mass_step: 0.5,
            material_step: 0.1,
            save_path: "assets/levels/editor_save.xml".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    /// Level files, in play order
    pub levels: Vec<String>,
    pub physics: PhysicsConfig,
    pub gameplay: GameplayConfig,
    pub editor: EditorConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            levels: vec!["assets/levels/level0.xml".to_string()],
            physics: PhysicsConfig::default(),
            gameplay: GameplayConfig::default(),
            editor: EditorConfig::default(),
        }
    }
}

impl GameConfig {
    pub const DEFAULT_PATH: &'static str = "assets/config.ron";

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Load `path`, falling back to defaults (with a warning) if the file
    /// is missing or unreadable.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Using default config ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn level_paths(&self) -> Vec<PathBuf> {
        self.levels.iter().map(PathBuf::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = GameConfig::from_ron("(gameplay: (player_speed: 8.0), levels: [\"a.xml\", \"b.xml\"])").unwrap();
        assert_eq!(config.gameplay.player_speed, 8.0);
        assert_eq!(config.gameplay.reload_health, 0.5);
        assert_eq!(config.levels.len(), 2);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_bad_config_is_parse_error() {
        assert!(matches!(GameConfig::from_ron("(gameplay: 12)"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = GameConfig::load_or_default("/no/such/config.ron");
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_limits_clamp() {
        let l = Limits::new(0.0, 1.0);
        assert_eq!(l.clamp(-1.0), 0.0);
        assert_eq!(l.clamp(2.0), 1.0);
        assert_eq!(l.clamp(f32::NAN), 0.0);
        assert_eq!(Limits::new(5.0, 1.0).clamp(3.0), 3.0);
    }

    #[test]
    fn test_round_trip_through_ron() {
        let text = ron::to_string(&GameConfig::default()).unwrap();
        assert_eq!(GameConfig::from_ron(&text).unwrap(), GameConfig::default());
    }

    #[test]
    fn test_shipped_config_parses() {
        let config = GameConfig::load(GameConfig::DEFAULT_PATH).unwrap();
        assert_eq!(config.levels.len(), 2);
        assert_eq!(config.physics.gravity, [0.0, 0.0]);
    }
}
