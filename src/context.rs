//! Shared services passed to the world each frame.
//!
//! There are no process-wide singletons: whoever owns the `GameContext`
//! (the `Game`, or a test) lends it to `Map` and `EditorState` calls.

use crate::config::GameConfig;
use crate::events::EventBus;
use crate::math::Vec2;
use crate::physics::PhysicsSystem;

pub struct GameContext {
    pub physics: PhysicsSystem,
    pub events: EventBus,
    pub config: GameConfig,
}

impl GameContext {
    pub fn new(config: GameConfig) -> Self {
        let [gx, gy] = config.physics.gravity;
        Self {
            physics: PhysicsSystem::new(Vec2::new(gx, gy)),
            events: EventBus::new(),
            config,
        }
    }
}

impl Default for GameContext {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
