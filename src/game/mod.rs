//! Game flow
//!
//! The top-level state machine and the pool of maps it drives:
//!
//! ```text
//! Init → MainMenu → Loading → Gameplay
//!                          ↘ Editor
//! ```
//!
//! `Loading` is re-entered on every level change. UI and keys never touch
//! the maps directly; they fire commands on the event bus (`play level=1`,
//! `edit`, `save fileName=...`, `load fileName=...`, `quit`) and the game
//! handles them at the start of the next update.
//!
//! There is one map per configured level, created up front. Only the
//! current map holds bodies in the shared `PhysicsSystem`; the others are
//! unloaded when the game switches away from them.

mod clock;

pub use clock::{GameClock, MAX_FRAME_DT};

use std::path::PathBuf;

use crate::config::GameConfig;
use crate::context::GameContext;
use crate::editor::EditorState;
use crate::events::GameEvent;
use crate::input::{GameKey, InputQuery};
use crate::render::RenderContext;
use crate::world::{FollowCamera2D, LevelData, Map};

/// Commands the game listens for.
/// Number keys 1-9 on the main menu.
pub const MENU_LEVEL_KEYS: usize = 9;

pub const COMMANDS: [&str; 7] = ["play", "edit", "save", "load", "quit", "menu", "level_complete"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Init,
    MainMenu,
    Loading,
    Gameplay,
    Editor,
}

impl GameState {
    pub fn label(&self) -> &'static str {
        match self {
            GameState::Init => "init",
            GameState::MainMenu => "main menu",
            GameState::Loading => "loading",
            GameState::Gameplay => "gameplay",
            GameState::Editor => "editor",
        }
    }
}

/// What `Loading` should load and where it goes afterwards.
#[derive(Debug, Clone, PartialEq)]
struct LoadRequest {
    target: GameState,
    /// Explicit file; `None` loads the configured level for the current map
    path: Option<PathBuf>,
}

pub struct Game {
    pub ctx: GameContext,
    maps: Vec<Map>,
    current: usize,
    state: GameState,
    pending_load: LoadRequest,
    editor: EditorState,
    clock: GameClock,
    quit_requested: bool,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let mut ctx = GameContext::new(config);
        for name in COMMANDS {
            ctx.events.subscribe(name);
        }
        let pool = ctx.config.levels.len().max(1);
        let maps = (0..pool).map(|_| Map::new()).collect();
        let editor = EditorState::new(&ctx.config.editor);
        let clock = GameClock::new(&ctx.config.physics);
        log::info!("Game: {} map slot(s)", pool);

        Self {
            ctx,
            maps,
            current: 0,
            state: GameState::Init,
            pending_load: LoadRequest { target: GameState::Gameplay, path: None },
            editor,
            clock,
            quit_requested: false,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn map_count(&self) -> usize {
        self.maps.len()
    }

    /// Levels the main menu's number keys can start.
    pub fn playable_levels(&self) -> usize {
        self.maps.len().min(MENU_LEVEL_KEYS)
    }

    /// The current map. An out-of-range index is a state machine bug.
    pub fn map(&self) -> &Map {
        assert!(
            self.current < self.maps.len(),
            "map index {} out of range ({} maps)",
            self.current,
            self.maps.len()
        );
        &self.maps[self.current]
    }

    pub fn camera(&self) -> &FollowCamera2D {
        self.map().camera()
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn set_state(&mut self, state: GameState) {
        if self.state != state {
            log::info!("Game: {} -> {}", self.state.label(), state.label());
            self.state = state;
        }
    }

    fn begin_loading(&mut self, index: usize, target: GameState, path: Option<PathBuf>) {
        if index >= self.maps.len() {
            log::warn!("Game: no level {} ({} configured)", index, self.maps.len());
            return;
        }
        self.current = index;
        self.pending_load = LoadRequest { target, path };
        self.set_state(GameState::Loading);
    }

    fn finish_loading(&mut self) {
        let LoadRequest { target, path } = self.pending_load.clone();

        // Only the current map keeps bodies in the physics system
        let current = self.current;
        for (i, map) in self.maps.iter_mut().enumerate() {
            if i != current && map.is_loaded() {
                map.unload(&mut self.ctx.physics);
            }
        }
        self.ctx.physics.clear();

        let path = path.or_else(|| self.ctx.config.level_paths().get(current).cloned());
        let map = &mut self.maps[current];
        map.set_gameplay_rules(target == GameState::Gameplay);
        match path {
            Some(path) => {
                map.load(&path, &mut self.ctx);
            }
            None => {
                log::warn!("Game: level {} has no file, starting empty", current);
                map.load_from_data(LevelData::default(), &mut self.ctx);
            }
        }
        self.clock.reset();
        self.set_state(target);
    }

    fn advance_level(&mut self) {
        let next = self.current + 1;
        if next < self.maps.len() {
            log::info!("Game: level {} complete, advancing to {}", self.current, next);
            self.begin_loading(next, GameState::Gameplay, None);
        } else {
            log::info!("Game: final level complete");
            self.return_to_menu();
        }
    }

    fn return_to_menu(&mut self) {
        let map = &mut self.maps[self.current];
        map.clear_selection(&mut self.ctx.physics);
        self.set_state(GameState::MainMenu);
    }

    // =========================================================================
    // Events
    // =========================================================================

    fn handle_events(&mut self) {
        for event in self.ctx.events.drain() {
            self.handle_event(&event);
        }
    }

    fn handle_event(&mut self, event: &GameEvent) {
        let args = &event.args;
        match event.name.as_str() {
            "play" => {
                let level = args.get_parsed("level", self.current);
                self.begin_loading(level, GameState::Gameplay, None);
            }
            "edit" => {
                let level = args.get_parsed("level", self.current);
                self.begin_loading(level, GameState::Editor, None);
            }
            "load" => {
                let Some(file) = args.get("fileName").filter(|f| !f.is_empty()) else {
                    log::warn!("Game: load needs fileName=");
                    return;
                };
                let target = match self.state {
                    GameState::Gameplay => GameState::Gameplay,
                    _ => GameState::Editor,
                };
                self.begin_loading(self.current, target, Some(PathBuf::from(file)));
            }
            "save" => self.save(args.get("fileName")),
            "menu" => self.return_to_menu(),
            "quit" => {
                log::info!("Game: quit requested");
                self.quit_requested = true;
            }
            "level_complete" => {
                if self.state == GameState::Gameplay {
                    self.advance_level();
                }
            }
            other => log::debug!("Game: unhandled event '{}'", other),
        }
    }

    /// Save the current map to `file`, or back to where it came from.
    fn save(&self, file: Option<&str>) {
        let map = self.map();
        if !map.is_loaded() {
            log::warn!("Game: nothing loaded to save");
            return;
        }
        let path = match file.filter(|f| !f.is_empty()) {
            Some(f) => PathBuf::from(f),
            None => match map.source_path() {
                Some(p) => p.to_path_buf(),
                None => PathBuf::from(&self.ctx.config.editor.save_path),
            },
        };
        if let Err(e) = map.save(&path, &self.ctx) {
            log::error!("Game: could not save {}: {}", path.display(), e);
        }
    }

    // =========================================================================
    // Per-frame
    // =========================================================================

    /// One frame. `frame_dt` is real elapsed time; the clock scales it.
    pub fn update(&mut self, frame_dt: f32, input: &dyn InputQuery) {
        let before = self.state;
        self.handle_events();
        // A command switched state; the new state runs from the next frame
        if self.state != before {
            return;
        }

        match self.state {
            GameState::Init => self.set_state(GameState::MainMenu),
            GameState::MainMenu => {}
            GameState::Loading => self.finish_loading(),
            GameState::Gameplay | GameState::Editor => {
                if input.was_key_pressed(GameKey::Back) {
                    self.return_to_menu();
                    return;
                }
                self.clock.handle_input(input);
                let dt = self.clock.scaled_dt(frame_dt);
                let current = self.current;
                let map = &mut self.maps[current];
                if self.state == GameState::Editor {
                    self.editor.update(map, input, &mut self.ctx);
                }
                map.update(dt, input, &mut self.ctx);
            }
        }
    }

    /// Draw the current map (and the editor overlay) under the active camera.
    pub fn render(&self, renderer: &mut dyn RenderContext) {
        match self.state {
            GameState::Gameplay => self.map().render(&self.ctx, renderer),
            GameState::Editor => {
                self.map().render(&self.ctx, renderer);
                self.editor.render(renderer);
            }
            GameState::Init | GameState::MainMenu | GameState::Loading => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NoInput;
    use std::fs;

    const LEVEL_A: &str = r#"<map mapDims="32,32" endZone="10,10">
        <shape>
            <rigidbody type="static"/>
            <collider radius="0.5" extents="0,0"/>
            <trans pos="10.2,10" alignment="player"/>
        </shape>
    </map>"#;

    const LEVEL_B: &str = r#"<map mapDims="32,32" endZone="30,30">
        <shape>
            <rigidbody type="dynamic"/>
            <collider radius="0.5" extents="0,0"/>
            <trans pos="5,5" alignment="player"/>
        </shape>
        <shape>
            <collider radius="0.5" extents="1,0"/>
            <trans pos="15,5"/>
        </shape>
    </map>"#;

    fn two_level_game(dir: &tempfile::TempDir) -> Game {
        let a = dir.path().join("a.xml");
        let b = dir.path().join("b.xml");
        fs::write(&a, LEVEL_A).unwrap();
        fs::write(&b, LEVEL_B).unwrap();
        let config = GameConfig {
            levels: vec![a.display().to_string(), b.display().to_string()],
            ..Default::default()
        };
        Game::new(config)
    }

    fn frame(game: &mut Game) {
        game.update(1.0 / 60.0, &NoInput);
    }

    #[test]
    fn test_boot_to_menu() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = two_level_game(&dir);
        assert_eq!(game.state(), GameState::Init);
        assert_eq!(game.map_count(), 2);
        frame(&mut game);
        assert_eq!(game.state(), GameState::MainMenu);
    }

    #[test]
    fn test_play_command_loads_level() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = two_level_game(&dir);
        frame(&mut game);
        assert!(game.ctx.events.fire_command("play level=1"));
        frame(&mut game);
        assert_eq!(game.state(), GameState::Loading);
        frame(&mut game);
        assert_eq!(game.state(), GameState::Gameplay);
        assert_eq!(game.current_index(), 1);
        assert_eq!(game.map().shape_count(), 2);
        assert!(game.map().gameplay_rules());
    }

    #[test]
    fn test_bad_level_index_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = two_level_game(&dir);
        frame(&mut game);
        game.ctx.events.fire_command("play level=7");
        frame(&mut game);
        assert_eq!(game.state(), GameState::MainMenu);
        assert_eq!(game.current_index(), 0);
    }

    #[test]
    fn test_playable_levels_follow_configured_count() {
        let dir = tempfile::tempdir().unwrap();
        let game = two_level_game(&dir);
        assert_eq!(game.playable_levels(), 2);

        let many = GameConfig { levels: vec!["missing.xml".to_string(); 12], ..Default::default() };
        assert_eq!(Game::new(many).playable_levels(), MENU_LEVEL_KEYS);
    }

    #[test]
    fn test_end_zone_advances_then_returns_to_menu() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = two_level_game(&dir);
        frame(&mut game);
        game.ctx.events.fire_command("play level=0");
        frame(&mut game);
        frame(&mut game);
        assert_eq!(game.state(), GameState::Gameplay);

        // Level A's player starts inside the end zone
        frame(&mut game);
        assert!(game.map().is_level_complete());
        frame(&mut game);
        assert_eq!(game.state(), GameState::Loading);
        frame(&mut game);
        assert_eq!(game.current_index(), 1);
        assert_eq!(game.state(), GameState::Gameplay);
        // Only the current map's bodies are simulated
        assert_eq!(game.ctx.physics.body_count(), 2);

        game.ctx.events.fire("level_complete", Default::default());
        frame(&mut game);
        assert_eq!(game.state(), GameState::MainMenu);
    }

    #[test]
    fn test_edit_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = two_level_game(&dir);
        frame(&mut game);
        game.ctx.events.fire_command("edit level=1");
        frame(&mut game);
        frame(&mut game);
        assert_eq!(game.state(), GameState::Editor);
        assert!(!game.map().gameplay_rules());

        let out = dir.path().join("saved/copy.xml");
        game.ctx.events.fire_command(&format!("save fileName=\"{}\"", out.display()));
        frame(&mut game);
        assert!(out.exists());

        game.ctx.events.fire_command(&format!("load fileName=\"{}\"", out.display()));
        frame(&mut game);
        frame(&mut game);
        assert_eq!(game.state(), GameState::Editor);
        assert_eq!(game.map().source_path(), Some(out.as_path()));
        assert_eq!(game.map().shape_count(), 2);
    }

    #[test]
    fn test_quit_and_menu() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = two_level_game(&dir);
        frame(&mut game);
        game.ctx.events.fire_command("play");
        frame(&mut game);
        frame(&mut game);
        game.ctx.events.fire_command("menu");
        frame(&mut game);
        assert_eq!(game.state(), GameState::MainMenu);
        game.ctx.events.fire_command("quit");
        frame(&mut game);
        assert!(game.quit_requested());
    }

    #[test]
    fn test_empty_level_list_still_has_a_map() {
        let config = GameConfig { levels: Vec::new(), ..Default::default() };
        let mut game = Game::new(config);
        frame(&mut game);
        game.ctx.events.fire_command("play");
        frame(&mut game);
        frame(&mut game);
        assert_eq!(game.state(), GameState::Gameplay);
        assert!(game.map().is_loaded());
        assert_eq!(game.map().shape_count(), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_map_index_panics() {
        let mut game = Game::new(GameConfig::default());
        game.current = 5;
        let _ = game.map();
    }
}
