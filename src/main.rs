//! Pillbox Sandbox
//!
//! Main menu keys:
//! - Enter / Space: play the first level
//! - E: open the first level in the editor
//! - 1-9: play that level
//! - Escape: quit (in a level, Escape returns here)

use macroquad::prelude::*;

use pillbox_sandbox::config::GameConfig;
use pillbox_sandbox::events::EventArgs;
use pillbox_sandbox::game::{Game, GameState};
use pillbox_sandbox::input::MacroquadInput;
use pillbox_sandbox::render::macroquad_backend::MacroquadRenderer;
use pillbox_sandbox::VERSION;

const BACKGROUND: Color = Color::new(0.07, 0.07, 0.09, 1.0);
const HUD_TEXT: Color = Color::new(0.85, 0.85, 0.85, 1.0);

fn window_conf() -> Conf {
    let config = GameConfig::load_or_default(GameConfig::DEFAULT_PATH);
    Conf {
        window_title: format!("{} v{}", config.window.title, VERSION),
        window_width: config.window.width,
        window_height: config.window.height,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Menu keys become commands on the event bus.
fn handle_menu_keys(game: &mut Game) {
    if game.state() != GameState::MainMenu {
        return;
    }
    let playable = game.playable_levels();
    let events = &mut game.ctx.events;
    if is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::Space) {
        events.fire("play", EventArgs::new().with("level", 0));
    } else if is_key_pressed(KeyCode::E) {
        events.fire("edit", EventArgs::new().with("level", 0));
    } else if is_key_pressed(KeyCode::Escape) {
        events.fire("quit", EventArgs::new());
    }

    let digits = [
        KeyCode::Key1,
        KeyCode::Key2,
        KeyCode::Key3,
        KeyCode::Key4,
        KeyCode::Key5,
        KeyCode::Key6,
        KeyCode::Key7,
        KeyCode::Key8,
        KeyCode::Key9,
    ];
    for (i, key) in digits.into_iter().enumerate().take(playable) {
        if is_key_pressed(key) {
            events.fire("play", EventArgs::new().with("level", i));
        }
    }
}

fn draw_hud(game: &Game, triangles: usize) {
    match game.state() {
        GameState::Init | GameState::Loading => {
            draw_text("Loading...", 20.0, 40.0, 32.0, HUD_TEXT);
        }
        GameState::MainMenu => {
            draw_text(&format!("PILLBOX SANDBOX v{}", VERSION), 20.0, 60.0, 48.0, HUD_TEXT);
            let lines = [
                format!("Enter: play    E: edit    1-{}: pick level", game.playable_levels()),
                "Escape: quit".to_string(),
            ];
            for (i, line) in lines.iter().enumerate() {
                draw_text(line, 20.0, 110.0 + i as f32 * 28.0, 24.0, HUD_TEXT);
            }
        }
        GameState::Gameplay | GameState::Editor => {
            let clock = game.clock();
            let mut status = format!(
                "{} | level {} | x{:.3}{} | {} tris",
                game.state().label(),
                game.current_index(),
                clock.scale(),
                if clock.is_paused() { " (paused)" } else { "" },
                triangles
            );
            if let Some(player) = game.map().player_shape() {
                status.push_str(&format!(" | health {:.2}", player.health()));
            }
            draw_text(&status, 12.0, 24.0, 22.0, HUD_TEXT);

            if game.state() == GameState::Editor {
                let editor = game.editor();
                let params = format!(
                    "next: {} {} | radius {:.2} | mass {:.2} | bounce {:.2} | friction {:.2} | drag {:.2} | spin drag {:.2}",
                    editor.alignment().as_str(),
                    editor.sim_type().as_str(),
                    editor.radius(),
                    editor.mass(),
                    editor.restitution(),
                    editor.friction(),
                    editor.drag(),
                    editor.angular_drag()
                );
                draw_text(&params, 12.0, 48.0, 20.0, HUD_TEXT);
                draw_text(
                    "[Tab] align [T] type [-/+] radius [ [/] ] mass [Y/H] bounce [U/J] friction [I/K] drag [O/L] spin drag [Del] [F5]",
                    12.0,
                    70.0,
                    18.0,
                    HUD_TEXT,
                );
            }
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Pillbox Sandbox v{} starting", VERSION);

    let config = GameConfig::load_or_default(GameConfig::DEFAULT_PATH);
    let mut game = Game::new(config);
    let mut input = MacroquadInput::new();
    let mut renderer = MacroquadRenderer::new();

    loop {
        input.poll(game.camera());
        handle_menu_keys(&mut game);
        game.update(get_frame_time(), &input);
        if game.quit_requested() {
            break;
        }

        clear_background(BACKGROUND);
        let aspect = screen_width() / screen_height().max(1.0);
        set_camera(&game.camera().to_camera2d(aspect));
        renderer.begin_frame();
        game.render(&mut renderer);

        set_default_camera();
        draw_hud(&game, renderer.triangles_this_frame());
        next_frame().await;
    }

    log::info!("Pillbox Sandbox shutting down");
}
