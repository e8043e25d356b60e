use macroquad::prelude::*;

mod assets;
mod audio;
mod bullet;
mod enemy;
mod error;
mod game;
mod geometry;
mod gun;
mod logger;
mod mask;
mod player;
mod render;
mod settings;
mod sheet;
mod tilemap;
mod ui;

use crate::audio::Sounds;
use crate::game::{FrameInput, Game, GameEvent, GameState};
use crate::player::MoveKeys;
use crate::settings::Settings;
use crate::tilemap::TileMap;

const SETTINGS_FILE: &str = "settings.json";
/// 拖动窗口等卡顿之后的一帧最多按 50ms 计算
const MAX_FRAME_TIME: f32 = 1.0 / 20.0;

fn load_settings() -> Settings {
    match Settings::load(SETTINGS_FILE) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Invalid {}, using defaults: {}", SETTINGS_FILE, e);
            Settings::default()
        }
    }
}

// ==================== 配置窗口 ====================

fn window_conf() -> Conf {
    // 窗口在 main 之前创建，日志也在这里初始化
    logger::init();
    let settings = load_settings();

    let icon_path = settings.image_dir().join("Logo").join("One.png");
    let (window_title, icon) = match assets::window_icon(&icon_path) {
        Ok(icon) => (settings.window_title.clone(), Some(icon)),
        Err(e) => {
            log::warn!("Could not load window icon: {}", e);
            (format!("{} (No Icon)", settings.window_title), None)
        }
    };

    Conf {
        window_title,
        window_width: settings.window_width as i32,
        window_height: settings.window_height as i32,
        icon,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let settings = load_settings();

    // ==================== 地图加载 ====================
    let map = match TileMap::load(settings.map_path()) {
        Ok(map) => map,
        Err(e) => {
            log::error!("Failed to load map {}: {}", settings.map_path().display(), e);
            return;
        }
    };

    // ==================== 资源加载 ====================
    log::info!("=== Loading Game Assets ===");
    let (assets, sheets) = assets::load(&settings, &map).await;
    let sounds = Sounds::load(&settings).await;
    log::info!("=== Asset Loading Complete ===");

    let mut game = match Game::new(settings, sheets, map) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Failed to set up the level: {}", e);
            return;
        }
    };

    sounds.start_music();
    show_mouse(true);

    loop {
        let dt = get_frame_time().min(MAX_FRAME_TIME);

        // 处理输入
        let input = read_input();

        // 更新游戏逻辑
        for event in game.update(dt, &input) {
            handle_event(&event, &sounds);
        }

        // 渲染
        match game.state {
            GameState::Menu => ui::draw_menu(&game.menu, assets.logo.as_ref()),
            GameState::Playing => {
                clear_background(BLACK);
                render::draw_world(&game, &assets);
                ui::draw_health_bar(game.player_health, game.player_max_health);
                ui::draw_score(game.score);
            }
        }

        next_frame().await
    }
}

// ==================== 处理输入 ====================

fn read_input() -> FrameInput {
    let (mouse_x, mouse_y) = mouse_position();
    FrameInput {
        movement: MoveKeys {
            up: is_key_down(KeyCode::W),
            down: is_key_down(KeyCode::S),
            left: is_key_down(KeyCode::A),
            right: is_key_down(KeyCode::D),
        },
        mouse: vec2(mouse_x, mouse_y),
        fire: is_mouse_button_down(MouseButton::Left),
        start: is_key_pressed(KeyCode::Space),
        screen_size: vec2(screen_width(), screen_height()),
    }
}

fn handle_event(event: &GameEvent, sounds: &Sounds) {
    match event {
        GameEvent::Started => show_mouse(false),
        GameEvent::GameOver { .. } => show_mouse(true),
        GameEvent::PlayerHit { health } => log::debug!("Player hit, health {}", health),
        _ => {}
    }
    sounds.play(event);
}
