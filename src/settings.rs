use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

// ==================== 游戏配置 ====================

/// 所有可调参数，JSON 中缺省的字段使用默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window_width: f32,
    pub window_height: f32,
    pub window_title: String,
    pub tile_size: f32,

    // 玩家
    pub player_speed: f32,
    pub player_max_health: i32,
    pub player_animation_speed: f32,
    pub player_base_scale: f32,
    pub player_frame_scale: f32,
    pub player_hitbox_shrink: f32,

    // 枪与子弹
    pub gun_distance: f32,
    pub gun_cooldown_ms: u64,
    pub bullet_speed: f32,
    pub bullet_lifetime_ms: u64,

    // 敌人
    pub enemy_speed: f32,
    pub enemy_animation_speed: f32,
    pub enemy_hitbox_inflate: (f32, f32),
    pub enemy_death_duration_ms: u64,
    pub enemy_spawn_interval_ms: u64,

    // 战斗
    pub player_hit_cooldown_ms: u64,
    pub damage_per_hit: i32,
    pub score_per_kill: u32,

    // 音量
    pub shoot_volume: f32,
    pub impact_volume: f32,
    pub music_volume: f32,

    // 资源路径
    pub asset_root: PathBuf,
    pub map_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_width: 1280.0,
            window_height: 720.0,
            window_title: "One Piece".to_owned(),
            tile_size: 64.0,
            player_speed: 500.0,
            player_max_health: 100,
            player_animation_speed: 10.0,
            player_base_scale: 2.0,
            player_frame_scale: 1.75,
            player_hitbox_shrink: 60.0,
            gun_distance: 140.0,
            gun_cooldown_ms: 200,
            bullet_speed: 1000.0,
            bullet_lifetime_ms: 1000,
            enemy_speed: 300.0,
            enemy_animation_speed: 6.0,
            enemy_hitbox_inflate: (-20.0, -40.0),
            enemy_death_duration_ms: 400,
            enemy_spawn_interval_ms: 300,
            player_hit_cooldown_ms: 1000,
            damage_per_hit: 10,
            score_per_kill: 10,
            shoot_volume: 0.4,
            impact_volume: 1.0,
            music_volume: 0.3,
            asset_root: PathBuf::from("One piece"),
            map_file: PathBuf::from("data/maps/world.tmx"),
        }
    }
}

impl Settings {
    /// 读取配置文件；文件不存在时返回默认配置
    pub fn load(path: impl AsRef<Path>) -> GameResult<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(GameError::io(path, e)),
        }
    }

    pub fn from_json(text: &str) -> GameResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn image_dir(&self) -> PathBuf {
        self.asset_root.join("images")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.asset_root.join("audio")
    }

    pub fn map_path(&self) -> PathBuf {
        self.asset_root.join(&self.map_file)
    }
}
