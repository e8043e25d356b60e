use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use macroquad::miniquad::conf::Icon;
use macroquad::prelude::*;

use crate::error::{GameError, GameResult};
use crate::settings::Settings;
use crate::sheet::{order_frame_files, EnemyKind, Frame, PlayerFrames, PlayerState, Sheets};
use crate::tilemap::TileMap;

// ==================== 纹理资源 ====================

pub struct PlayerTextures {
    pub base: Texture2D,
    pub idle: Vec<Texture2D>,
    pub left: Vec<Texture2D>,
    pub right: Vec<Texture2D>,
}

pub struct EnemyTextures {
    pub frames: Vec<Texture2D>,
    /// 第 0 帧的白色剪影
    pub silhouette: Texture2D,
}

/// 渲染用的全部纹理，与 `Sheets` 中的帧一一对应
pub struct Assets {
    pub player: PlayerTextures,
    pub enemies: Vec<EnemyTextures>,
    pub bullet: Texture2D,
    pub gun: Texture2D,
    pub logo: Option<Texture2D>,
    pub tiles: HashMap<PathBuf, Texture2D>,
}

impl Assets {
    pub fn player_texture(&self, current: Option<(PlayerState, usize)>) -> &Texture2D {
        let Some((state, index)) = current else {
            return &self.player.base;
        };
        let frames = match state {
            PlayerState::Idle => &self.player.idle,
            PlayerState::Left => &self.player.left,
            PlayerState::Right => &self.player.right,
        };
        frames.get(index).unwrap_or(&self.player.base)
    }

    pub fn enemy_texture(&self, kind: usize, frame: usize, alive: bool) -> Option<&Texture2D> {
        let textures = self.enemies.get(kind)?;
        if alive {
            textures.frames.get(frame)
        } else {
            Some(&textures.silhouette)
        }
    }
}

// ==================== 加载 ====================

async fn load_image_file(path: &Path) -> GameResult<Image> {
    load_image(&path.to_string_lossy())
        .await
        .map_err(|e| GameError::asset(path, e))
}

/// 同时得到纹理和逻辑帧
async fn load_frame(path: &Path, scale: f32) -> GameResult<(Texture2D, Frame)> {
    let image = load_image_file(path).await?;
    Ok((Texture2D::from_image(&image), Frame::from_image(&image, scale)))
}

fn placeholder(width: u16, height: u16, color: Color, scale: f32) -> (Texture2D, Frame) {
    let image = Image::gen_image_color(width, height, color);
    (Texture2D::from_image(&image), Frame::from_image(&image, scale))
}

/// 目录中按数字顺序排列的 png；目录不存在时返回空
fn frame_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Animation folder not found at {}: {}", dir.display(), e);
            return Vec::new();
        }
    };
    let names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    order_frame_files(&names).into_iter().map(|name| dir.join(name)).collect()
}

async fn load_animation(dir: &Path, scale: f32) -> (Vec<Texture2D>, Vec<Frame>) {
    let mut textures = Vec::new();
    let mut frames = Vec::new();
    for path in frame_files(dir) {
        match load_frame(&path, scale).await {
            Ok((texture, frame)) => {
                textures.push(texture);
                frames.push(frame);
            }
            Err(e) => log::warn!("Error loading image: {}", e),
        }
    }
    (textures, frames)
}

async fn load_player(settings: &Settings) -> (PlayerTextures, PlayerFrames) {
    let dir = settings.image_dir().join("player");
    let first = dir.join("Left").join("0.png");

    let (base_texture, base) = match load_frame(&first, settings.player_base_scale).await {
        Ok(loaded) => loaded,
        Err(e) => {
            log::warn!("Default player image not found, using a placeholder: {}", e);
            let side = settings.tile_size as u16;
            placeholder(side, side, MAGENTA, settings.player_base_scale)
        }
    };

    let (idle_textures, idle) = match load_frame(&first, settings.player_frame_scale).await {
        Ok((texture, frame)) => (vec![texture], vec![frame]),
        Err(e) => {
            log::warn!("Idle animation frame not found: {}", e);
            (Vec::new(), Vec::new())
        }
    };

    let (left_textures, left) = load_animation(&dir.join("Left"), settings.player_frame_scale).await;
    let (right_textures, right) = load_animation(&dir.join("Right"), settings.player_frame_scale).await;
    log::info!(
        "Player frames: {} idle, {} left, {} right",
        idle.len(),
        left.len(),
        right.len()
    );

    (
        PlayerTextures {
            base: base_texture,
            idle: idle_textures,
            left: left_textures,
            right: right_textures,
        },
        PlayerFrames { base, idle, left, right },
    )
}

async fn load_enemies(settings: &Settings) -> (Vec<EnemyTextures>, Vec<EnemyKind>) {
    let root = settings.image_dir().join("enemies");
    let mut folders: Vec<(String, PathBuf)> = match std::fs::read_dir(&root) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
            .collect(),
        Err(e) => {
            log::warn!("Enemy folder not found at {}: {}", root.display(), e);
            Vec::new()
        }
    };
    folders.sort();

    let mut textures = Vec::new();
    let mut kinds = Vec::new();
    for (name, path) in folders {
        let (frame_textures, frames) = load_animation(&path, 1.0).await;
        let Some(first) = frames.first() else {
            log::warn!("Enemy '{}' has no frames, skipped", name);
            continue;
        };
        let silhouette = Texture2D::from_image(&first.mask.silhouette());
        textures.push(EnemyTextures {
            frames: frame_textures,
            silhouette,
        });
        kinds.push(EnemyKind { name, frames });
    }
    log::info!("Loaded {} enemy kinds", kinds.len());
    (textures, kinds)
}

async fn load_tiles(map: &TileMap) -> HashMap<PathBuf, Texture2D> {
    let mut tiles = HashMap::new();
    let mut failed = HashSet::new();
    let paths = map
        .ground
        .iter()
        .map(|tile| &tile.image.path)
        .chain(map.objects.iter().filter_map(|o| o.image.as_ref().map(|i| &i.path)));
    for path in paths {
        if tiles.contains_key(path) || failed.contains(path) {
            continue;
        }
        match load_image_file(path).await {
            Ok(image) => {
                tiles.insert(path.clone(), Texture2D::from_image(&image));
            }
            Err(e) => {
                log::warn!("Could not load tile image: {}", e);
                failed.insert(path.clone());
            }
        }
    }
    tiles
}

/// 加载全部图像；缺失的图片用占位图代替并记录警告
pub async fn load(settings: &Settings, map: &TileMap) -> (Assets, Sheets) {
    let images = settings.image_dir();

    let (player_textures, player_frames) = load_player(settings).await;
    let (enemy_textures, enemy_kinds) = load_enemies(settings).await;

    let (bullet_texture, bullet) = match load_frame(&images.join("gun").join("bullet.png"), 1.0).await {
        Ok(loaded) => loaded,
        Err(e) => {
            log::warn!("Could not load bullet image, using a red placeholder: {}", e);
            placeholder(10, 5, RED, 1.0)
        }
    };

    let (gun_texture, gun) = match load_frame(&images.join("gun").join("gun.png"), 1.0).await {
        Ok(loaded) => loaded,
        Err(e) => {
            log::warn!("Could not load gun image, using a grey placeholder: {}", e);
            placeholder(48, 16, GRAY, 1.0)
        }
    };

    let logo = match load_image_file(&images.join("Logo").join("One.png")).await {
        Ok(image) => Some(Texture2D::from_image(&image)),
        Err(e) => {
            log::warn!("Logo image not found, continuing without it: {}", e);
            None
        }
    };

    let tiles = load_tiles(map).await;

    let assets = Assets {
        player: player_textures,
        enemies: enemy_textures,
        bullet: bullet_texture,
        gun: gun_texture,
        logo,
        tiles,
    };
    let sheets = Sheets {
        player: player_frames,
        enemies: enemy_kinds,
        bullet,
        gun,
    };
    (assets, sheets)
}

// ==================== 窗口图标 ====================

/// 最近邻缩放为 size x size 的 RGBA 数据
fn resize_rgba(image: &Image, size: usize) -> Vec<u8> {
    let (w, h) = (image.width as usize, image.height as usize);
    let mut out = vec![0u8; size * size * 4];
    if w == 0 || h == 0 {
        return out;
    }
    for y in 0..size {
        let sy = y * h / size;
        for x in 0..size {
            let sx = x * w / size;
            let src = (sy * w + sx) * 4;
            let dst = (y * size + x) * 4;
            out[dst..dst + 4].copy_from_slice(&image.bytes[src..src + 4]);
        }
    }
    out
}

pub fn icon_from_image(image: &Image) -> Icon {
    let mut icon = Icon {
        small: [0; 16 * 16 * 4],
        medium: [0; 32 * 32 * 4],
        big: [0; 64 * 64 * 4],
    };
    icon.small.copy_from_slice(&resize_rgba(image, 16));
    icon.medium.copy_from_slice(&resize_rgba(image, 32));
    icon.big.copy_from_slice(&resize_rgba(image, 64));
    icon
}

/// 窗口创建前同步读取图标
pub fn window_icon(path: &Path) -> GameResult<Icon> {
    let bytes = std::fs::read(path).map_err(|e| GameError::io(path, e))?;
    let image = Image::from_file_with_format(&bytes, None).map_err(|e| GameError::asset(path, e))?;
    Ok(icon_from_image(&image))
}
