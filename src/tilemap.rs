use std::path::{Path, PathBuf};

use macroquad::math::{vec2, Rect, Vec2};

use crate::error::{GameError, GameResult};

mod json;
mod tmx;

// ==================== 地图层名称 ====================

pub const GROUND_LAYER: &str = "Ground";
pub const OBJECTS_LAYER: &str = "Objects";
pub const COLLISIONS_LAYER: &str = "Collisions";
pub const ENTITIES_LAYER: &str = "Entities";
pub const PLAYER_OBJECT: &str = "Player";

// ==================== 解析结果 ====================

/// 图块图像：图片路径，加上图集中的子区域和翻转标记
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    pub path: PathBuf,
    pub source: Option<Rect>,
    pub size: Vec2,
    pub flip_x: bool,
    pub flip_y: bool,
}

/// 地面图块
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub position: Vec2,
    pub image: TileImage,
}

/// 障碍物，没有图像的是隐形碰撞框
#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    pub rect: Rect,
    pub image: Option<TileImage>,
}

/// 加载完成的地图
#[derive(Debug, Clone, Default)]
pub struct TileMap {
    pub tile_size: Vec2,
    pub ground: Vec<Tile>,
    pub objects: Vec<MapObject>,
    pub collisions: Vec<Rect>,
    pub player_start: Option<Vec2>,
    pub spawn_positions: Vec<Vec2>,
}

impl TileMap {
    /// `.tmx` 交给 tiled 解析，其余按 Tiled JSON 读取
    pub fn load(path: impl AsRef<Path>) -> GameResult<Self> {
        let path = path.as_ref();
        let map = match path.extension().and_then(|e| e.to_str()) {
            Some("tmx") => tmx::load(path)?,
            _ => {
                let text = std::fs::read_to_string(path).map_err(|e| GameError::io(path, e))?;
                let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
                Self::from_json(&text, base_dir)?
            }
        };
        log::info!(
            "Map {} loaded: {} ground tiles, {} objects, {} collisions, {} spawns",
            path.display(),
            map.ground.len(),
            map.objects.len(),
            map.collisions.len(),
            map.spawn_positions.len()
        );
        Ok(map)
    }

    /// `base_dir` 用于解析图片和外部图块集的相对路径
    pub fn from_json(text: &str, base_dir: &Path) -> GameResult<Self> {
        json::parse(text, base_dir)
    }

    /// 所有阻挡移动的矩形
    pub fn obstacle_rects(&self) -> Vec<Rect> {
        self.objects
            .iter()
            .map(|o| o.rect)
            .chain(self.collisions.iter().copied())
            .collect()
    }

    fn new(tile_width: u32, tile_height: u32) -> Self {
        Self {
            tile_size: vec2(tile_width as f32, tile_height as f32),
            ..Default::default()
        }
    }

    fn add_ground(&mut self, col: u32, row: u32, image: TileImage) {
        self.ground.push(Tile {
            position: vec2(col as f32 * self.tile_size.x, row as f32 * self.tile_size.y),
            image,
        });
    }

    /// Objects 层的对象；图块对象在 Tiled 中以底边为 y
    fn add_object(&mut self, position: Vec2, size: Vec2, image: Option<TileImage>) {
        let size = match &image {
            Some(img) if size.x == 0.0 || size.y == 0.0 => img.size,
            _ => size,
        };
        let y = if image.is_some() { position.y - size.y } else { position.y };
        self.objects.push(MapObject {
            rect: Rect::new(position.x, y, size.x, size.y),
            image,
        });
    }

    fn add_entity(&mut self, name: &str, position: Vec2) {
        if name == PLAYER_OBJECT {
            self.player_start = Some(position);
        } else {
            self.spawn_positions.push(position);
        }
    }
}

/// 图集中第 `local` 个图块的位置，考虑外边距和间距
fn atlas_rect(local: u32, columns: u32, tile_size: Vec2, margin: u32, spacing: u32) -> Rect {
    let columns = columns.max(1);
    let col = local % columns;
    let row = local / columns;
    let x = margin as f32 + col as f32 * (tile_size.x + spacing as f32);
    let y = margin as f32 + row as f32 * (tile_size.y + spacing as f32);
    Rect::new(x, y, tile_size.x, tile_size.y)
}

fn missing_layer(name: &str) -> GameError {
    GameError::map(format!("missing layer '{}'", name))
}

/// 测试用的临时目录，每个测试一个
#[cfg(test)]
pub(crate) fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("one_piece_{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
