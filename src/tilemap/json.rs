use std::collections::HashMap;
use std::path::{Path, PathBuf};

use macroquad::math::{vec2, Rect, Vec2};
use serde::Deserialize;

use super::{
    atlas_rect, missing_layer, TileImage, TileMap, COLLISIONS_LAYER, ENTITIES_LAYER, GROUND_LAYER, OBJECTS_LAYER,
};
use crate::error::{GameError, GameResult};

const FLIP_HORIZONTAL: u32 = 0x8000_0000;
const FLIP_VERTICAL: u32 = 0x4000_0000;
const GID_MASK: u32 = 0x0FFF_FFFF;

// ==================== Tiled JSON 格式 ====================

#[derive(Debug, Deserialize)]
struct RawMap {
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    infinite: bool,
    layers: Vec<RawLayer>,
    #[serde(default)]
    tilesets: Vec<RawTilesetRef>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawLayer {
    Tilelayer {
        name: String,
        width: u32,
        #[serde(default)]
        data: RawData,
        #[serde(default)]
        encoding: Option<String>,
    },
    Objectgroup {
        name: String,
        #[serde(default)]
        objects: Vec<RawObject>,
    },
    Group {
        #[serde(default)]
        layers: Vec<RawLayer>,
    },
    #[serde(other)]
    Other,
}

/// csv 编码是 gid 数组，base64 编码是字符串
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawData {
    Gids(Vec<u32>),
    Encoded(String),
}

impl Default for RawData {
    fn default() -> Self {
        RawData::Gids(Vec::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawObject {
    #[serde(default)]
    name: String,
    x: f32,
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    gid: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawTilesetRef {
    firstgid: u32,
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    data: RawTileset,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTileset {
    image: Option<String>,
    columns: u32,
    tilewidth: u32,
    tileheight: u32,
    margin: u32,
    spacing: u32,
    tiles: Vec<RawTile>,
}

#[derive(Debug, Deserialize)]
struct RawTile {
    id: u32,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    imagewidth: u32,
    #[serde(default)]
    imageheight: u32,
}

#[derive(Debug, Clone)]
enum TilesetKind {
    Atlas {
        image: PathBuf,
        columns: u32,
        tile_size: Vec2,
        margin: u32,
        spacing: u32,
    },
    Collection {
        tiles: HashMap<u32, (PathBuf, Vec2)>,
    },
}

#[derive(Debug, Clone)]
struct Tileset {
    firstgid: u32,
    kind: TilesetKind,
}

// ==================== 解析 ====================

pub(super) fn parse(text: &str, base_dir: &Path) -> GameResult<TileMap> {
    let raw: RawMap = serde_json::from_str(text)?;
    if raw.infinite {
        return Err(GameError::map("infinite maps are not supported"));
    }

    let mut tilesets = Vec::with_capacity(raw.tilesets.len());
    for tileset_ref in raw.tilesets {
        tilesets.push(resolve_tileset(tileset_ref, base_dir)?);
    }
    tilesets.sort_by_key(|t| t.firstgid);

    let mut layers = Vec::new();
    flatten_layers(raw.layers, &mut layers);

    let mut map = TileMap::new(raw.tilewidth, raw.tileheight);

    // 地面
    let (width, gids) = match find_layer(&layers, GROUND_LAYER)? {
        RawLayer::Tilelayer { width, data, encoding, .. } => match data {
            RawData::Gids(gids) => (*width, gids),
            RawData::Encoded(_) => {
                return Err(GameError::map(format!(
                    "{} encoded tile layer data is not supported, save the map as CSV or TMX",
                    encoding.as_deref().unwrap_or("base64")
                )))
            }
        },
        _ => return Err(GameError::map(format!("layer '{}' is not a tile layer", GROUND_LAYER))),
    };
    let width = width.max(1);
    for (index, gid) in gids.iter().enumerate() {
        if *gid & GID_MASK == 0 {
            continue;
        }
        let index = index as u32;
        map.add_ground(index % width, index / width, resolve_gid(&tilesets, *gid)?);
    }

    // 可见障碍物
    for object in object_layer(&layers, OBJECTS_LAYER)? {
        let image = match object.gid {
            Some(gid) if gid & GID_MASK != 0 => Some(resolve_gid(&tilesets, gid)?),
            _ => None,
        };
        map.add_object(vec2(object.x, object.y), vec2(object.width, object.height), image);
    }

    // 隐形碰撞框
    for object in object_layer(&layers, COLLISIONS_LAYER)? {
        map.collisions.push(Rect::new(object.x, object.y, object.width, object.height));
    }

    // 玩家出生点与敌人刷新点
    for object in object_layer(&layers, ENTITIES_LAYER)? {
        map.add_entity(&object.name, vec2(object.x, object.y));
    }

    Ok(map)
}

fn flatten_layers(layers: Vec<RawLayer>, out: &mut Vec<RawLayer>) {
    for layer in layers {
        match layer {
            RawLayer::Group { layers } => flatten_layers(layers, out),
            RawLayer::Other => {}
            other => out.push(other),
        }
    }
}

fn layer_name(layer: &RawLayer) -> Option<&str> {
    match layer {
        RawLayer::Tilelayer { name, .. } | RawLayer::Objectgroup { name, .. } => Some(name.as_str()),
        _ => None,
    }
}

fn find_layer<'a>(layers: &'a [RawLayer], name: &str) -> GameResult<&'a RawLayer> {
    layers
        .iter()
        .find(|layer| layer_name(layer) == Some(name))
        .ok_or_else(|| missing_layer(name))
}

fn object_layer<'a>(layers: &'a [RawLayer], name: &str) -> GameResult<&'a [RawObject]> {
    match find_layer(layers, name)? {
        RawLayer::Objectgroup { objects, .. } => Ok(objects.as_slice()),
        _ => Err(GameError::map(format!("layer '{}' is not an object layer", name))),
    }
}

fn resolve_tileset(tileset_ref: RawTilesetRef, base_dir: &Path) -> GameResult<Tileset> {
    let (data, dir) = match &tileset_ref.source {
        Some(source) => {
            let path = base_dir.join(source);
            let text = std::fs::read_to_string(&path).map_err(|e| GameError::io(&path, e))?;
            let data: RawTileset = serde_json::from_str(&text)?;
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (data, dir)
        }
        None => (tileset_ref.data, base_dir.to_path_buf()),
    };

    let kind = match data.image {
        Some(image) => TilesetKind::Atlas {
            image: dir.join(image),
            columns: data.columns,
            tile_size: vec2(data.tilewidth as f32, data.tileheight as f32),
            margin: data.margin,
            spacing: data.spacing,
        },
        None => TilesetKind::Collection {
            tiles: data
                .tiles
                .into_iter()
                .filter_map(|tile| {
                    let image = tile.image?;
                    let size = vec2(tile.imagewidth as f32, tile.imageheight as f32);
                    Some((tile.id, (dir.join(image), size)))
                })
                .collect(),
        },
    };

    Ok(Tileset {
        firstgid: tileset_ref.firstgid,
        kind,
    })
}

fn resolve_gid(tilesets: &[Tileset], raw_gid: u32) -> GameResult<TileImage> {
    let gid = raw_gid & GID_MASK;
    let tileset = tilesets
        .iter()
        .rev()
        .find(|t| t.firstgid <= gid)
        .ok_or_else(|| GameError::map(format!("gid {} has no tileset", gid)))?;
    let local = gid - tileset.firstgid;
    let flip_x = raw_gid & FLIP_HORIZONTAL != 0;
    let flip_y = raw_gid & FLIP_VERTICAL != 0;

    match &tileset.kind {
        TilesetKind::Atlas {
            image,
            columns,
            tile_size,
            margin,
            spacing,
        } => Ok(TileImage {
            path: image.clone(),
            source: Some(atlas_rect(local, *columns, *tile_size, *margin, *spacing)),
            size: *tile_size,
            flip_x,
            flip_y,
        }),
        TilesetKind::Collection { tiles } => {
            let (path, size) = tiles
                .get(&local)
                .ok_or_else(|| GameError::map(format!("gid {} missing from image collection", gid)))?;
            Ok(TileImage {
                path: path.clone(),
                source: None,
                size: *size,
                flip_x,
                flip_y,
            })
        }
    }
}
