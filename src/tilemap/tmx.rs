use std::path::Path;

use macroquad::math::{vec2, Rect};
use tiled::{Layer, LayerType, Loader, Map, ObjectLayer, ObjectShape, TileLayer, Tileset};

use super::{
    atlas_rect, missing_layer, TileImage, TileMap, COLLISIONS_LAYER, ENTITIES_LAYER, GROUND_LAYER, OBJECTS_LAYER,
};
use crate::error::{GameError, GameResult};

// ==================== TMX 地图 ====================

pub(super) fn load(path: &Path) -> GameResult<TileMap> {
    let map = Loader::new().load_tmx_map(path)?;
    convert(&map)
}

fn convert(map: &Map) -> GameResult<TileMap> {
    let mut out = TileMap::new(map.tile_width, map.tile_height);

    // 地面
    let ground = find_layer(map.layers(), GROUND_LAYER).ok_or_else(|| missing_layer(GROUND_LAYER))?;
    let tiles = match ground.layer_type() {
        LayerType::Tiles(TileLayer::Finite(tiles)) => tiles,
        LayerType::Tiles(TileLayer::Infinite(_)) => {
            return Err(GameError::map("infinite maps are not supported"))
        }
        _ => return Err(GameError::map(format!("layer '{}' is not a tile layer", GROUND_LAYER))),
    };
    for row in 0..tiles.height() {
        for col in 0..tiles.width() {
            let Some(tile) = tiles.get_tile(col as i32, row as i32) else {
                continue;
            };
            let image = tile_image(tile.get_tileset(), tile.id(), tile.flip_h, tile.flip_v)?;
            out.add_ground(col, row, image);
        }
    }

    // 可见障碍物
    for object in object_layer(map, OBJECTS_LAYER)?.objects() {
        let image = match object.get_tile() {
            Some(tile) => Some(tile_image(tile.get_tileset(), tile.id(), tile.flip_h, tile.flip_v)?),
            None => None,
        };
        let (width, height) = shape_size(&object.shape);
        out.add_object(vec2(object.x, object.y), vec2(width, height), image);
    }

    // 隐形碰撞框
    for object in object_layer(map, COLLISIONS_LAYER)?.objects() {
        let (width, height) = shape_size(&object.shape);
        out.collisions.push(Rect::new(object.x, object.y, width, height));
    }

    // 玩家出生点与敌人刷新点
    for object in object_layer(map, ENTITIES_LAYER)?.objects() {
        out.add_entity(&object.name, vec2(object.x, object.y));
    }

    Ok(out)
}

/// 按名称查找图层，会进入分组图层
fn find_layer<'map>(layers: impl Iterator<Item = Layer<'map>>, name: &str) -> Option<Layer<'map>> {
    for layer in layers {
        if layer.name == name {
            return Some(layer);
        }
        if let LayerType::Group(group) = layer.layer_type() {
            if let Some(found) = find_layer(group.layers(), name) {
                return Some(found);
            }
        }
    }
    None
}

fn object_layer<'map>(map: &'map Map, name: &str) -> GameResult<ObjectLayer<'map>> {
    let layer = find_layer(map.layers(), name).ok_or_else(|| missing_layer(name))?;
    match layer.layer_type() {
        LayerType::Objects(objects) => Ok(objects),
        _ => Err(GameError::map(format!("layer '{}' is not an object layer", name))),
    }
}

/// 点和其它非矩形对象没有尺寸
fn shape_size(shape: &ObjectShape) -> (f32, f32) {
    match shape {
        ObjectShape::Rect { width, height } => (*width, *height),
        _ => (0.0, 0.0),
    }
}

fn tile_image(tileset: &Tileset, id: u32, flip_x: bool, flip_y: bool) -> GameResult<TileImage> {
    // 图集
    if let Some(image) = &tileset.image {
        let tile_size = vec2(tileset.tile_width as f32, tileset.tile_height as f32);
        return Ok(TileImage {
            path: image.source.clone(),
            source: Some(atlas_rect(id, tileset.columns, tile_size, tileset.margin, tileset.spacing)),
            size: tile_size,
            flip_x,
            flip_y,
        });
    }

    // 图片集合
    let tile = tileset
        .get_tile(id)
        .ok_or_else(|| GameError::map(format!("tile {} missing from tileset '{}'", id, tileset.name)))?;
    let image = tile
        .image
        .as_ref()
        .ok_or_else(|| GameError::map(format!("tile {} in tileset '{}' has no image", id, tileset.name)))?;
    Ok(TileImage {
        path: image.source.clone(),
        source: None,
        size: vec2(image.width as f32, image.height as f32),
        flip_x,
        flip_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::scratch_dir;

    const WORLD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" tiledversion="1.10.2" orientation="orthogonal" renderorder="right-down" width="3" height="2" tilewidth="64" tileheight="64" infinite="0" nextlayerid="6" nextobjectid="6">
 <tileset firstgid="1" name="ground" tilewidth="64" tileheight="64" spacing="2" margin="1" tilecount="8" columns="4">
  <image source="../graphics/ground.png" width="264" height="132"/>
 </tileset>
 <tileset firstgid="100" source="trees.tsx"/>
 <layer id="1" name="Ground" width="3" height="2">
  <data encoding="csv">
1,2,0,
6,2147483649,1
</data>
 </layer>
 <group id="5" name="Props">
  <objectgroup id="2" name="Objects">
   <object id="1" gid="100" x="200" y="300" width="96" height="128"/>
  </objectgroup>
 </group>
 <objectgroup id="3" name="Collisions">
  <object id="2" x="0" y="0" width="192" height="10"/>
 </objectgroup>
 <objectgroup id="4" name="Entities">
  <object id="3" name="Player" x="100" y="90">
   <point/>
  </object>
  <object id="4" name="Enemy" x="10" y="20">
   <point/>
  </object>
 </objectgroup>
</map>
"#;

    const TREES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" tiledversion="1.10.2" name="trees" tilewidth="96" tileheight="128" tilecount="1" columns="0">
 <grid orientation="orthogonal" width="1" height="1"/>
 <tile id="0">
  <image source="../graphics/tree.png" width="96" height="128"/>
 </tile>
</tileset>
"#;

    fn load_world(test: &str) -> TileMap {
        let dir = scratch_dir(test);
        std::fs::write(dir.join("trees.tsx"), TREES).unwrap();
        let path = dir.join("world.tmx");
        std::fs::write(&path, WORLD).unwrap();
        TileMap::load(&path).unwrap()
    }

    #[test]
    fn test_ground_tiles() {
        let map = load_world("tmx_ground");
        assert_eq!(map.tile_size, vec2(64.0, 64.0));
        assert_eq!(map.ground.len(), 5);
        assert_eq!(map.ground[2].position, vec2(0.0, 64.0));

        let tile = &map.ground[2].image;
        assert!(tile.path.ends_with("graphics/ground.png"));
        // 本地 5 -> 第 1 列第 1 行: 1 + 1 * (64 + 2)
        assert_eq!(tile.source, Some(Rect::new(67.0, 67.0, 64.0, 64.0)));
    }

    #[test]
    fn test_flipped_tile() {
        let map = load_world("tmx_flip");
        let tile = &map.ground[3].image;
        assert!(tile.flip_x);
        assert!(!tile.flip_y);
        assert_eq!(tile.source, Some(Rect::new(1.0, 1.0, 64.0, 64.0)));
    }

    #[test]
    fn test_objects_collisions_and_entities() {
        let map = load_world("tmx_objects");
        assert_eq!(map.objects.len(), 1);
        let object = &map.objects[0];
        assert_eq!(object.rect, Rect::new(200.0, 172.0, 96.0, 128.0));
        let image = object.image.as_ref().unwrap();
        assert!(image.path.ends_with("graphics/tree.png"));
        assert_eq!(image.source, None);

        assert_eq!(map.collisions, vec![Rect::new(0.0, 0.0, 192.0, 10.0)]);
        assert_eq!(map.player_start, Some(vec2(100.0, 90.0)));
        assert_eq!(map.spawn_positions, vec![vec2(10.0, 20.0)]);
    }

    #[test]
    fn test_missing_layer_is_map_error() {
        let dir = scratch_dir("tmx_missing_layer");
        let path = dir.join("empty.tmx");
        std::fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" renderorder="right-down" width="1" height="1" tilewidth="64" tileheight="64" infinite="0">
 <objectgroup id="1" name="Entities"/>
</map>
"#,
        )
        .unwrap();
        let err = TileMap::load(&path).unwrap_err();
        assert!(matches!(err, GameError::Map { .. }));
        assert!(err.to_string().contains("Ground"));
    }

    #[test]
    fn test_missing_file_is_tiled_error() {
        let err = TileMap::load("no/such/world.tmx").unwrap_err();
        assert!(matches!(err, GameError::Tiled(_)));
    }
}
