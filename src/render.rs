use macroquad::prelude::*;

use crate::assets::Assets;
use crate::game::{enemy_frame, Game};
use crate::geometry::with_center;
use crate::tilemap::TileImage;

// ==================== 摄像机 ====================

/// 让玩家处于屏幕中央的偏移量
pub fn camera_offset(player_center: Vec2, screen_size: Vec2) -> Vec2 {
    screen_size / 2.0 - player_center
}

/// 矩形偏移后是否落在屏幕内
pub fn on_screen(rect: &Rect, offset: Vec2, screen_size: Vec2) -> bool {
    let x = rect.x + offset.x;
    let y = rect.y + offset.y;
    x < screen_size.x && y < screen_size.y && x + rect.w > 0.0 && y + rect.h > 0.0
}

// ==================== 绘制顺序 ====================

/// 需要按 y 排序的对象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drawable {
    Object(usize),
    Player,
    Gun,
    Bullet(usize),
    Enemy(usize),
}

/// 地面之上的对象按矩形中心 y 从小到大排列，相同时保持加入顺序
pub fn draw_order(game: &Game) -> Vec<Drawable> {
    let mut items: Vec<(f32, Drawable)> = Vec::new();
    for (i, object) in game.objects.iter().enumerate() {
        if object.image.is_some() {
            items.push((object.rect.center().y, Drawable::Object(i)));
        }
    }
    items.push((game.player.center().y, Drawable::Player));
    items.push((game.gun.center.y, Drawable::Gun));
    for (i, bullet) in game.bullets.iter().enumerate() {
        items.push((bullet.center().y, Drawable::Bullet(i)));
    }
    for (i, enemy) in game.enemies.iter().enumerate() {
        items.push((enemy.center().y, Drawable::Enemy(i)));
    }
    items.sort_by(|a, b| a.0.total_cmp(&b.0));
    items.into_iter().map(|(_, d)| d).collect()
}

// ==================== 绘制世界 ====================

pub fn draw_world(game: &Game, assets: &Assets) {
    let screen = vec2(screen_width(), screen_height());
    let offset = camera_offset(game.player.center(), screen);

    for tile in &game.ground {
        let rect = Rect::new(tile.position.x, tile.position.y, tile.image.size.x, tile.image.size.y);
        if on_screen(&rect, offset, screen) {
            draw_tile(assets, &tile.image, rect, offset);
        }
    }

    for drawable in draw_order(game) {
        match drawable {
            Drawable::Object(i) => {
                let object = &game.objects[i];
                if let Some(image) = &object.image {
                    if on_screen(&object.rect, offset, screen) {
                        draw_tile(assets, image, object.rect, offset);
                    }
                }
            }
            Drawable::Player => {
                let rect = game.player.image_rect();
                let texture = assets.player_texture(game.player.current);
                draw_sprite(texture, rect, 0.0, offset);
            }
            Drawable::Gun => {
                let rect = sprite_rect(game.gun.center, game.sheets.gun.size);
                draw_sprite(&assets.gun, rect, game.gun.angle().to_radians(), offset);
            }
            Drawable::Bullet(i) => {
                let bullet = &game.bullets[i];
                let rect = sprite_rect(bullet.center(), game.sheets.bullet.size);
                if on_screen(&bullet.rect, offset, screen) {
                    draw_sprite(&assets.bullet, rect, bullet.angle.to_radians(), offset);
                }
            }
            Drawable::Enemy(i) => {
                let enemy = &game.enemies[i];
                let Some(frame) = enemy_frame(&game.sheets, enemy) else {
                    continue;
                };
                let rect = enemy.image_rect(frame);
                if !on_screen(&rect, offset, screen) {
                    continue;
                }
                if let Some(texture) = assets.enemy_texture(enemy.kind, enemy.frame(), enemy.is_alive()) {
                    draw_sprite(texture, rect, 0.0, offset);
                }
            }
        }
    }
}

/// 以 rect 为目标区域绘制，旋转绕中心
fn draw_sprite(texture: &Texture2D, rect: Rect, rotation: f32, offset: Vec2) {
    draw_texture_ex(
        texture,
        rect.x + offset.x,
        rect.y + offset.y,
        WHITE,
        DrawTextureParams {
            dest_size: Some(rect.size()),
            rotation,
            ..Default::default()
        },
    );
}

fn draw_tile(assets: &Assets, image: &TileImage, rect: Rect, offset: Vec2) {
    let Some(texture) = assets.tiles.get(&image.path) else {
        return;
    };
    draw_texture_ex(
        texture,
        rect.x + offset.x,
        rect.y + offset.y,
        WHITE,
        DrawTextureParams {
            dest_size: Some(rect.size()),
            source: image.source,
            flip_x: image.flip_x,
            flip_y: image.flip_y,
            ..Default::default()
        },
    );
}

/// 未旋转的贴图矩形，旋转时绕中心进行
fn sprite_rect(center: Vec2, size: Vec2) -> Rect {
    with_center(Rect::new(0.0, 0.0, size.x, size.y), center)
}
