use macroquad::math::{vec2, Rect, Vec2};

use crate::geometry::{angle_degrees, with_center};
use crate::mask::Mask;
use crate::sheet::Frame;

/// 子弹：沿固定方向飞行，超过寿命后消失
#[derive(Debug, Clone)]
pub struct Bullet {
    pub rect: Rect,
    pub direction: Vec2,
    pub angle: f32,
    pub speed: f32,
    pub spawn_time: u64,
    pub lifetime: u64,
    /// 旋转后的遮罩，与 rect 大小一致
    pub mask: Mask,
}

impl Bullet {
    pub fn new(frame: &Frame, center: Vec2, direction: Vec2, speed: f32, now: u64, lifetime: u64) -> Self {
        let direction = if direction.length_squared() > 0.0 {
            direction.normalize()
        } else {
            vec2(0.0, -1.0)
        };
        let angle = angle_degrees(direction);
        let mask = frame.mask.rotated(angle);
        let size = mask.size();
        Self {
            rect: with_center(Rect::new(0.0, 0.0, size.x, size.y), center),
            direction,
            angle,
            speed,
            spawn_time: now,
            lifetime,
            mask,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    pub fn update(&mut self, dt: f32) {
        let center = self.center() + self.direction * self.speed * dt;
        self.rect = with_center(self.rect, center);
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.spawn_time) >= self.lifetime
    }
}
