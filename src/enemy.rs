use macroquad::math::{Rect, Vec2};

use crate::geometry::{inflate, move_and_collide, with_center};
use crate::settings::Settings;
use crate::sheet::{EnemyKind, Frame};

// ==================== 敌人 ====================

/// 追踪玩家的敌人；被击中后闪白一段时间再消失
#[derive(Debug, Clone)]
pub struct Enemy {
    /// 在 `Sheets::enemies` 中的下标
    pub kind: usize,
    pub frame_count: usize,
    pub frame_index: f32,
    pub animation_speed: f32,
    pub rect: Rect,
    pub hitbox: Rect,
    pub direction: Vec2,
    pub speed: f32,
    pub death_time: Option<u64>,
    pub death_duration: u64,
}

impl Enemy {
    pub fn new(kind_index: usize, kind: &EnemyKind, center: Vec2, settings: &Settings) -> Self {
        let size = kind.frames.first().map(|f| f.size).unwrap_or(Vec2::ZERO);
        let rect = with_center(Rect::new(0.0, 0.0, size.x, size.y), center);
        let (dx, dy) = settings.enemy_hitbox_inflate;
        Self {
            kind: kind_index,
            frame_count: kind.frames.len(),
            frame_index: 0.0,
            animation_speed: settings.enemy_animation_speed,
            rect,
            hitbox: inflate(rect, dx, dy),
            direction: Vec2::ZERO,
            speed: settings.enemy_speed,
            death_time: None,
            death_duration: settings.enemy_death_duration_ms,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    pub fn is_alive(&self) -> bool {
        self.death_time.is_none()
    }

    /// 当前帧下标；死亡后固定为第 0 帧的剪影
    pub fn frame(&self) -> usize {
        if self.is_alive() {
            self.frame_index as usize
        } else {
            0
        }
    }

    fn animate(&mut self, dt: f32) {
        self.frame_index += self.animation_speed * dt;
        if self.frame_index >= self.frame_count as f32 {
            self.frame_index = 0.0;
        }
    }

    fn move_towards(&mut self, target: Vec2, dt: f32, obstacles: &[Rect]) {
        let to_player = target - self.center();
        self.direction = to_player.normalize_or_zero();
        move_and_collide(&mut self.hitbox, self.direction, self.speed, dt, obstacles);
        self.rect = with_center(self.rect, self.hitbox.center());
    }

    pub fn update(&mut self, dt: f32, player_center: Vec2, obstacles: &[Rect]) {
        if self.is_alive() {
            self.move_towards(player_center, dt, obstacles);
            self.animate(dt);
        }
    }

    pub fn destroy(&mut self, now: u64) {
        if self.is_alive() {
            self.death_time = Some(now);
        }
    }

    /// 死亡闪白结束，可以移除
    pub fn is_finished(&self, now: u64) -> bool {
        match self.death_time {
            Some(time) => now.saturating_sub(time) >= self.death_duration,
            None => false,
        }
    }

    /// 当前帧在世界中的位置，锚定在矩形左上角
    pub fn image_rect(&self, frame: &Frame) -> Rect {
        Rect::new(self.rect.x, self.rect.y, frame.size.x, frame.size.y)
    }
}
