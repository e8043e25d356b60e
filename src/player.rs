use macroquad::math::{Rect, Vec2};

use crate::geometry::{inflate, move_and_collide, with_center};
use crate::settings::Settings;
use crate::sheet::{Frame, PlayerFrames, PlayerState};

// ==================== 输入 ====================

/// 本帧按下的方向键
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveKeys {
    /// 左键覆盖右键，上键覆盖下键；结果已归一化
    pub fn direction(&self) -> Vec2 {
        let mut direction = Vec2::ZERO;
        if self.right {
            direction.x = 1.0;
        }
        if self.left {
            direction.x = -1.0;
        }
        if self.down {
            direction.y = 1.0;
        }
        if self.up {
            direction.y = -1.0;
        }
        direction.normalize_or_zero()
    }
}

// ==================== 玩家 ====================

#[derive(Debug, Clone)]
pub struct Player {
    pub rect: Rect,
    pub hitbox: Rect,
    pub direction: Vec2,
    pub state: PlayerState,
    pub frame_index: f32,
    /// 当前显示的动画帧；None 表示仍是初始图像
    pub current: Option<(PlayerState, usize)>,
    pub speed: f32,
    pub animation_speed: f32,
    frames: PlayerFrames,
}

impl Player {
    pub fn new(center: Vec2, frames: PlayerFrames, settings: &Settings) -> Self {
        let rect = with_center(Rect::new(0.0, 0.0, frames.base.size.x, frames.base.size.y), center);
        let hitbox = inflate(rect, -settings.player_hitbox_shrink * settings.player_base_scale, 0.0);
        Self {
            rect,
            hitbox,
            direction: Vec2::ZERO,
            state: PlayerState::Idle,
            frame_index: 0.0,
            current: None,
            speed: settings.player_speed,
            animation_speed: settings.player_animation_speed,
            frames,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    pub fn state_for(direction: Vec2) -> PlayerState {
        if direction.x < 0.0 {
            PlayerState::Left
        } else if direction.x > 0.0 {
            PlayerState::Right
        } else {
            PlayerState::Idle
        }
    }

    fn input(&mut self, direction: Vec2) {
        self.direction = direction;
        let previous = self.state;
        self.state = Self::state_for(direction);
        if self.state != previous {
            self.frame_index = 0.0;
        }
    }

    fn move_by(&mut self, dt: f32, obstacles: &[Rect]) {
        move_and_collide(&mut self.hitbox, self.direction, self.speed, dt, obstacles);
        self.rect = with_center(self.rect, self.hitbox.center());
    }

    fn animate(&mut self, dt: f32) {
        let len = self.frames.frames(self.state).len();
        if len == 0 {
            return;
        }
        self.frame_index += self.animation_speed * dt;
        self.current = Some((self.state, self.frame_index as usize % len));
    }

    pub fn update(&mut self, dt: f32, direction: Vec2, obstacles: &[Rect]) {
        self.input(direction);
        self.move_by(dt, obstacles);
        self.animate(dt);
    }

    /// 当前显示的帧
    pub fn frame(&self) -> &Frame {
        match self.current {
            Some((state, index)) => self
                .frames
                .frames(state)
                .get(index)
                .unwrap_or(&self.frames.base),
            None => &self.frames.base,
        }
    }

    /// 当前帧在世界中的位置。动画帧比初始图像小，
    /// 与初始图像共用左上角，不随矩形居中
    pub fn image_rect(&self) -> Rect {
        let size = self.frame().size;
        Rect::new(self.rect.x, self.rect.y, size.x, size.y)
    }
}
