use macroquad::math::Vec2;
use macroquad::texture::Image;

use crate::mask::Mask;

// ==================== 帧数据 ====================

/// 一帧图像在逻辑层的数据：显示尺寸和碰撞遮罩
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub size: Vec2,
    pub mask: Mask,
}

impl Frame {
    pub fn from_image(image: &Image, scale: f32) -> Self {
        let mask = Mask::from_image(image);
        let mask = if scale == 1.0 { mask } else { mask.scaled(scale) };
        Self {
            size: mask.size(),
            mask,
        }
    }

    /// 全实心的矩形帧
    #[cfg(test)]
    pub fn solid(width: usize, height: usize) -> Self {
        let mask = Mask::filled(width, height);
        Self {
            size: mask.size(),
            mask,
        }
    }
}

/// 玩家动画状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    Idle,
    Left,
    Right,
}

/// 玩家各状态的帧
#[derive(Debug, Clone)]
pub struct PlayerFrames {
    /// 初始图像，决定玩家矩形大小
    pub base: Frame,
    pub idle: Vec<Frame>,
    pub left: Vec<Frame>,
    pub right: Vec<Frame>,
}

impl PlayerFrames {
    pub fn frames(&self, state: PlayerState) -> &[Frame] {
        match state {
            PlayerState::Idle => &self.idle,
            PlayerState::Left => &self.left,
            PlayerState::Right => &self.right,
        }
    }
}

/// 一种敌人的动画帧
#[derive(Debug, Clone)]
pub struct EnemyKind {
    pub name: String,
    pub frames: Vec<Frame>,
}

/// 游戏逻辑需要的全部图像数据
#[derive(Debug, Clone)]
pub struct Sheets {
    pub player: PlayerFrames,
    pub enemies: Vec<EnemyKind>,
    pub bullet: Frame,
    pub gun: Frame,
}

// ==================== 帧文件排序 ====================

/// 只保留 png，按文件名中的数字排序，非数字的排在最前
pub fn order_frame_files(names: &[String]) -> Vec<String> {
    let mut files: Vec<String> = names
        .iter()
        .filter(|name| name.ends_with(".png"))
        .cloned()
        .collect();
    files.sort_by_key(|name| (frame_number(name), name.clone()));
    files
}

fn frame_number(name: &str) -> i64 {
    let stem = name.split('.').next().unwrap_or("");
    stem.parse::<i64>().unwrap_or(-1)
}
