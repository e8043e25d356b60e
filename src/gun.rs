use macroquad::math::{vec2, Vec2};

use crate::geometry::angle_degrees;

/// 绕着玩家旋转、指向鼠标的枪
#[derive(Debug, Clone)]
pub struct Gun {
    pub center: Vec2,
    pub direction: Vec2,
    pub distance: f32,
}

impl Gun {
    pub fn new(player_center: Vec2, distance: f32) -> Self {
        let direction = vec2(0.0, 1.0);
        Self {
            center: player_center + direction * distance,
            direction,
            distance,
        }
    }

    /// 玩家总是在屏幕中央，所以方向取鼠标相对屏幕中心的位置；
    /// 鼠标正好在中心时沿用上一帧的方向
    pub fn aim(&mut self, mouse: Vec2, screen_center: Vec2) {
        let offset = mouse - screen_center;
        if offset.length_squared() > 0.0 {
            self.direction = offset.normalize();
        }
    }

    pub fn angle(&self) -> f32 {
        angle_degrees(self.direction)
    }

    pub fn update(&mut self, player_center: Vec2, mouse: Vec2, screen_center: Vec2) {
        self.aim(mouse, screen_center);
        self.center = player_center + self.direction * self.distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_below_player() {
        let gun = Gun::new(vec2(100.0, 100.0), 140.0);
        assert_eq!(gun.center, vec2(100.0, 240.0));
        assert!((gun.angle() - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_follows_mouse() {
        let mut gun = Gun::new(Vec2::ZERO, 140.0);
        let screen_center = vec2(640.0, 360.0);
        gun.update(vec2(500.0, 500.0), vec2(940.0, 360.0), screen_center);
        assert_eq!(gun.direction, vec2(1.0, 0.0));
        assert_eq!(gun.center, vec2(640.0, 500.0));
    }

    #[test]
    fn test_mouse_at_center_keeps_direction() {
        let mut gun = Gun::new(Vec2::ZERO, 140.0);
        let screen_center = vec2(640.0, 360.0);
        gun.update(Vec2::ZERO, vec2(640.0, 0.0), screen_center);
        assert_eq!(gun.direction, vec2(0.0, -1.0));
        gun.update(Vec2::ZERO, screen_center, screen_center);
        assert_eq!(gun.direction, vec2(0.0, -1.0));
        assert_eq!(gun.center, vec2(0.0, -140.0));
    }
}
