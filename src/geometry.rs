use macroquad::math::{Rect, Vec2};

// ==================== 矩形辅助函数 ====================

/// 以中心为基准缩放矩形（负值表示收缩）
pub fn inflate(rect: Rect, dx: f32, dy: f32) -> Rect {
    let w = (rect.w + dx).max(0.0);
    let h = (rect.h + dy).max(0.0);
    with_center(Rect::new(0.0, 0.0, w, h), rect.center())
}

/// 返回把中心移动到 `center` 的新矩形
pub fn with_center(rect: Rect, center: Vec2) -> Rect {
    Rect::new(center.x - rect.w / 2.0, center.y - rect.h / 2.0, rect.w, rect.h)
}

/// 严格相交判定，边缘贴合不算碰撞
pub fn colliderect(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h
}

// ==================== 碰撞修正 ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// 沿一个轴把 hitbox 推出所有重叠的障碍物
pub fn resolve_axis(hitbox: &mut Rect, direction: Vec2, axis: Axis, obstacles: &[Rect]) {
    for obstacle in obstacles {
        if !colliderect(obstacle, hitbox) {
            continue;
        }
        match axis {
            Axis::Horizontal => {
                if direction.x > 0.0 {
                    hitbox.x = obstacle.left() - hitbox.w;
                }
                if direction.x < 0.0 {
                    hitbox.x = obstacle.right();
                }
            }
            Axis::Vertical => {
                if direction.y < 0.0 {
                    hitbox.y = obstacle.bottom();
                }
                if direction.y > 0.0 {
                    hitbox.y = obstacle.top() - hitbox.h;
                }
            }
        }
    }
}

/// 先水平后垂直移动，每一步之后修正碰撞。
///
/// 位移被拆成不超过 hitbox 尺寸的小步，长帧也不会穿过障碍物。
pub fn move_and_collide(hitbox: &mut Rect, direction: Vec2, speed: f32, dt: f32, obstacles: &[Rect]) {
    let delta = direction * speed * dt;
    let steps = sub_steps(delta, hitbox.w, hitbox.h);
    let step = delta / steps as f32;
    for _ in 0..steps {
        hitbox.x += step.x;
        resolve_axis(hitbox, direction, Axis::Horizontal, obstacles);
        hitbox.y += step.y;
        resolve_axis(hitbox, direction, Axis::Vertical, obstacles);
    }
}

fn sub_steps(delta: Vec2, width: f32, height: f32) -> u32 {
    let x = delta.x.abs() / width.max(1.0);
    let y = delta.y.abs() / height.max(1.0);
    (x.max(y).ceil() as u32).max(1)
}

/// 方向角（度），与 atan2(y, x) 一致
pub fn angle_degrees(direction: Vec2) -> f32 {
    direction.y.atan2(direction.x).to_degrees()
}
