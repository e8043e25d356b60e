use macroquad::prelude::*;

// ==================== 血条 ====================

const BAR_WIDTH: f32 = 200.0;
const BAR_HEIGHT: f32 = 20.0;
const BAR_MARGIN: f32 = 20.0;
const BAR_BORDER: f32 = 3.0;

/// 返回 (背景, 血量) 两个矩形，血量比例限制在 0..=1
pub fn health_bar_rects(current: i32, max: i32, screen_width: f32) -> (Rect, Rect) {
    let x = screen_width - BAR_WIDTH - BAR_MARGIN;
    let y = BAR_MARGIN;
    let ratio = if max > 0 {
        (current as f32 / max as f32).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (
        Rect::new(x, y, BAR_WIDTH, BAR_HEIGHT),
        Rect::new(x, y, BAR_WIDTH * ratio, BAR_HEIGHT),
    )
}

pub fn draw_health_bar(current: i32, max: i32) {
    let (background, health) = health_bar_rects(current, max, screen_width());
    draw_rectangle(background.x, background.y, background.w, background.h, Color::from_rgba(50, 50, 50, 255));
    draw_rectangle(health.x, health.y, health.w, health.h, Color::from_rgba(255, 0, 0, 255));
    draw_rectangle_lines(
        background.x,
        background.y,
        background.w,
        background.h,
        BAR_BORDER,
        Color::from_rgba(200, 200, 200, 255),
    );
}

pub fn draw_score(score: u32) {
    let text = format!("Score: {}", score);
    let dims = measure_text(&text, None, 40, 1.0);
    draw_text(&text, 20.0, 20.0 + dims.offset_y, 40.0, WHITE);
}

// ==================== 菜单 ====================

pub const GAME_TITLE: &str = "ONE PIECE";
pub const MENU_TITLE: &str = "Adventure";
pub const START_TEXT: &str = "Press SPACE to Start";
pub const RESTART_TEXT: &str = "Press SPACE to Play Again";
pub const CONTROLS_TEXT: &str = "WASD to Move | Mouse to Aim | Left Click to Shoot";
pub const LOGO_SIZE: f32 = 200.0;

const TITLE_COLOR: Color = Color::new(1.0, 215.0 / 255.0, 0.0, 1.0);
const CONTROLS_COLOR: Color = Color::new(200.0 / 255.0, 200.0 / 255.0, 200.0 / 255.0, 1.0);
const GAME_OVER_COLOR: Color = Color::new(1.0, 0.0, 0.0, 1.0);

/// 开始菜单 / 结算界面
#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    pub game_over: bool,
    pub final_score: u32,
    pub instructions: &'static str,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    pub fn new() -> Self {
        Self {
            game_over: false,
            final_score: 0,
            instructions: START_TEXT,
        }
    }

    pub fn set_game_over(&mut self, score: u32) {
        self.game_over = true;
        self.final_score = score;
        self.instructions = RESTART_TEXT;
    }

    pub fn reset(&mut self) {
        self.game_over = false;
        self.instructions = START_TEXT;
    }

    /// 计算每一行文字的位置
    pub fn layout(&self, has_logo: bool, width: f32, height: f32) -> Vec<MenuLine> {
        let center_x = width / 2.0;
        let mut lines = Vec::new();

        let logo_bottom = height / 5.0 + LOGO_SIZE / 2.0;
        let mut y = if has_logo { logo_bottom + 30.0 } else { height / 4.0 };

        let mut push = |text: String, size: f32, color: Color, center_y: f32| -> f32 {
            lines.push(MenuLine {
                text,
                size,
                color,
                center: vec2(center_x, center_y),
            });
            center_y + line_height(size) / 2.0
        };

        let bottom = push(GAME_TITLE.to_owned(), 80.0, TITLE_COLOR, y);
        y = bottom + 10.0;
        let bottom = push(MENU_TITLE.to_owned(), 50.0, WHITE, y);
        y = bottom + 40.0;

        if self.game_over {
            let bottom = push("Game Over".to_owned(), 50.0, GAME_OVER_COLOR, y);
            y = bottom + 20.0;
            let bottom = push(format!("Final Score: {}", self.final_score), 36.0, WHITE, y);
            y = bottom + 40.0;
        }

        push(self.instructions.to_owned(), 50.0, WHITE, y);
        push(CONTROLS_TEXT.to_owned(), 36.0, CONTROLS_COLOR, height - 50.0);
        lines
    }
}

/// 菜单中的一行文字，`center` 是文字中心
#[derive(Debug, Clone, PartialEq)]
pub struct MenuLine {
    pub text: String,
    pub size: f32,
    pub color: Color,
    pub center: Vec2,
}

fn line_height(font_size: f32) -> f32 {
    font_size * 0.75
}

pub fn draw_menu(menu: &Menu, logo: Option<&Texture2D>) {
    let (width, height) = (screen_width(), screen_height());
    clear_background(BLACK);

    if let Some(logo) = logo {
        draw_texture_ex(
            logo,
            width / 2.0 - LOGO_SIZE / 2.0,
            height / 5.0 - LOGO_SIZE / 2.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(LOGO_SIZE, LOGO_SIZE)),
                ..Default::default()
            },
        );
    }

    for line in menu.layout(logo.is_some(), width, height) {
        draw_text_centered(&line.text, line.center, line.size, line.color);
    }
}

fn draw_text_centered(text: &str, center: Vec2, size: f32, color: Color) {
    let dims = measure_text(text, None, size as u16, 1.0);
    let x = center.x - dims.width / 2.0;
    // draw_text 的 y 是基线
    let y = center.y - dims.height / 2.0 + dims.offset_y;
    draw_text(text, x, y, size, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_bar_rects() {
        let (background, health) = health_bar_rects(50, 100, 1280.0);
        assert_eq!(background, Rect::new(1060.0, 20.0, 200.0, 20.0));
        assert_eq!(health.w, 100.0);
    }

    #[test]
    fn test_health_bar_clamps() {
        let (_, health) = health_bar_rects(-10, 100, 1280.0);
        assert_eq!(health.w, 0.0);
        let (_, health) = health_bar_rects(150, 100, 1280.0);
        assert_eq!(health.w, 200.0);
    }

    #[test]
    fn test_game_over_and_reset() {
        let mut menu = Menu::new();
        assert_eq!(menu.instructions, START_TEXT);
        menu.set_game_over(120);
        assert!(menu.game_over);
        assert_eq!(menu.final_score, 120);
        assert_eq!(menu.instructions, RESTART_TEXT);
        menu.reset();
        assert!(!menu.game_over);
        assert_eq!(menu.instructions, START_TEXT);
    }

    #[test]
    fn test_layout_without_game_over() {
        let lines = Menu::new().layout(true, 1280.0, 720.0);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec![GAME_TITLE, MENU_TITLE, START_TEXT, CONTROLS_TEXT]);
        // logo 底部 244 + 30
        assert_eq!(lines[0].center.y, 274.0);
        assert_eq!(lines[3].center.y, 670.0);
        assert!(lines.iter().all(|l| l.center.x == 640.0));
    }

    #[test]
    fn test_layout_game_over_shows_score() {
        let mut menu = Menu::new();
        menu.set_game_over(40);
        let lines = menu.layout(false, 1280.0, 720.0);
        assert_eq!(lines[0].center.y, 180.0);
        assert_eq!(lines[2].text, "Game Over");
        assert_eq!(lines[3].text, "Final Score: 40");
        assert_eq!(lines[4].text, RESTART_TEXT);
        // 每一行都在上一行下方
        for pair in lines[..5].windows(2) {
            assert!(pair[1].center.y > pair[0].center.y);
        }
    }
}
