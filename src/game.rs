use ::rand::rngs::StdRng;
use ::rand::seq::SliceRandom;
use ::rand::{Rng, SeedableRng};
use macroquad::math::{Rect, Vec2};

use crate::bullet::Bullet;
use crate::enemy::Enemy;
use crate::error::{GameError, GameResult};
use crate::gun::Gun;
use crate::mask::{collide_mask, Mask};
use crate::player::{MoveKeys, Player};
use crate::settings::Settings;
use crate::sheet::{Frame, Sheets};
use crate::tilemap::{MapObject, Tile, TileMap};
use crate::ui::Menu;

// ==================== 游戏状态 ====================

/// 当前界面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Menu,
    Playing,
}

/// 一帧内发生的事件，由主循环转换成音效和鼠标显示
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    Shot,
    Impact,
    EnemyKilled,
    PlayerHit { health: i32 },
    GameOver { score: u32 },
}

/// 一帧的输入
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub movement: MoveKeys,
    pub mouse: Vec2,
    pub fire: bool,
    pub start: bool,
    pub screen_size: Vec2,
}

// ==================== 主游戏结构 ====================

pub struct Game {
    // 核心状态
    pub state: GameState,
    pub settings: Settings,
    pub sheets: Sheets,
    pub menu: Menu,
    map: TileMap,

    // 关卡
    pub ground: Vec<Tile>,
    pub objects: Vec<MapObject>,
    pub obstacles: Vec<Rect>,
    pub spawn_positions: Vec<Vec2>,

    // 实体
    pub player: Player,
    pub gun: Gun,
    pub bullets: Vec<Bullet>,
    pub enemies: Vec<Enemy>,

    // 时间相关（毫秒）
    elapsed: f64,
    pub clock: u64,
    spawn_timer: u64,

    // 射击
    pub can_shoot: bool,
    pub shoot_time: u64,

    // 玩家数据
    pub player_health: i32,
    pub player_max_health: i32,
    pub last_hit_time: Option<u64>,
    pub score: u32,

    rng: StdRng,
}

// ==================== 游戏初始化 ====================

impl Game {
    pub fn new(settings: Settings, sheets: Sheets, map: TileMap) -> GameResult<Self> {
        Self::with_rng(settings, sheets, map, StdRng::from_entropy())
    }

    pub fn with_rng(settings: Settings, sheets: Sheets, map: TileMap, rng: StdRng) -> GameResult<Self> {
        let start = map
            .player_start
            .ok_or_else(|| GameError::map("no 'Player' object in the Entities layer"))?;
        let player = Player::new(start, sheets.player.clone(), &settings);
        let gun = Gun::new(player.center(), settings.gun_distance);
        let player_max_health = settings.player_max_health;

        let mut game = Self {
            state: GameState::Menu,
            settings,
            sheets,
            menu: Menu::new(),
            map,
            ground: Vec::new(),
            objects: Vec::new(),
            obstacles: Vec::new(),
            spawn_positions: Vec::new(),
            player,
            gun,
            bullets: Vec::new(),
            enemies: Vec::new(),
            elapsed: 0.0,
            clock: 0,
            spawn_timer: 0,
            can_shoot: true,
            shoot_time: 0,
            player_health: player_max_health,
            player_max_health,
            last_hit_time: None,
            score: 0,
            rng,
        };
        game.setup_level();
        Ok(game)
    }

    /// 根据地图重建关卡内容
    fn setup_level(&mut self) {
        self.ground = self.map.ground.clone();
        self.objects = self.map.objects.clone();
        self.obstacles = self.map.obstacle_rects();
        self.spawn_positions = self.map.spawn_positions.clone();
        self.bullets.clear();
        self.enemies.clear();

        // with_rng 已经检查过出生点
        let start = self.map.player_start.unwrap_or(Vec2::ZERO);
        self.player = Player::new(start, self.sheets.player.clone(), &self.settings);
        self.gun = Gun::new(self.player.center(), self.settings.gun_distance);
    }

    pub fn start_game(&mut self) {
        self.state = GameState::Playing;
        self.setup_level();

        self.elapsed = 0.0;
        self.clock = 0;
        self.spawn_timer = 0;
        self.can_shoot = true;
        self.shoot_time = 0;
        self.score = 0;
        self.player_health = self.player_max_health;
        self.last_hit_time = None;
        self.menu.reset();
        log::info!("Game started with {} spawn positions", self.spawn_positions.len());
    }
}

// ==================== 游戏逻辑 ====================

impl Game {
    pub fn update(&mut self, dt: f32, input: &FrameInput) -> Vec<GameEvent> {
        let mut events = Vec::new();
        match self.state {
            GameState::Menu => {
                if input.start {
                    self.start_game();
                    events.push(GameEvent::Started);
                }
            }
            GameState::Playing => self.update_playing(dt, input, &mut events),
        }
        events
    }

    fn update_playing(&mut self, dt: f32, input: &FrameInput, events: &mut Vec<GameEvent>) {
        // 推进时钟
        let previous = self.clock;
        self.elapsed += dt as f64 * 1000.0;
        self.clock = self.elapsed as u64;

        // 射击
        self.handle_gun_cooldown();
        self.process_input(input, events);

        // 更新所有实体
        self.update_entities(dt, input);

        // 生成敌人
        self.tick_spawn_timer(self.clock - previous);

        // 碰撞检测
        self.handle_bullet_collision(events);
        self.handle_player_collision(events);
    }

    fn tick_spawn_timer(&mut self, delta: u64) {
        let interval = self.settings.enemy_spawn_interval_ms.max(1);
        self.spawn_timer += delta;
        while self.spawn_timer >= interval {
            self.spawn_timer -= interval;
            self.spawn_enemy();
        }
    }

    fn spawn_enemy(&mut self) {
        if self.sheets.enemies.is_empty() {
            return;
        }
        let Some(position) = self.spawn_positions.choose(&mut self.rng).copied() else {
            return;
        };
        let kind = self.rng.gen_range(0..self.sheets.enemies.len());
        log::debug!("Spawning {} at {:?}", self.sheets.enemies[kind].name, position);
        self.enemies
            .push(Enemy::new(kind, &self.sheets.enemies[kind], position, &self.settings));
    }

    fn handle_gun_cooldown(&mut self) {
        if !self.can_shoot && self.clock.saturating_sub(self.shoot_time) >= self.settings.gun_cooldown_ms {
            self.can_shoot = true;
        }
    }

    fn process_input(&mut self, input: &FrameInput, events: &mut Vec<GameEvent>) {
        if !(input.fire && self.can_shoot) {
            return;
        }
        events.push(GameEvent::Shot);
        self.bullets.push(Bullet::new(
            &self.sheets.bullet,
            self.gun.center,
            self.gun.direction,
            self.settings.bullet_speed,
            self.clock,
            self.settings.bullet_lifetime_ms,
        ));
        self.can_shoot = false;
        self.shoot_time = self.clock;
    }

    fn update_entities(&mut self, dt: f32, input: &FrameInput) {
        let now = self.clock;

        self.player.update(dt, input.movement.direction(), &self.obstacles);
        let player_center = self.player.center();
        self.gun.update(player_center, input.mouse, input.screen_size / 2.0);

        for bullet in &mut self.bullets {
            bullet.update(dt);
        }
        self.bullets.retain(|bullet| !bullet.is_expired(now));

        for enemy in &mut self.enemies {
            enemy.update(dt, player_center, &self.obstacles);
        }
        self.enemies.retain(|enemy| !enemy.is_finished(now));
    }

    fn handle_bullet_collision(&mut self, events: &mut Vec<GameEvent>) {
        let mut bullets_to_remove = Vec::new();

        for (bullet_idx, bullet) in self.bullets.iter().enumerate() {
            let hit_enemies: Vec<usize> = self
                .enemies
                .iter()
                .enumerate()
                .filter(|(_, enemy)| enemy_collides(&self.sheets, enemy, &bullet.rect, &bullet.mask))
                .map(|(idx, _)| idx)
                .collect();
            if hit_enemies.is_empty() {
                continue;
            }

            events.push(GameEvent::Impact);
            for enemy_idx in hit_enemies {
                let enemy = &mut self.enemies[enemy_idx];
                // 正在闪白的敌人仍会挡住子弹，但不再计分
                if enemy.is_alive() {
                    enemy.destroy(self.clock);
                    self.score += self.settings.score_per_kill;
                    events.push(GameEvent::EnemyKilled);
                }
            }
            bullets_to_remove.push(bullet_idx);
        }

        for idx in bullets_to_remove.into_iter().rev() {
            self.bullets.remove(idx);
        }
    }

    fn handle_player_collision(&mut self, events: &mut Vec<GameEvent>) {
        let now = self.clock;
        let ready = match self.last_hit_time {
            Some(time) => now.saturating_sub(time) > self.settings.player_hit_cooldown_ms,
            None => true,
        };
        if !ready {
            return;
        }

        let player_rect = self.player.image_rect();
        let player_mask = &self.player.frame().mask;
        let touched = self
            .enemies
            .iter()
            .filter(|enemy| enemy.is_alive())
            .any(|enemy| enemy_collides(&self.sheets, enemy, &player_rect, player_mask));
        if !touched {
            return;
        }

        self.player_health -= self.settings.damage_per_hit;
        self.last_hit_time = Some(now);
        events.push(GameEvent::PlayerHit {
            health: self.player_health,
        });

        if self.player_health <= 0 {
            self.end_game(events);
        }
    }

    fn end_game(&mut self, events: &mut Vec<GameEvent>) {
        log::info!("Game over, final score {}", self.score);
        self.menu.set_game_over(self.score);
        self.state = GameState::Menu;
        events.push(GameEvent::GameOver { score: self.score });
    }
}

/// 敌人当前显示的帧
pub fn enemy_frame<'a>(sheets: &'a Sheets, enemy: &Enemy) -> Option<&'a Frame> {
    sheets.enemies.get(enemy.kind)?.frames.get(enemy.frame())
}

fn enemy_collides(sheets: &Sheets, enemy: &Enemy, rect: &Rect, mask: &Mask) -> bool {
    match enemy_frame(sheets, enemy) {
        Some(frame) => collide_mask(rect, mask, &enemy.image_rect(frame), &frame.mask),
        None => false,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sheet::{EnemyKind, PlayerFrames};
    use macroquad::math::vec2;

    pub(crate) fn sample_sheets() -> Sheets {
        Sheets {
            player: PlayerFrames {
                base: Frame::solid(200, 100),
                idle: Vec::new(),
                left: vec![Frame::solid(100, 100)],
                right: vec![Frame::solid(100, 100)],
            },
            enemies: vec![EnemyKind {
                name: "bat".to_owned(),
                frames: vec![Frame::solid(60, 80), Frame::solid(60, 80)],
            }],
            bullet: Frame::solid(10, 4),
            gun: Frame::solid(48, 16),
        }
    }

    pub(crate) fn sample_map() -> TileMap {
        TileMap {
            tile_size: vec2(64.0, 64.0),
            collisions: vec![Rect::new(0.0, 0.0, 3200.0, 10.0)],
            player_start: Some(vec2(500.0, 500.0)),
            spawn_positions: vec![vec2(2000.0, 2000.0), vec2(2500.0, 2000.0)],
            ..Default::default()
        }
    }

    pub(crate) fn sample_game() -> Game {
        let mut game = Game::with_rng(
            Settings::default(),
            sample_sheets(),
            sample_map(),
            StdRng::seed_from_u64(7),
        )
        .unwrap();
        game.update(0.0, &start_input());
        game
    }

    fn start_input() -> FrameInput {
        FrameInput {
            start: true,
            ..idle_input()
        }
    }

    fn idle_input() -> FrameInput {
        FrameInput {
            mouse: vec2(640.0, 360.0),
            screen_size: vec2(1280.0, 720.0),
            ..Default::default()
        }
    }

    fn fire_input() -> FrameInput {
        FrameInput {
            fire: true,
            ..idle_input()
        }
    }

    fn enemy_at(game: &Game, center: Vec2) -> Enemy {
        Enemy::new(0, &game.sheets.enemies[0], center, &game.settings)
    }

    #[test]
    fn test_map_without_player_is_error() {
        let map = TileMap {
            player_start: None,
            ..sample_map()
        };
        let result = Game::new(Settings::default(), sample_sheets(), map);
        assert!(matches!(result, Err(GameError::Map { .. })));
    }

    #[test]
    fn test_menu_waits_for_start() {
        let mut game = Game::with_rng(
            Settings::default(),
            sample_sheets(),
            sample_map(),
            StdRng::seed_from_u64(1),
        )
        .unwrap();
        assert_eq!(game.state, GameState::Menu);
        assert!(game.update(0.5, &idle_input()).is_empty());
        assert_eq!(game.state, GameState::Menu);

        let events = game.update(0.016, &start_input());
        assert_eq!(events, vec![GameEvent::Started]);
        assert_eq!(game.state, GameState::Playing);
        assert_eq!(game.player_health, 100);
        assert_eq!(game.score, 0);
        assert_eq!(game.obstacles.len(), 1);
    }

    #[test]
    fn test_gun_cooldown() {
        let mut game = sample_game();
        let events = game.update(0.016, &fire_input());
        assert!(events.contains(&GameEvent::Shot));
        assert_eq!(game.bullets.len(), 1);

        // 100ms 后仍在冷却
        let events = game.update(0.1, &fire_input());
        assert!(!events.contains(&GameEvent::Shot));
        assert_eq!(game.bullets.len(), 1);

        // 200ms 后可以再次射击
        let events = game.update(0.1, &fire_input());
        assert!(events.contains(&GameEvent::Shot));
        assert_eq!(game.bullets.len(), 2);
    }

    #[test]
    fn test_bullet_starts_at_gun_and_expires() {
        let mut game = sample_game();
        let gun_center = game.gun.center;
        game.update(0.016, &fire_input());
        let bullet = &game.bullets[0];
        assert_eq!(bullet.direction, vec2(0.0, 1.0));
        assert!((bullet.center() - (gun_center + vec2(0.0, 16.0))).length() < 0.01);

        for _ in 0..9 {
            game.update(0.1, &idle_input());
        }
        assert_eq!(game.bullets.len(), 1);
        game.update(0.1, &idle_input());
        assert!(game.bullets.is_empty());
    }

    #[test]
    fn test_enemies_spawn_on_timer() {
        let mut game = sample_game();
        game.update(0.29, &idle_input());
        assert!(game.enemies.is_empty());
        game.update(0.02, &idle_input());
        assert_eq!(game.enemies.len(), 1);
        game.update(0.6, &idle_input());
        assert_eq!(game.enemies.len(), 3);
        assert!(game.enemies.iter().all(|e| e.kind == 0));
    }

    #[test]
    fn test_no_spawn_positions_means_no_enemies() {
        let mut game = sample_game();
        game.spawn_positions.clear();
        game.update(1.0, &idle_input());
        assert!(game.enemies.is_empty());
    }

    #[test]
    fn test_bullet_kills_enemy() {
        let mut game = sample_game();
        let target = game.gun.center + vec2(0.0, 20.0);
        let enemy = enemy_at(&game, target);
        game.enemies.push(enemy);

        let events = game.update(0.016, &fire_input());
        assert!(events.contains(&GameEvent::Impact));
        assert!(events.contains(&GameEvent::EnemyKilled));
        assert!(game.bullets.is_empty());
        assert_eq!(game.score, 10);
        assert!(!game.enemies[0].is_alive());
    }

    #[test]
    fn test_dying_enemy_blocks_bullet_without_score() {
        let mut game = sample_game();
        let target = game.gun.center + vec2(0.0, 20.0);
        let mut enemy = enemy_at(&game, target);
        enemy.destroy(0);
        game.enemies.push(enemy);

        let events = game.update(0.016, &fire_input());
        assert!(events.contains(&GameEvent::Impact));
        assert!(!events.contains(&GameEvent::EnemyKilled));
        assert!(game.bullets.is_empty());
        assert_eq!(game.score, 0);
    }

    #[test]
    fn test_dead_enemy_removed_after_flash() {
        let mut game = sample_game();
        game.spawn_positions.clear();
        let target = game.gun.center + vec2(0.0, 20.0);
        let enemy = enemy_at(&game, target);
        game.enemies.push(enemy);
        game.update(0.016, &fire_input());
        assert_eq!(game.enemies.len(), 1);

        game.update(0.3, &idle_input());
        assert_eq!(game.enemies.len(), 1);
        game.update(0.11, &idle_input());
        assert!(game.enemies.is_empty());
    }

    #[test]
    fn test_player_damage_cooldown() {
        let mut game = sample_game();
        let center = game.player.center();
        let enemy = enemy_at(&game, center);
        game.enemies.push(enemy);

        let events = game.update(0.016, &idle_input());
        assert!(events.contains(&GameEvent::PlayerHit { health: 90 }));
        assert_eq!(game.player_health, 90);

        game.update(0.5, &idle_input());
        assert_eq!(game.player_health, 90);

        game.update(0.6, &idle_input());
        assert_eq!(game.player_health, 80);
    }

    #[test]
    fn test_dying_enemy_does_not_hurt() {
        let mut game = sample_game();
        let center = game.player.center();
        let mut enemy = enemy_at(&game, center);
        enemy.destroy(0);
        game.enemies.push(enemy);
        game.update(0.016, &idle_input());
        assert_eq!(game.player_health, 100);
    }

    #[test]
    fn test_game_over_and_restart() {
        let mut game = sample_game();
        game.score = 30;
        game.player_health = 10;
        let center = game.player.center();
        let enemy = enemy_at(&game, center);
        game.enemies.push(enemy);

        let events = game.update(0.016, &idle_input());
        assert!(events.contains(&GameEvent::GameOver { score: 30 }));
        assert_eq!(game.state, GameState::Menu);
        assert!(game.menu.game_over);
        assert_eq!(game.menu.final_score, 30);

        let events = game.update(0.016, &start_input());
        assert_eq!(events, vec![GameEvent::Started]);
        assert_eq!(game.player_health, 100);
        assert_eq!(game.score, 0);
        assert!(game.enemies.is_empty());
        assert!(game.last_hit_time.is_none());
        assert!(!game.menu.game_over);
    }

    #[test]
    fn test_player_moves_with_keys() {
        let mut game = sample_game();
        let input = FrameInput {
            movement: MoveKeys {
                right: true,
                ..Default::default()
            },
            ..idle_input()
        };
        game.update(0.1, &input);
        assert_eq!(game.player.center(), vec2(550.0, 500.0));
        // 枪跟着玩家
        assert_eq!(game.gun.center, vec2(550.0, 640.0));
    }

    #[test]
    fn test_one_bullet_scores_every_enemy_it_hits() {
        let mut game = sample_game();
        let target = game.gun.center + vec2(0.0, 20.0);
        for _ in 0..3 {
            let enemy = enemy_at(&game, target);
            game.enemies.push(enemy);
        }

        let events = game.update(0.016, &fire_input());
        let impacts = events.iter().filter(|e| **e == GameEvent::Impact).count();
        let kills = events.iter().filter(|e| **e == GameEvent::EnemyKilled).count();
        assert_eq!(impacts, 1);
        assert_eq!(kills, 3);
        assert_eq!(game.score, 30);
        assert!(game.bullets.is_empty());
        assert!(game.enemies.iter().all(|e| !e.is_alive()));
    }

    #[test]
    fn test_no_enemy_kinds_means_no_enemies() {
        let mut game = sample_game();
        game.sheets.enemies.clear();
        game.update(1.0, &idle_input());
        assert!(game.enemies.is_empty());
        assert!(!game.spawn_positions.is_empty());
    }

    #[test]
    fn test_player_frame_hits_from_top_left() {
        let moving_right = FrameInput {
            movement: MoveKeys {
                right: true,
                ..Default::default()
            },
            ..idle_input()
        };

        // 100x100 的向右帧只覆盖 200x100 矩形的左半边
        let mut game = sample_game();
        game.spawn_positions.clear();
        let enemy = enemy_at(&game, vec2(555.0, 500.0));
        game.enemies.push(enemy);
        let events = game.update(0.02, &moving_right);
        assert_eq!(game.player.image_rect().w, 100.0);
        assert!(colliderect_any(&game));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::PlayerHit { .. })));

        let mut game = sample_game();
        game.spawn_positions.clear();
        let enemy = enemy_at(&game, vec2(470.0, 500.0));
        game.enemies.push(enemy);
        let events = game.update(0.02, &moving_right);
        assert!(events.contains(&GameEvent::PlayerHit { health: 90 }));
    }

    /// 敌人与玩家的矩形仍然相交
    fn colliderect_any(game: &Game) -> bool {
        game.enemies
            .iter()
            .any(|e| crate::geometry::colliderect(&e.rect, &game.player.rect))
    }
}
