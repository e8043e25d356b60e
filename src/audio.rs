use std::path::Path;

use macroquad::audio::{load_sound, play_sound, PlaySoundParams, Sound};

use crate::game::GameEvent;
use crate::settings::Settings;

/// 游戏音效；加载失败的声音保持静音
pub struct Sounds {
    shoot: Option<Sound>,
    impact: Option<Sound>,
    music: Option<Sound>,
    shoot_volume: f32,
    impact_volume: f32,
    music_volume: f32,
}

async fn load_optional(path: &Path) -> Option<Sound> {
    match load_sound(&path.to_string_lossy()).await {
        Ok(sound) => Some(sound),
        Err(e) => {
            log::warn!("Could not load sound {}: {}", path.display(), e);
            None
        }
    }
}

impl Sounds {
    pub async fn load(settings: &Settings) -> Self {
        let dir = settings.audio_dir();
        Self {
            shoot: load_optional(&dir.join("shoot.wav")).await,
            impact: load_optional(&dir.join("impact.ogg")).await,
            music: load_optional(&dir.join("1.ogg")).await,
            shoot_volume: settings.shoot_volume,
            impact_volume: settings.impact_volume,
            music_volume: settings.music_volume,
        }
    }

    /// 循环播放背景音乐
    pub fn start_music(&self) {
        if let Some(music) = &self.music {
            play_sound(
                music,
                PlaySoundParams {
                    looped: true,
                    volume: self.music_volume,
                },
            );
        }
    }

    fn play_once(sound: Option<&Sound>, volume: f32) {
        if let Some(sound) = sound {
            play_sound(sound, PlaySoundParams { looped: false, volume });
        }
    }

    /// 根据本帧事件播放音效
    pub fn play(&self, event: &GameEvent) {
        match event {
            GameEvent::Shot => Self::play_once(self.shoot.as_ref(), self.shoot_volume),
            GameEvent::Impact => Self::play_once(self.impact.as_ref(), self.impact_volume),
            _ => {}
        }
    }
}
