//! Engine configuration from `config.ini`.
//!
//! Window size, fullscreen, target fps and audio volumes. The game itself
//! renders at the fixed 320×240 logical resolution; the render target is
//! scaled to the window with letterboxing.
//!
//! ```ini
//! [window]
//! width = 960
//! height = 720
//! fullscreen = false
//! target_fps = 120
//!
//! [audio]
//! music_volume = 0.8
//! sound_volume = 1.0
//! ```

use bevy_ecs::prelude::Resource;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

const DEFAULT_WINDOW_WIDTH: u32 = 960;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_TARGET_FPS: u32 = 120;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// User-facing settings, re-applied at runtime when changed.
#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub fullscreen: bool,
    pub target_fps: u32,
    pub music_volume: f32,
    pub sound_volume: f32,
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            fullscreen: false,
            target_fps: DEFAULT_TARGET_FPS,
            music_volume: 1.0,
            sound_volume: 1.0,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the INI file; missing keys keep their defaults.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("failed to load config file: {e}"))?;

        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(fullscreen) = config.getbool("window", "fullscreen").ok().flatten() {
            self.fullscreen = fullscreen;
        }
        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = fps as u32;
        }
        if let Some(volume) = config.getfloat("audio", "music_volume").ok().flatten() {
            self.music_volume = (volume as f32).clamp(0.0, 1.0);
        }
        if let Some(volume) = config.getfloat("audio", "sound_volume").ok().flatten() {
            self.sound_volume = (volume as f32).clamp(0.0, 1.0);
        }

        info!(
            "config: {}x{} window, fullscreen={}, fps={}",
            self.window_width, self.window_height, self.fullscreen, self.target_fps
        );
        Ok(())
    }

    /// Save to the INI file, creating it when absent.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();
        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "fullscreen", Some(self.fullscreen.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config.set("audio", "music_volume", Some(self.music_volume.to_string()));
        config.set("audio", "sound_volume", Some(self.sound_volume.to_string()));
        config
            .write(&self.config_path)
            .map_err(|e| format!("failed to save config file: {e}"))?;
        Ok(())
    }
}
