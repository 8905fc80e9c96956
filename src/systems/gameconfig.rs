//! Applies configuration changes to the window and the audio thread.

use bevy_ecs::prelude::*;

use crate::events::audio::AudioCmd;
use crate::resources::gameconfig::GameConfig;

/// React to [`GameConfig`] changes: push the volumes to the audio thread
/// and resize the window when needed.
pub fn apply_gameconfig_changes(
    config: Res<GameConfig>,
    mut rl: NonSendMut<raylib::RaylibHandle>,
    mut audio_cmds: MessageWriter<AudioCmd>,
) {
    if !config.is_changed() {
        return;
    }
    audio_cmds.write(AudioCmd::MusicVolume {
        vol: config.music_volume,
    });
    audio_cmds.write(AudioCmd::SoundVolume {
        vol: config.sound_volume,
    });

    let (w, h) = (config.window_width as i32, config.window_height as i32);
    if rl.get_screen_width() != w || rl.get_screen_height() != h {
        rl.set_window_size(w, h);
    }
    if config.fullscreen != rl.is_window_fullscreen() {
        rl.toggle_fullscreen();
    }
    rl.set_target_fps(config.target_fps);
}
