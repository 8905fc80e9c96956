//! The audio collaborator: a dedicated thread owning the Raylib device.
//!
//! The engine treats the audio device as a black box reached through
//! [`AudioCmd`] messages. This module hosts the background thread and the
//! bridge systems:
//! - [`audio_thread`] owns the device, loads musics/sounds and plays them.
//! - [`forward_audio_cmds`] pushes ECS [`AudioCmd`] messages to the thread.
//! - [`poll_audio_messages`] drains thread responses back into ECS messages.
//!
//! Keeping every Raylib audio call on one thread sidesteps the API's thread
//! affinity; the game thread never blocks on audio.

use bevy_ecs::prelude::{MessageReader, MessageWriter, Messages, Res, ResMut};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info};
use raylib::core::audio::{Music, RaylibAudio};
use raylib::ffi;
use rustc_hash::{FxHashMap, FxHashSet};
use std::ffi::CString;

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::resources::audio::AudioBridge;

/// Drain pending audio thread responses into the ECS mailbox.
pub fn poll_audio_messages(bridge: Res<AudioBridge>, mut writer: MessageWriter<AudioMessage>) {
    writer.write_batch(bridge.rx_msg.try_iter());
}

/// Advance the [`AudioMessage`] queue so this frame's writes are readable.
pub fn update_bevy_audio_messages(mut msgs: ResMut<Messages<AudioMessage>>) {
    msgs.update();
}

/// Forward ECS [`AudioCmd`] messages to the audio thread.
pub fn forward_audio_cmds(bridge: Res<AudioBridge>, mut reader: MessageReader<AudioCmd>) {
    for cmd in reader.read() {
        // ignore send errors during shutdown
        let _ = bridge.tx_cmd.send(cmd.clone());
    }
}

/// Advance the [`AudioCmd`] queue so this frame's writes are readable.
pub fn update_bevy_audio_cmds(mut msgs: ResMut<Messages<AudioCmd>>) {
    msgs.update();
}

/// Entry point of the dedicated audio thread.
///
/// Owns every `Music` and `Sound` handle, reacts to [`AudioCmd`], pumps the
/// music streams and reports state changes. Blocks until
/// [`AudioCmd::Shutdown`].
pub fn audio_thread(rx_cmd: Receiver<AudioCmd>, tx_msg: Sender<AudioMessage>) {
    let audio = match RaylibAudio::init_audio_device() {
        Ok(device) => device,
        Err(e) => panic!("failed to initialize audio device: {e}"),
    };

    info!(target: "audio", "thread starting (id={:?})", std::thread::current().id());

    let mut musics: FxHashMap<String, Music> = FxHashMap::default();
    let mut playing: FxHashSet<String> = FxHashSet::default();
    let mut looped: FxHashSet<String> = FxHashSet::default();
    let mut sounds: FxHashMap<String, ffi::Sound> = FxHashMap::default();
    let mut active_aliases: Vec<ffi::Sound> = Vec::new();
    let mut music_volume = 1.0f32;
    let mut sound_volume = 1.0f32;

    'run: loop {
        for cmd in rx_cmd.try_iter() {
            match cmd {
                AudioCmd::LoadMusic { id, path } => match audio.new_music(&path) {
                    Ok(music) => {
                        info!(target: "audio", "music loaded id='{id}' path='{path}'");
                        musics.insert(id.clone(), music);
                        let _ = tx_msg.send(AudioMessage::MusicLoaded { id });
                    }
                    Err(e) => {
                        error!(target: "audio", "music load failed id='{id}': {e}");
                        let _ = tx_msg.send(AudioMessage::LoadFailed {
                            id,
                            error: e.to_string(),
                        });
                    }
                },
                AudioCmd::LoadSound { id, path } => {
                    let c_path = match CString::new(path.clone()) {
                        Ok(s) => s,
                        Err(e) => {
                            let _ = tx_msg.send(AudioMessage::LoadFailed {
                                id,
                                error: format!("invalid path: {e}"),
                            });
                            continue;
                        }
                    };
                    let sound = unsafe { ffi::LoadSound(c_path.as_ptr()) };
                    if sound.stream.buffer.is_null() {
                        error!(target: "audio", "sound load failed id='{id}' path='{path}'");
                        let _ = tx_msg.send(AudioMessage::LoadFailed {
                            id,
                            error: "failed to load".to_string(),
                        });
                    } else {
                        sounds.insert(id.clone(), sound);
                        let _ = tx_msg.send(AudioMessage::SoundLoaded { id });
                    }
                }
                AudioCmd::PlayMusic {
                    id,
                    looped: want_loop,
                } => {
                    if let Some(music) = musics.get(&id) {
                        debug!(target: "audio", "music start id='{id}' looped={want_loop}");
                        music.seek_stream(0.0);
                        music.set_volume(music_volume);
                        music.play_stream();
                        playing.insert(id.clone());
                        if want_loop {
                            looped.insert(id.clone());
                        } else {
                            looped.remove(&id);
                        }
                        let _ = tx_msg.send(AudioMessage::MusicStarted { id });
                    }
                }
                AudioCmd::StopMusic { id } => {
                    if let Some(music) = musics.get(&id) {
                        music.stop_stream();
                        playing.remove(&id);
                        looped.remove(&id);
                        let _ = tx_msg.send(AudioMessage::MusicStopped { id });
                    }
                }
                AudioCmd::StopAllMusic => {
                    for id in playing.drain() {
                        if let Some(music) = musics.get(&id) {
                            music.stop_stream();
                            let _ = tx_msg.send(AudioMessage::MusicStopped { id: id.clone() });
                        }
                    }
                    looped.clear();
                }
                AudioCmd::PlaySound { id } => {
                    if let Some(sound) = sounds.get(&id) {
                        let alias = unsafe { ffi::LoadSoundAlias(*sound) };
                        unsafe {
                            ffi::SetSoundVolume(alias, sound_volume);
                            ffi::PlaySound(alias);
                        }
                        active_aliases.push(alias);
                    } else {
                        error!(target: "audio", "sound '{id}' not loaded");
                    }
                }
                AudioCmd::MusicVolume { vol } => {
                    music_volume = vol.clamp(0.0, 1.0);
                    for music in musics.values() {
                        music.set_volume(music_volume);
                    }
                }
                AudioCmd::SoundVolume { vol } => {
                    sound_volume = vol.clamp(0.0, 1.0);
                }
                AudioCmd::Shutdown => {
                    info!(target: "audio", "shutdown requested");
                    musics.clear();
                    playing.clear();
                    looped.clear();
                    for alias in active_aliases.drain(..) {
                        unsafe { ffi::UnloadSoundAlias(alias) };
                    }
                    for (_, sound) in sounds.drain() {
                        unsafe { ffi::UnloadSound(sound) };
                    }
                    break 'run;
                }
            }
        }

        // pump music streams; a finished non-looping track reports once
        let mut ended: Vec<String> = Vec::new();
        for id in playing.iter() {
            if let Some(music) = musics.get(id) {
                music.update_stream();
                let len = music.get_time_length();
                if music.get_time_played() >= len - 0.01 {
                    ended.push(id.clone());
                }
            }
        }
        for id in ended {
            if looped.contains(&id) {
                if let Some(music) = musics.get(&id) {
                    music.stop_stream();
                    music.play_stream();
                }
            } else {
                if let Some(music) = musics.get(&id) {
                    music.stop_stream();
                }
                playing.remove(&id);
                let _ = tx_msg.send(AudioMessage::MusicFinished { id });
            }
        }

        active_aliases.retain(|alias| {
            let still_playing = unsafe { ffi::IsSoundPlaying(*alias) };
            if !still_playing {
                unsafe { ffi::UnloadSoundAlias(*alias) };
            }
            still_playing
        });
        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    info!(target: "audio", "thread exiting");
}
