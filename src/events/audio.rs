//! Commands and messages for the background audio thread.
//!
//! The engine side only writes [`AudioCmd`] messages; the audio thread owns
//! the device and answers with [`AudioMessage`]. Sounds and musics are
//! addressed by logical id, never by path outside the load commands.

use bevy_ecs::message::Message;

/// Commands sent *to* the audio thread.
#[derive(Message, Debug, Clone)]
pub enum AudioCmd {
    LoadMusic { id: String, path: String },
    LoadSound { id: String, path: String },
    PlayMusic { id: String, looped: bool },
    StopMusic { id: String },
    StopAllMusic,
    PlaySound { id: String },
    MusicVolume { vol: f32 },
    SoundVolume { vol: f32 },
    Shutdown,
}

/// Messages sent *back* from the audio thread.
#[derive(Message, Debug, Clone)]
pub enum AudioMessage {
    MusicLoaded { id: String },
    SoundLoaded { id: String },
    LoadFailed { id: String, error: String },
    MusicStarted { id: String },
    MusicStopped { id: String },
    /// A non-looping music reached its end.
    MusicFinished { id: String },
}
