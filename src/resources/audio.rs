//! Bridge between the ECS world and the audio thread.
//!
//! [`setup_audio`] spawns the thread that owns the device and inserts the
//! [`AudioBridge`] plus the message mailboxes; [`shutdown_audio`] stops it
//! cleanly. Gameplay code never touches the bridge directly: it writes
//! [`AudioCmd`] messages and a bridge system forwards them.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::systems::audio::audio_thread;

/// Channel ends and join handle of the audio thread.
#[derive(Resource)]
pub struct AudioBridge {
    pub tx_cmd: Sender<AudioCmd>,
    pub rx_msg: Receiver<AudioMessage>,
    pub handle: std::thread::JoinHandle<()>,
}

/// Spawn the audio thread and register the bridge resources.
pub fn setup_audio(world: &mut World) {
    let (tx_cmd, rx_cmd) = unbounded::<AudioCmd>();
    let (tx_msg, rx_msg) = unbounded::<AudioMessage>();

    let handle = std::thread::spawn(move || audio_thread(rx_cmd, tx_msg));

    world.insert_resource(AudioBridge {
        tx_cmd,
        rx_msg,
        handle,
    });
    world.insert_resource(Messages::<AudioMessage>::default());
    world.insert_resource(Messages::<AudioCmd>::default());
}

/// Request shutdown of the audio thread and join it.
pub fn shutdown_audio(world: &mut World) {
    if let Some(bridge) = world.remove_resource::<AudioBridge>() {
        let _ = bridge.tx_cmd.send(AudioCmd::Shutdown);
        let _ = bridge.handle.join();
    }
}
