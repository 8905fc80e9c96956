//! Input polling: raylib events to logical game keys.
//!
//! The only raylib-aware input code. Each tick the pressed-key queue and
//! the release state of the bound codes are drained into low-level
//! [`InputEvent`]s, translated by [`Controls`] (which also implements the
//! customize flow) and published as [`GameKeyMessage`]s for the router.

use bevy_ecs::prelude::*;
use raylib::ffi;

use crate::events::input::GameKeyMessage;
use crate::resources::controls::{Controls, GameKey, InputEvent};
use crate::resources::savegame::Savegame;

/// Advance the [`GameKeyMessage`] queue each tick.
pub fn update_game_key_messages(mut msgs: ResMut<Messages<GameKeyMessage>>) {
    msgs.update();
}

/// Poll raylib and publish the logical key changes.
pub fn update_input_state(
    mut rl: NonSendMut<raylib::RaylibHandle>,
    mut controls: ResMut<Controls>,
    mut savegame: ResMut<Savegame>,
    mut writer: MessageWriter<GameKeyMessage>,
) {
    let mut events: Vec<InputEvent> = Vec::new();

    while let Some(key) = rl.get_key_pressed() {
        events.push(InputEvent::KeyPressed { code: key as i32 });
    }
    for key in GameKey::ALL {
        if let Some(code) = controls.keyboard_code(key) {
            if unsafe { ffi::IsKeyReleased(code) } {
                events.push(InputEvent::KeyReleased { code });
            }
        }
    }

    for event in events {
        if let Some((key, pressed)) = controls.handle_event(&event, &mut savegame) {
            writer.write(GameKeyMessage { key, pressed });
        }
    }
}
