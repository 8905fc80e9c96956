//! Low-level input to logical game keys.
//!
//! [`Controls`] owns the remappable mapping from keyboard codes and joypad
//! event strings to the nine logical [`GameKey`]s, tracks which logical keys
//! are held, and implements the customize flow where the next low-level
//! event replaces a binding and is swallowed. Bindings are persisted in the
//! savegame so they survive restarts.

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;

use crate::resources::savegame::{Savegame, ints, strings};

/// Logical game keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKey {
    Action,
    Sword,
    Item1,
    Item2,
    Pause,
    Right,
    Up,
    Left,
    Down,
}

impl GameKey {
    pub const ALL: [GameKey; 9] = [
        GameKey::Action,
        GameKey::Sword,
        GameKey::Item1,
        GameKey::Item2,
        GameKey::Pause,
        GameKey::Right,
        GameKey::Up,
        GameKey::Left,
        GameKey::Down,
    ];

    pub fn index(self) -> usize {
        match self {
            GameKey::Action => 0,
            GameKey::Sword => 1,
            GameKey::Item1 => 2,
            GameKey::Item2 => 3,
            GameKey::Pause => 4,
            GameKey::Right => 5,
            GameKey::Up => 6,
            GameKey::Left => 7,
            GameKey::Down => 8,
        }
    }
}

/// A low-level input event, already stripped of backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    KeyPressed { code: i32 },
    KeyReleased { code: i32 },
    JoypadPressed { event: String },
    JoypadReleased { event: String },
}

/// Maps each combination of pressed arrows (right=1, up=2, left=4, down=8)
/// to an 8-direction, or -1 when the combination cancels out.
const DIRECTION_MASKS: [i32; 16] = [
    -1, // none: stop
    0,  // right
    2,  // up
    1,  // right + up
    4,  // left
    -1, // left + right: stop
    3,  // left + up
    -1, // left + right + up: stop
    6,  // down
    7,  // down + right
    -1, // down + up: stop
    -1, // down + right + up: stop
    5,  // down + left
    -1, // down + left + right: stop
    -1, // down + left + up: stop
    -1, // all four: stop
];

/// Default keyboard codes, raylib key values: space, C, X, V, D, arrows.
const DEFAULT_KEYBOARD: [i32; 9] = [32, 67, 88, 86, 68, 262, 265, 263, 264];

/// The input mapping layer.
#[derive(Resource, Debug, Clone)]
pub struct Controls {
    keyboard_map: FxHashMap<i32, GameKey>,
    joypad_map: FxHashMap<String, GameKey>,
    pressed: [bool; 9],
    /// Key being rebound; the next low-level event is captured.
    customizing: Option<GameKey>,
}

impl Default for Controls {
    fn default() -> Self {
        let mut keyboard_map = FxHashMap::default();
        for (key, code) in GameKey::ALL.iter().zip(DEFAULT_KEYBOARD) {
            keyboard_map.insert(code, *key);
        }
        Controls {
            keyboard_map,
            joypad_map: FxHashMap::default(),
            pressed: [false; 9],
            customizing: None,
        }
    }
}

impl Controls {
    /// Restore bindings from the savegame, writing the defaults back when
    /// the savegame has none yet.
    pub fn load(savegame: &mut Savegame) -> Self {
        let mut controls = Controls::default();
        if savegame.get_reserved_integer(ints::KEYBOARD_ACTION) == 0 {
            controls.store(savegame);
            return controls;
        }
        controls.keyboard_map.clear();
        for key in GameKey::ALL {
            let code = savegame.get_reserved_integer(ints::KEYBOARD_ACTION + key.index()) as i32;
            controls.keyboard_map.insert(code, key);
            let joypad = savegame
                .get_reserved_string(strings::JOYPAD_ACTION + key.index())
                .to_string();
            if !joypad.is_empty() {
                controls.joypad_map.insert(joypad, key);
            }
        }
        controls
    }

    /// Persist the current bindings.
    pub fn store(&self, savegame: &mut Savegame) {
        for (code, key) in &self.keyboard_map {
            savegame.set_reserved_integer(ints::KEYBOARD_ACTION + key.index(), *code as u32);
        }
        for (event, key) in &self.joypad_map {
            savegame.set_reserved_string(strings::JOYPAD_ACTION + key.index(), event);
        }
    }

    pub fn keyboard_code(&self, key: GameKey) -> Option<i32> {
        self.keyboard_map
            .iter()
            .find(|(_, k)| **k == key)
            .map(|(code, _)| *code)
    }

    pub fn is_key_pressed(&self, key: GameKey) -> bool {
        self.pressed[key.index()]
    }

    pub fn is_customizing(&self) -> bool {
        self.customizing.is_some()
    }

    /// Enter customize mode: the next low-level event rebinds `key`.
    pub fn customize(&mut self, key: GameKey) {
        self.customizing = Some(key);
    }

    /// Translate one low-level event into at most one logical key change.
    /// Returns `(key, pressed)` or `None` when the event is unmapped or was
    /// swallowed by the customize flow.
    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        savegame: &mut Savegame,
    ) -> Option<(GameKey, bool)> {
        if let Some(target) = self.customizing {
            match event {
                InputEvent::KeyPressed { code } => {
                    self.rebind_keyboard(target, *code);
                    self.store(savegame);
                    self.customizing = None;
                    return None;
                }
                InputEvent::JoypadPressed { event } => {
                    self.rebind_joypad(target, event.clone());
                    self.store(savegame);
                    self.customizing = None;
                    return None;
                }
                _ => return None,
            }
        }

        let (key, pressed) = match event {
            InputEvent::KeyPressed { code } => (self.keyboard_map.get(code).copied()?, true),
            InputEvent::KeyReleased { code } => (self.keyboard_map.get(code).copied()?, false),
            InputEvent::JoypadPressed { event } => (self.joypad_map.get(event).copied()?, true),
            InputEvent::JoypadReleased { event } => (self.joypad_map.get(event).copied()?, false),
        };
        self.pressed[key.index()] = pressed;
        Some((key, pressed))
    }

    /// Bind `code` to `key`. When `code` was already bound elsewhere, the
    /// two bindings are swapped so every key keeps exactly one code.
    fn rebind_keyboard(&mut self, key: GameKey, code: i32) {
        let old_code = self.keyboard_code(key);
        if let Some(displaced) = self.keyboard_map.insert(code, key) {
            if displaced != key {
                if let Some(old_code) = old_code {
                    self.keyboard_map.insert(old_code, displaced);
                }
            }
        } else if let Some(old_code) = old_code {
            self.keyboard_map.remove(&old_code);
        }
    }

    fn rebind_joypad(&mut self, key: GameKey, event: String) {
        let old_event = self
            .joypad_map
            .iter()
            .find(|(_, k)| **k == key)
            .map(|(e, _)| e.clone());
        if let Some(displaced) = self.joypad_map.insert(event, key) {
            if displaced != key {
                if let Some(old_event) = old_event {
                    self.joypad_map.insert(old_event, displaced);
                }
            }
        } else if let Some(old_event) = old_event {
            self.joypad_map.remove(&old_event);
        }
    }

    /// 8-direction wanted by the four directional keys, or -1 when the
    /// combination cancels (opposing keys alone stop the movement).
    pub fn get_wanted_direction8(&self) -> i32 {
        let mut mask = 0usize;
        if self.is_key_pressed(GameKey::Right) {
            mask |= 0x1;
        }
        if self.is_key_pressed(GameKey::Up) {
            mask |= 0x2;
        }
        if self.is_key_pressed(GameKey::Left) {
            mask |= 0x4;
        }
        if self.is_key_pressed(GameKey::Down) {
            mask |= 0x8;
        }
        DIRECTION_MASKS[mask]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(controls: &mut Controls, savegame: &mut Savegame, key: GameKey) {
        let code = controls.keyboard_code(key).unwrap();
        controls.handle_event(&InputEvent::KeyPressed { code }, savegame);
    }

    #[test]
    fn opposing_arrows_cancel() {
        let mut savegame = Savegame::in_memory();
        let mut controls = Controls::default();
        press(&mut controls, &mut savegame, GameKey::Left);
        assert_eq!(controls.get_wanted_direction8(), 4);
        press(&mut controls, &mut savegame, GameKey::Right);
        assert_eq!(controls.get_wanted_direction8(), -1);
        press(&mut controls, &mut savegame, GameKey::Up);
        assert_eq!(controls.get_wanted_direction8(), -1);
    }

    #[test]
    fn diagonals_resolve() {
        let mut savegame = Savegame::in_memory();
        let mut controls = Controls::default();
        press(&mut controls, &mut savegame, GameKey::Down);
        press(&mut controls, &mut savegame, GameKey::Right);
        assert_eq!(controls.get_wanted_direction8(), 7);
    }

    #[test]
    fn customize_swallows_and_swaps() {
        let mut savegame = Savegame::in_memory();
        let mut controls = Controls::default();
        let sword_code = controls.keyboard_code(GameKey::Sword).unwrap();
        let action_code = controls.keyboard_code(GameKey::Action).unwrap();

        controls.customize(GameKey::Action);
        let routed = controls.handle_event(&InputEvent::KeyPressed { code: sword_code }, &mut savegame);
        assert!(routed.is_none());
        assert!(!controls.is_customizing());
        assert_eq!(controls.keyboard_code(GameKey::Action), Some(sword_code));
        assert_eq!(controls.keyboard_code(GameKey::Sword), Some(action_code));
    }

    #[test]
    fn bindings_persist_through_savegame() {
        let mut savegame = Savegame::in_memory();
        let mut controls = Controls::load(&mut savegame);
        controls.customize(GameKey::Pause);
        controls.handle_event(&InputEvent::KeyPressed { code: 80 }, &mut savegame);

        let reloaded = Controls::load(&mut savegame);
        assert_eq!(reloaded.keyboard_code(GameKey::Pause), Some(80));
    }
}
