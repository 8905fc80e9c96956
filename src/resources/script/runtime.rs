//! The per-map Lua runtime.
//!
//! One Lua state runs the current map's script. The global `sol` table
//! exposes the operation surface; every function only queues a
//! [`ScriptCmd`], drained by `systems::script` at defined points. Reads go
//! through a [`GameSnapshot`] refreshed before each call into Lua, so the
//! script observes the engine state of that synchronous point.
//!
//! Engine events are plain global functions (`event_map_started`, ...); a
//! missing handler is not an error, a failing one is logged and aborts only
//! the script work of the current tick.

use std::cell::RefCell;
use std::sync::Arc;

use log::error;
use mlua::prelude::*;

use super::commands::ScriptCmd;
use super::timers::ScriptTimer;
use crate::resources::savegame::Savegame;

/// Read-only engine state visible to scripts.
#[derive(Debug, Clone, Default)]
pub struct GameSnapshot {
    pub custom_integers: Vec<u32>,
    /// Packed custom booleans, 32 per word.
    pub custom_boolean_words: Vec<u32>,
    pub hero_x: i32,
    pub hero_y: i32,
    pub hero_layer: u8,
    pub hero_direction: i32,
}

impl GameSnapshot {
    pub fn from_savegame(savegame: &Savegame) -> Self {
        let mut snapshot = GameSnapshot::default();
        snapshot.custom_integers = (0..1024).map(|i| savegame.get_integer(i)).collect();
        snapshot.custom_boolean_words = (0..1024)
            .map(|w| {
                let mut word = 0u32;
                for bit in 0..32 {
                    if savegame.get_boolean(w * 32 + bit) {
                        word |= 1 << bit;
                    }
                }
                word
            })
            .collect();
        snapshot
    }

    fn get_integer(&self, index: usize) -> u32 {
        self.custom_integers.get(index).copied().unwrap_or(0)
    }

    fn get_boolean(&self, index: usize) -> bool {
        self.custom_boolean_words
            .get(index / 32)
            .map(|word| word & (1 << (index % 32)) != 0)
            .unwrap_or(false)
    }
}

/// Queues and caches shared with the Lua closures.
struct ScriptAppData {
    commands: RefCell<Vec<ScriptCmd>>,
    snapshot: RefCell<Arc<GameSnapshot>>,
}

/// The Lua runtime of the current map.
///
/// `NonSend` resource: the Lua state is not thread-safe. Destroying it
/// (on map change) frees the timers it owns.
pub struct MapScript {
    lua: Lua,
    /// Timers started by this script, freed with it.
    pub timers: Vec<ScriptTimer>,
    /// While suspended, events are still delivered but timers freeze.
    pub suspended: bool,
}

impl MapScript {
    pub fn new() -> LuaResult<Self> {
        let lua = Lua::new();
        lua.set_app_data(ScriptAppData {
            commands: RefCell::new(Vec::new()),
            snapshot: RefCell::new(Arc::new(GameSnapshot::default())),
        });
        let script = MapScript {
            lua,
            timers: Vec::new(),
            suspended: false,
        };
        script.register_api()?;
        Ok(script)
    }

    /// Load and run the map script source (its body registers the event
    /// handlers as global functions).
    pub fn load_source(&self, name: &str, source: &str) -> LuaResult<()> {
        self.lua.load(source).set_name(name).exec()
    }

    pub fn load_file(&self, path: &str) -> LuaResult<()> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| LuaError::ExternalError(std::sync::Arc::new(e)))?;
        self.load_source(path, &source)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.lua.globals().get::<LuaFunction>(name).is_ok()
    }

    /// The underlying Lua state, for advanced embedding and tests.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Call an event handler if the script defines it. Errors are logged
    /// and swallowed; the engine continues at the next tick.
    pub fn call_event<A>(&self, name: &str, args: A)
    where
        A: IntoLuaMulti,
    {
        let Ok(func) = self.lua.globals().get::<LuaFunction>(name) else {
            return;
        };
        if let Err(e) = func.call::<()>(args) {
            error!(target: "script", "error in {name}: {e}");
        }
    }

    /// Refresh the read-only snapshot scripts observe.
    pub fn update_snapshot(&self, snapshot: GameSnapshot) {
        if let Some(data) = self.lua.app_data_ref::<ScriptAppData>() {
            *data.snapshot.borrow_mut() = Arc::new(snapshot);
        }
    }

    /// Drain the commands queued since the last drain point.
    pub fn drain_commands(&self) -> Vec<ScriptCmd> {
        self.lua
            .app_data_ref::<ScriptAppData>()
            .map(|data| data.commands.borrow_mut().drain(..).collect())
            .unwrap_or_default()
    }

    fn push(lua: &Lua, cmd: ScriptCmd) -> LuaResult<()> {
        lua.app_data_ref::<ScriptAppData>()
            .ok_or_else(|| LuaError::runtime("script app data not found"))?
            .commands
            .borrow_mut()
            .push(cmd);
        Ok(())
    }

    /// Build the `sol` table: `sol.map`, `sol.game`, `sol.audio`,
    /// `sol.timer`, `sol.dialog`.
    fn register_api(&self) -> LuaResult<()> {
        let lua = &self.lua;
        let sol = lua.create_table()?;

        // ---- sol.map ----
        let map = lua.create_table()?;
        map.set(
            "set_current_map",
            lua.create_function(|lua, (map_id, destination, transition): (String, String, Option<String>)| {
                Self::push(lua, ScriptCmd::SetCurrentMap {
                    map_id,
                    destination,
                    transition: transition.unwrap_or_else(|| "fade".to_string()),
                })
            })?,
        )?;
        map.set(
            "set_light",
            lua.create_function(|lua, level: i32| Self::push(lua, ScriptCmd::SetLight { level }))?,
        )?;
        map.set(
            "camera_move",
            lua.create_function(|lua, (x, y, speed): (i32, i32, Option<i32>)| {
                Self::push(lua, ScriptCmd::CameraMove {
                    x,
                    y,
                    speed: speed.unwrap_or(120),
                })
            })?,
        )?;
        map.set(
            "camera_restore",
            lua.create_function(|lua, (): ()| Self::push(lua, ScriptCmd::CameraRestore))?,
        )?;
        map.set(
            "hero_freeze",
            lua.create_function(|lua, (): ()| Self::push(lua, ScriptCmd::HeroFreeze))?,
        )?;
        map.set(
            "hero_unfreeze",
            lua.create_function(|lua, (): ()| Self::push(lua, ScriptCmd::HeroUnfreeze))?,
        )?;
        map.set(
            "hero_set_direction",
            lua.create_function(|lua, direction4: i32| {
                Self::push(lua, ScriptCmd::HeroSetDirection { direction4 })
            })?,
        )?;
        map.set(
            "hero_set_position",
            lua.create_function(|lua, (x, y, layer): (i32, i32, Option<u8>)| {
                Self::push(lua, ScriptCmd::HeroSetPosition { x, y, layer })
            })?,
        )?;
        map.set(
            "hero_align_on_sensor",
            lua.create_function(|lua, name: String| {
                Self::push(lua, ScriptCmd::HeroAlignOnSensor { name })
            })?,
        )?;
        map.set(
            "hero_start_jumping",
            lua.create_function(
                |lua, (direction8, length, ignore_obstacles): (i32, i32, bool)| {
                    Self::push(lua, ScriptCmd::HeroStartJumping {
                        direction8,
                        length,
                        ignore_obstacles,
                    })
                },
            )?,
        )?;
        map.set(
            "hero_start_victory",
            lua.create_function(|lua, (): ()| Self::push(lua, ScriptCmd::HeroStartVictory))?,
        )?;
        map.set(
            "hero_start_boomerang",
            lua.create_function(|lua, (): ()| Self::push(lua, ScriptCmd::HeroStartBoomerang))?,
        )?;
        map.set(
            "hero_start_bow",
            lua.create_function(|lua, (): ()| Self::push(lua, ScriptCmd::HeroStartBow))?,
        )?;
        map.set(
            "hero_start_running",
            lua.create_function(|lua, (): ()| Self::push(lua, ScriptCmd::HeroStartRunning))?,
        )?;
        map.set(
            "hero_get_position",
            lua.create_function(|lua, (): ()| {
                let data = lua
                    .app_data_ref::<ScriptAppData>()
                    .ok_or_else(|| LuaError::runtime("script app data not found"))?;
                let snapshot = data.snapshot.borrow();
                Ok((snapshot.hero_x, snapshot.hero_y, snapshot.hero_layer))
            })?,
        )?;
        map.set(
            "npc_walk",
            lua.create_function(
                |lua, (name, path, loops, ignore_obstacles): (String, String, bool, bool)| {
                    Self::push(lua, ScriptCmd::NpcWalk {
                        name,
                        path,
                        loops,
                        ignore_obstacles,
                    })
                },
            )?,
        )?;
        map.set(
            "npc_random_walk",
            lua.create_function(|lua, name: String| {
                Self::push(lua, ScriptCmd::NpcRandomWalk { name })
            })?,
        )?;
        map.set(
            "npc_jump",
            lua.create_function(
                |lua, (name, direction8, length, ignore_obstacles): (String, i32, i32, bool)| {
                    Self::push(lua, ScriptCmd::NpcJump {
                        name,
                        direction8,
                        length,
                        ignore_obstacles,
                    })
                },
            )?,
        )?;
        map.set(
            "npc_set_animation",
            lua.create_function(|lua, (name, animation): (String, String)| {
                Self::push(lua, ScriptCmd::NpcSetAnimation { name, animation })
            })?,
        )?;
        map.set(
            "npc_set_direction",
            lua.create_function(|lua, (name, direction): (String, i32)| {
                Self::push(lua, ScriptCmd::NpcSetDirection { name, direction })
            })?,
        )?;
        map.set(
            "npc_remove",
            lua.create_function(|lua, name: String| Self::push(lua, ScriptCmd::NpcRemove { name }))?,
        )?;
        map.set(
            "chest_set_open",
            lua.create_function(|lua, (name, open): (String, bool)| {
                Self::push(lua, ScriptCmd::ChestSetOpen { name, open })
            })?,
        )?;
        map.set(
            "chest_set_hidden",
            lua.create_function(|lua, (name, hidden): (String, bool)| {
                Self::push(lua, ScriptCmd::ChestSetHidden { name, hidden })
            })?,
        )?;
        map.set(
            "tile_set_enabled",
            lua.create_function(|lua, (name, enabled): (String, bool)| {
                Self::push(lua, ScriptCmd::TileSetEnabled { name, enabled })
            })?,
        )?;
        map.set(
            "tiles_set_enabled",
            lua.create_function(|lua, (prefix, enabled): (String, bool)| {
                Self::push(lua, ScriptCmd::TileSetEnabledPrefix { prefix, enabled })
            })?,
        )?;
        map.set(
            "block_reset",
            lua.create_function(|lua, name: String| Self::push(lua, ScriptCmd::BlockReset { name }))?,
        )?;
        map.set(
            "block_reset_all",
            lua.create_function(|lua, (): ()| Self::push(lua, ScriptCmd::BlockResetAll))?,
        )?;
        map.set(
            "switch_set_enabled",
            lua.create_function(|lua, (name, enabled): (String, bool)| {
                Self::push(lua, ScriptCmd::SwitchSetEnabled { name, enabled })
            })?,
        )?;
        map.set(
            "switch_set_locked",
            lua.create_function(|lua, (name, locked): (String, bool)| {
                Self::push(lua, ScriptCmd::SwitchSetLocked { name, locked })
            })?,
        )?;
        map.set(
            "enemy_set_enabled",
            lua.create_function(|lua, (name, enabled): (String, bool)| {
                Self::push(lua, ScriptCmd::EnemySetEnabled { name, enabled })
            })?,
        )?;
        map.set(
            "boss_start_battle",
            lua.create_function(|lua, name: String| {
                Self::push(lua, ScriptCmd::BossStartBattle { name })
            })?,
        )?;
        map.set(
            "boss_end_battle",
            lua.create_function(|lua, (): ()| Self::push(lua, ScriptCmd::BossEndBattle))?,
        )?;
        map.set(
            "miniboss_start_battle",
            lua.create_function(|lua, name: String| {
                Self::push(lua, ScriptCmd::MinibossStartBattle { name })
            })?,
        )?;
        map.set(
            "miniboss_end_battle",
            lua.create_function(|lua, (): ()| Self::push(lua, ScriptCmd::MinibossEndBattle))?,
        )?;
        map.set(
            "door_open",
            lua.create_function(|lua, prefix: String| Self::push(lua, ScriptCmd::DoorOpen { prefix }))?,
        )?;
        map.set(
            "door_close",
            lua.create_function(|lua, prefix: String| {
                Self::push(lua, ScriptCmd::DoorClose { prefix })
            })?,
        )?;
        map.set(
            "door_set_open",
            lua.create_function(|lua, (prefix, open): (String, bool)| {
                Self::push(lua, ScriptCmd::DoorSetOpen { prefix, open })
            })?,
        )?;
        sol.set("map", map)?;

        // ---- sol.game ----
        let game = lua.create_table()?;
        game.set(
            "give_treasure",
            lua.create_function(
                |lua, (item, variant, savegame_variable): (String, Option<u32>, Option<usize>)| {
                    Self::push(lua, ScriptCmd::GiveTreasure {
                        item,
                        variant: variant.unwrap_or(1),
                        savegame_variable,
                    })
                },
            )?,
        )?;
        game.set(
            "get_integer",
            lua.create_function(|lua, index: usize| {
                let data = lua
                    .app_data_ref::<ScriptAppData>()
                    .ok_or_else(|| LuaError::runtime("script app data not found"))?;
                let value = data.snapshot.borrow().get_integer(index);
                Ok(value)
            })?,
        )?;
        game.set(
            "set_integer",
            lua.create_function(|lua, (index, value): (usize, u32)| {
                Self::push(lua, ScriptCmd::SavegameSetInteger { index, value })
            })?,
        )?;
        game.set(
            "get_boolean",
            lua.create_function(|lua, index: usize| {
                let data = lua
                    .app_data_ref::<ScriptAppData>()
                    .ok_or_else(|| LuaError::runtime("script app data not found"))?;
                let value = data.snapshot.borrow().get_boolean(index);
                Ok(value)
            })?,
        )?;
        game.set(
            "set_boolean",
            lua.create_function(|lua, (index, value): (usize, bool)| {
                Self::push(lua, ScriptCmd::SavegameSetBoolean { index, value })
            })?,
        )?;
        sol.set("game", game)?;

        // ---- sol.audio ----
        let audio = lua.create_table()?;
        audio.set(
            "play_sound",
            lua.create_function(|lua, id: String| Self::push(lua, ScriptCmd::PlaySound { id }))?,
        )?;
        audio.set(
            "play_music",
            lua.create_function(|lua, id: String| Self::push(lua, ScriptCmd::PlayMusic { id }))?,
        )?;
        audio.set(
            "stop_music",
            lua.create_function(|lua, (): ()| Self::push(lua, ScriptCmd::StopMusic))?,
        )?;
        sol.set("audio", audio)?;

        // ---- sol.timer ----
        let timer = lua.create_table()?;
        timer.set(
            "start",
            lua.create_function(
                |lua, (callback, duration, with_sound): (String, u32, Option<bool>)| {
                    Self::push(lua, ScriptCmd::TimerStart {
                        callback,
                        duration,
                        with_sound: with_sound.unwrap_or(false),
                    })
                },
            )?,
        )?;
        timer.set(
            "stop",
            lua.create_function(|lua, callback: String| {
                Self::push(lua, ScriptCmd::TimerStop { callback })
            })?,
        )?;
        sol.set("timer", timer)?;

        // ---- sol.dialog ----
        let dialog = lua.create_table()?;
        dialog.set(
            "start",
            lua.create_function(|lua, id: String| Self::push(lua, ScriptCmd::DialogStart { id }))?,
        )?;
        dialog.set(
            "set_variable",
            lua.create_function(|lua, (id, value): (String, String)| {
                Self::push(lua, ScriptCmd::DialogSetVariable { id, value })
            })?,
        )?;
        sol.set("dialog", dialog)?;

        // sol.log(message)
        sol.set(
            "log",
            lua.create_function(|_, msg: String| {
                log::info!(target: "script", "{msg}");
                Ok(())
            })?,
        )?;

        lua.globals().set("sol", sol)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_queued_in_call_order() {
        let script = MapScript::new().unwrap();
        script
            .load_source(
                "test",
                r#"
                function event_map_started(destination)
                    sol.audio.play_sound("door_open")
                    sol.map.door_open("d")
                    sol.timer.start("on_delay", 500, false)
                end
                "#,
            )
            .unwrap();
        script.call_event("event_map_started", "spawn");
        let commands = script.drain_commands();
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[0], ScriptCmd::PlaySound { .. }));
        assert!(matches!(commands[1], ScriptCmd::DoorOpen { .. }));
        assert!(matches!(
            commands[2],
            ScriptCmd::TimerStart { duration: 500, .. }
        ));
        assert!(script.drain_commands().is_empty());
    }

    #[test]
    fn snapshot_reads_are_synchronous() {
        let script = MapScript::new().unwrap();
        let mut snapshot = GameSnapshot::default();
        snapshot.custom_integers = vec![0; 1024];
        snapshot.custom_integers[7] = 42;
        snapshot.custom_boolean_words = vec![0; 1024];
        snapshot.custom_boolean_words[0] = 1 << 5;
        script.update_snapshot(snapshot);

        script
            .load_source(
                "test",
                r#"
                function check()
                    return sol.game.get_integer(7), sol.game.get_boolean(5)
                end
                "#,
            )
            .unwrap();
        let func: LuaFunction = script.lua.globals().get("check").unwrap();
        let (i, b): (u32, bool) = func.call(()).unwrap();
        assert_eq!(i, 42);
        assert!(b);
    }

    #[test]
    fn missing_event_handler_is_not_an_error() {
        let script = MapScript::new().unwrap();
        script.call_event("event_not_defined", ());
        assert!(script.drain_commands().is_empty());
    }
}
