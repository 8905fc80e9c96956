//! Commands a map script can queue for the engine.
//!
//! Scripts never mutate engine state directly: every operation of the
//! script surface pushes one of these commands, and the engine drains them
//! at defined points of the tick. One command is one atomic engine
//! operation, so a script error can never leave a collection half-mutated.

/// The operation surface exposed to map and item scripts.
#[derive(Debug, Clone)]
pub enum ScriptCmd {
    // world
    SetCurrentMap {
        map_id: String,
        destination: String,
        transition: String,
    },
    PlaySound {
        id: String,
    },
    PlayMusic {
        id: String,
    },
    StopMusic,
    SetLight {
        level: i32,
    },
    CameraMove {
        x: i32,
        y: i32,
        speed: i32,
    },
    CameraRestore,

    // hero
    HeroFreeze,
    HeroUnfreeze,
    HeroSetDirection {
        direction4: i32,
    },
    HeroSetPosition {
        x: i32,
        y: i32,
        layer: Option<u8>,
    },
    HeroAlignOnSensor {
        name: String,
    },
    HeroStartJumping {
        direction8: i32,
        length: i32,
        ignore_obstacles: bool,
    },
    HeroStartVictory,
    HeroStartBoomerang,
    HeroStartBow,
    HeroStartRunning,

    // NPCs and other named entities
    NpcWalk {
        name: String,
        path: String,
        loops: bool,
        ignore_obstacles: bool,
    },
    NpcRandomWalk {
        name: String,
    },
    NpcJump {
        name: String,
        direction8: i32,
        length: i32,
        ignore_obstacles: bool,
    },
    NpcSetAnimation {
        name: String,
        animation: String,
    },
    NpcSetDirection {
        name: String,
        direction: i32,
    },
    NpcRemove {
        name: String,
    },

    // chests
    ChestSetOpen {
        name: String,
        open: bool,
    },
    ChestSetHidden {
        name: String,
        hidden: bool,
    },

    // dynamic tiles, by exact name or by prefix
    TileSetEnabled {
        name: String,
        enabled: bool,
    },
    TileSetEnabledPrefix {
        prefix: String,
        enabled: bool,
    },

    // blocks
    BlockReset {
        name: String,
    },
    BlockResetAll,

    // switches
    SwitchSetEnabled {
        name: String,
        enabled: bool,
    },
    SwitchSetLocked {
        name: String,
        locked: bool,
    },

    // enemies
    EnemySetEnabled {
        name: String,
        enabled: bool,
    },
    BossStartBattle {
        name: String,
    },
    BossEndBattle,
    MinibossStartBattle {
        name: String,
    },
    MinibossEndBattle,

    // doors, always prefix-wide with one sound per batch
    DoorOpen {
        prefix: String,
    },
    DoorClose {
        prefix: String,
    },
    DoorSetOpen {
        prefix: String,
        open: bool,
    },

    // treasures and dialogs
    GiveTreasure {
        item: String,
        variant: u32,
        savegame_variable: Option<usize>,
    },
    DialogStart {
        id: String,
    },
    DialogSetVariable {
        id: String,
        value: String,
    },

    // savegame writes (the custom script-owned space)
    SavegameSetInteger {
        index: usize,
        value: u32,
    },
    SavegameSetBoolean {
        index: usize,
        value: bool,
    },

    // timers
    TimerStart {
        callback: String,
        duration: u32,
        with_sound: bool,
    },
    TimerStop {
        callback: String,
    },
}
