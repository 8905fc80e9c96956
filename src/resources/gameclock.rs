//! Logical game clock.
//!
//! Every deadline in the engine (movement steps, sprite frames, timers,
//! dialog reveals, transitions) is a `u32` millisecond date compared against
//! [`GameClock::now`]. The clock only advances inside logical updates, by
//! [`TICK_MS`] per tick, so the whole simulation is deterministic regardless
//! of wall-clock jitter.

use bevy_ecs::prelude::Resource;

/// Duration of one logical tick in ms (60 Hz target).
pub const TICK_MS: u32 = 16;

/// Monotonic millisecond clock advanced once per logical update.
#[derive(Resource, Debug, Clone, Copy)]
pub struct GameClock {
    /// Current logical time in ms since the game started.
    pub now: u32,
    /// Total number of logical ticks since the game started.
    pub tick_count: u64,
}

impl Default for GameClock {
    fn default() -> Self {
        GameClock {
            now: 0,
            tick_count: 0,
        }
    }
}

impl GameClock {
    /// Advance the clock by one tick.
    pub fn advance(&mut self) {
        self.now += TICK_MS;
        self.tick_count += 1;
    }
}

/// Whether the game world is suspended this tick.
///
/// The game is suspended while any of pause menu, dialog box, transition,
/// game-over sequence or treasure brandishing is active. Entity updates
/// still run, but movements, sprite clocks and timers freeze; on resume
/// their pending dates shift by the suspension duration.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct GameSuspension {
    pub suspended: bool,
}
