//! High-level engine states.
//!
//! These resources track where the process is in its life cycle: loading
//! data, running a game, restarting it, or quitting. In-game modes (pause
//! menu, dialog, transition, game over) are not states here; they are
//! overlay flags consulted by the orchestrator each tick.

use bevy_ecs::prelude::Resource;

/// Discrete states of the engine process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GameStates {
    #[default]
    None,
    /// Loading data files and creating the world.
    Setup,
    Playing,
    /// Tearing the current game down to restart it.
    Resetting,
    Quitting,
}

/// A requested transition, applied by the main loop between ticks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NextGameStates {
    #[default]
    Unchanged,
    Pending(GameStates),
}

/// Authoritative current state.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    current: GameStates,
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            current: GameStates::None,
        }
    }

    pub fn get(&self) -> &GameStates {
        &self.current
    }

    pub fn set(&mut self, state: GameStates) {
        self.current = state;
    }

    pub fn is_playing(&self) -> bool {
        self.current == GameStates::Playing
    }
}

/// Intent to change to a new state.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Default)]
pub struct NextGameState {
    next: NextGameStates,
}

impl NextGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> &NextGameStates {
        &self.next
    }

    /// Mark a transition as pending; the main loop applies it.
    pub fn set(&mut self, next: GameStates) {
        self.next = NextGameStates::Pending(next);
    }

    /// Consume the pending transition, if any.
    pub fn take(&mut self) -> Option<GameStates> {
        match std::mem::take(&mut self.next) {
            NextGameStates::Pending(state) => Some(state),
            NextGameStates::Unchanged => None,
        }
    }
}
