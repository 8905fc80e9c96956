//! Lua scripting for maps.
//!
//! Submodules:
//! - [`commands`] – the operation surface, as queueable commands
//! - [`runtime`] – the Lua state and the `sol` API
//! - [`timers`] – script-owned timers
//!
//! The engine delivers events by calling `event_*` global functions; the
//! script queues operations that the engine drains at defined points. See
//! `systems::script` for the drain points and command execution.

mod commands;
mod events;
mod runtime;
mod timers;

pub use commands::ScriptCmd;
pub use events::{ScriptEvent, ScriptEventQueue};
pub use runtime::{GameSnapshot, MapScript};
pub use timers::ScriptTimer;
