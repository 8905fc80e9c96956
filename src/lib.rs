//! Emberward engine library.
//!
//! A 2D top-down action-adventure engine: a fixed-step loop drives a map
//! of typed entities around a hero state machine, with a tile obstacle
//! grid, a movement library, a Lua script bridge and the dialog/HUD/pause
//! overlays. This module exposes the components, resources, systems and
//! events for integration tests and for the `emberward` binary.

pub mod components;
pub mod events;
pub mod game;
pub mod geometry;
pub mod resources;
pub mod systems;
