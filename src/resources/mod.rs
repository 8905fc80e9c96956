//! ECS resources: the long-lived state injected into the world.
//!
//! Overview
//! - [`gameclock`] – the deterministic millisecond clock
//! - [`controls`], [`keyseffect`] – logical keys and their current effects
//! - [`savegame`], [`equipment`], [`dungeon`] – persistent state and views
//! - [`map`], [`mapentities`], [`mapdata`], [`tileset`] – the current map
//! - [`animations`] – shared animation set data
//! - [`dialogs`], [`dialogbox`] – dialog records and the reveal machine
//! - [`hud`], [`pause`] – overlay states
//! - [`transition`] – map transition effects
//! - [`script`] – the per-map Lua runtime and its timers
//! - [`gamestate`], [`gameconfig`] – process states and settings
//! - [`audio`], [`texturestore`], [`fontstore`], [`rendertarget`],
//!   [`screensize`], [`windowsize`] – backend collaborators

pub mod animations;
pub mod audio;
pub mod controls;
pub mod dialogbox;
pub mod dialogs;
pub mod dungeon;
pub mod equipment;
pub mod fontstore;
pub mod gameclock;
pub mod gameconfig;
pub mod gamestate;
pub mod hud;
pub mod keyseffect;
pub mod map;
pub mod mapdata;
pub mod mapentities;
pub mod obstacles;
pub mod pause;
pub mod rendertarget;
pub mod savegame;
pub mod screensize;
pub mod script;
pub mod texturestore;
pub mod tileset;
pub mod transition;
pub mod windowsize;
