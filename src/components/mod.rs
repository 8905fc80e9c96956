//! ECS components of the map entities.
//!
//! Every map entity carries the base components of [`entity`]; the per-kind
//! submodules add the data specific to each entity type. Behavior lives in
//! `crate::systems`.
//!
//! Submodules overview:
//! - [`entity`] – kind tag, feature table, layer, bounding box, name, facing
//! - [`sprite`] – animation state over shared animation sets
//! - [`movement`] – the movement library (pixel, path, target, player, ...)
//! - [`hero`] – the hero and its state sum type
//! - [`tiles`] – dynamic tiles
//! - [`detectors`] – teletransporters, sensors, switches, stairs, belts
//! - [`chest`], [`door`], [`block`], [`enemy`], [`npc`] – the usual suspects
//! - [`pickable`] – pickable items and destructibles
//! - [`carried`] – carried/thrown items, boomerang, bombs, explosions
//! - [`shopitem`] – items sold in shops

pub mod block;
pub mod carried;
pub mod chest;
pub mod detectors;
pub mod door;
pub mod enemy;
pub mod entity;
pub mod hero;
pub mod movement;
pub mod npc;
pub mod pickable;
pub mod shopitem;
pub mod sprite;
pub mod tiles;
