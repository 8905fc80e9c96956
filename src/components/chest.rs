//! Chests.

use bevy_ecs::prelude::Component;

use crate::resources::mapdata::TreasureData;

/// A chest the hero opens with the action key, facing up.
#[derive(Debug, Clone, Component)]
pub struct Chest {
    pub big: bool,
    pub treasure: Option<TreasureData>,
    pub open: bool,
    /// Scripts can hide a chest until a puzzle is solved.
    pub hidden: bool,
    /// Date the treasure pops after the opening animation, 0 when idle.
    pub treasure_date: u32,
}

impl Chest {
    pub fn new(big: bool, treasure: Option<TreasureData>) -> Self {
        Chest {
            big,
            treasure,
            open: false,
            hidden: false,
            treasure_date: 0,
        }
    }
}
