//! Per-dungeon equipment view.
//!
//! Small keys, the dungeon map, the compass and the two big keys are stored
//! in the custom savegame space, at indices derived from the dungeon number.
//! Outside a dungeon the view is absent.

use bevy_ecs::prelude::Resource;

use crate::resources::savegame::Savegame;

/// First custom boolean used by dungeon #1; each dungeon owns 10 booleans.
const FIRST_DUNGEON_BOOLEAN: usize = 850;

/// The dungeon the current map belongs to, if any.
#[derive(Resource, Debug, Clone, Copy)]
pub struct Dungeon {
    /// Dungeon number, starting at 1.
    pub number: u32,
    /// Custom integer index counting the small keys of this dungeon.
    pub small_keys_variable: Option<usize>,
}

impl Dungeon {
    fn boolean(&self, offset: usize) -> usize {
        FIRST_DUNGEON_BOOLEAN + (self.number as usize - 1) * 10 + offset
    }

    pub fn has_map(&self, savegame: &Savegame) -> bool {
        savegame.get_boolean(self.boolean(0))
    }

    pub fn add_map(&self, savegame: &mut Savegame) {
        savegame.set_boolean(self.boolean(0), true);
    }

    pub fn has_compass(&self, savegame: &Savegame) -> bool {
        savegame.get_boolean(self.boolean(1))
    }

    pub fn add_compass(&self, savegame: &mut Savegame) {
        savegame.set_boolean(self.boolean(1), true);
    }

    pub fn has_big_key(&self, savegame: &Savegame) -> bool {
        savegame.get_boolean(self.boolean(2))
    }

    pub fn add_big_key(&self, savegame: &mut Savegame) {
        savegame.set_boolean(self.boolean(2), true);
    }

    pub fn has_boss_key(&self, savegame: &Savegame) -> bool {
        savegame.get_boolean(self.boolean(3))
    }

    pub fn add_boss_key(&self, savegame: &mut Savegame) {
        savegame.set_boolean(self.boolean(3), true);
    }

    pub fn get_small_keys(&self, savegame: &Savegame) -> u32 {
        let variable = self
            .small_keys_variable
            .expect("this map has no small keys counter");
        savegame.get_integer(variable)
    }

    pub fn add_small_key(&self, savegame: &mut Savegame) {
        let variable = self
            .small_keys_variable
            .expect("this map has no small keys counter");
        savegame.set_integer(variable, savegame.get_integer(variable) + 1);
    }

    pub fn remove_small_key(&self, savegame: &mut Savegame) {
        let variable = self
            .small_keys_variable
            .expect("this map has no small keys counter");
        let keys = savegame.get_integer(variable);
        assert!(keys > 0, "no small key to remove");
        savegame.set_integer(variable, keys - 1);
    }
}
