//! Serde models of the map files.
//!
//! A map file is a header plus one record per entity; the record fields
//! depend on the entity type, which serde dispatches on the `type` tag.
//! The loader (`systems::maploader`) turns this pure data into the live
//! [`Map`](crate::resources::map::Map) resource and spawned entities.

use anyhow::{Context, Result};
use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Every map of the quest, parsed once at startup, plus the Lua source of
/// each map's script.
#[derive(Resource, Default)]
pub struct MapStore {
    maps: FxHashMap<String, MapData>,
    scripts: FxHashMap<String, String>,
}

impl MapStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_map(&mut self, data: MapData) {
        self.maps.insert(data.id.clone(), data);
    }

    pub fn insert_script(&mut self, map_id: impl Into<String>, source: impl Into<String>) {
        self.scripts.insert(map_id.into(), source.into());
    }

    /// Fetch a map; a missing map id is fatal on first reference.
    pub fn get_map(&self, id: &str) -> &MapData {
        self.maps
            .get(id)
            .unwrap_or_else(|| panic!("no map with id '{id}'"))
    }

    pub fn find_script(&self, id: &str) -> Option<&str> {
        self.scripts.get(id).map(String::as_str)
    }
}

/// A whole map file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapData {
    pub id: String,
    /// Size in pixels, multiples of 8.
    pub width: i32,
    pub height: i32,
    pub world: i32,
    #[serde(default)]
    pub floor: Option<i32>,
    /// Custom savegame integer counting this dungeon's small keys.
    #[serde(default)]
    pub small_keys_variable: Option<usize>,
    pub tileset: String,
    #[serde(default)]
    pub music: String,
    pub entities: Vec<EntityData>,
}

impl MapData {
    pub fn load_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse map file")
    }
}

fn default_enabled() -> bool {
    true
}

/// One entity record of a map file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityData {
    Tile {
        layer: u8,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        pattern: u32,
    },
    DynamicTile {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        pattern: u32,
        #[serde(default = "default_enabled")]
        enabled: bool,
    },
    Destination {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        direction: i32,
    },
    Teletransporter {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        /// invisible | yellow
        subtype: String,
        /// immediate | fade | scrolling
        transition: String,
        destination_map: String,
        destination_point: String,
    },
    Pickable {
        layer: u8,
        x: i32,
        y: i32,
        /// rupee_1, heart, small_key, fairy, bomb_5, ...
        subtype: String,
        #[serde(default)]
        savegame_variable: Option<usize>,
    },
    Destructible {
        layer: u8,
        x: i32,
        y: i32,
        /// grass | bush | pot | stone_small_white | stone_small_black
        subtype: String,
        #[serde(default)]
        treasure: Option<TreasureData>,
    },
    Chest {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        big: bool,
        #[serde(default)]
        treasure: Option<TreasureData>,
    },
    JumpSensor {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        direction: i32,
        jump_length: i32,
    },
    Enemy {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        breed: String,
        /// normal | miniboss | boss
        #[serde(default)]
        rank: String,
        #[serde(default)]
        savegame_variable: Option<usize>,
        #[serde(default)]
        treasure: Option<TreasureData>,
    },
    Npc {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        direction: i32,
        /// custom | generalized_npc
        subtype: String,
        #[serde(default)]
        sprite: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Block {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        direction: i32,
        /// normal | statue
        subtype: String,
        /// 0: none, 1: once, 2: unlimited
        maximum_moves: u32,
    },
    Switch {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        /// invisible | normal
        subtype: String,
        needs_block: bool,
        disabled_when_leaving: bool,
    },
    CustomObstacle {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        stops_hero: bool,
        stops_enemies: bool,
        stops_npcs: bool,
        stops_blocks: bool,
    },
    Sensor {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        /// custom | change_layer | return_from_bad_ground
        subtype: String,
    },
    CrystalSwitch {
        layer: u8,
        x: i32,
        y: i32,
    },
    CrystalSwitchBlock {
        layer: u8,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        /// orange | blue
        subtype: String,
    },
    ShopItem {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        treasure: TreasureData,
        price: u32,
        message: String,
    },
    ConveyorBelt {
        layer: u8,
        x: i32,
        y: i32,
        direction: i32,
    },
    Door {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        direction: i32,
        /// closed | small_key | small_key_block | big_key | boss_key | weak | very_weak | weak_block
        subtype: String,
        #[serde(default)]
        savegame_variable: Option<usize>,
    },
    Stairs {
        name: String,
        layer: u8,
        x: i32,
        y: i32,
        direction: i32,
        /// spiral_upstairs | spiral_downstairs | straight_upstairs | straight_downstairs | inside_floor
        subtype: String,
    },
}

/// A treasure triple: what, which variant, and the saved flag.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreasureData {
    pub item: String,
    #[serde(default = "default_variant")]
    pub variant: u32,
    #[serde(default)]
    pub savegame_variable: Option<usize>,
}

fn default_variant() -> u32 {
    1
}

/// One dialog record of a dialogs file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DialogRecord {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub line3: String,
    /// Icon index shown next to the text, -1 for none.
    #[serde(default = "no_icon")]
    pub icon: i32,
    /// Id of the next message, empty to end the dialog.
    #[serde(default)]
    pub next: String,
    /// Next message when a question's second answer was chosen.
    #[serde(default)]
    pub next2: String,
    #[serde(default)]
    pub question: bool,
    /// "" | "current" | "all"
    #[serde(default)]
    pub skip: String,
}

fn no_icon() -> i32 {
    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_small_map() {
        let json = r#"{
            "id": "castle",
            "width": 320, "height": 240,
            "world": 0,
            "tileset": "castle",
            "music": "castle_theme",
            "entities": [
                {"type": "tile", "layer": 0, "x": 0, "y": 0,
                 "width": 320, "height": 240, "pattern": 4},
                {"type": "chest", "name": "chest_sword", "layer": 0,
                 "x": 96, "y": 48, "big": true,
                 "treasure": {"item": "sword", "savegame_variable": 64}},
                {"type": "door", "name": "d1", "layer": 0, "x": 160, "y": 0,
                 "direction": 1, "subtype": "closed", "savegame_variable": 70}
            ]
        }"#;
        let map = MapData::load_json(json).unwrap();
        assert_eq!(map.entities.len(), 3);
        match &map.entities[1] {
            EntityData::Chest { name, treasure, .. } => {
                assert_eq!(name, "chest_sword");
                assert_eq!(treasure.as_ref().unwrap().variant, 1);
            }
            other => panic!("expected a chest, got {other:?}"),
        }
    }
}
