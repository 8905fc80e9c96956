//! Equipment: the gameplay view over the savegame.
//!
//! [`Equipment`] borrows the [`Savegame`] and the [`ItemRegistry`] and
//! exposes life, money, magic, ability levels, inventory items and the two
//! assignable item slots. It is a view, not a copy: every read and write
//! goes straight to the savegame indices, which stay the single source of
//! truth for persistent state.

use anyhow::{Context, Result};
use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::resources::savegame::{Savegame, ints};

/// Static definition of an inventory item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemDefinition {
    pub name: String,
    /// Number of variants (levels) of this item.
    #[serde(default = "one")]
    pub nb_variants: u32,
    /// Custom savegame integer holding the possessed variant, 0 = none.
    pub savegame_variable: usize,
    /// Item with an associated amount counter (bombs, arrows, ...).
    #[serde(default)]
    pub counter: Option<ItemCounter>,
    /// Whether the item may be assigned to an item slot.
    #[serde(default)]
    pub attributable: bool,
    /// Only obtainable and usable inside a dungeon.
    #[serde(default)]
    pub dungeon_only: bool,
}

fn one() -> u32 {
    1
}

/// Which counter an item increments and consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCounter {
    Bombs,
    Arrows,
    Rupees,
    Magic,
}

/// Registry of item definitions, loaded once from `items.json`.
#[derive(Resource, Default)]
pub struct ItemRegistry {
    items: FxHashMap<String, ItemDefinition>,
    /// Stable order, used to encode an item as an integer in a slot.
    order: Vec<String>,
}

impl ItemRegistry {
    pub fn load_json(json: &str) -> Result<Self> {
        let list: Vec<ItemDefinition> =
            serde_json::from_str(json).context("failed to parse item registry")?;
        let mut registry = ItemRegistry::default();
        for item in list {
            registry.insert(item);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, item: ItemDefinition) {
        self.order.push(item.name.clone());
        self.items.insert(item.name.clone(), item);
    }

    pub fn get(&self, name: &str) -> &ItemDefinition {
        self.items
            .get(name)
            .unwrap_or_else(|| panic!("unknown item '{name}'"))
    }

    pub fn find(&self, name: &str) -> Option<&ItemDefinition> {
        self.items.get(name)
    }

    /// 1-based index of an item in registry order; 0 encodes "no item".
    pub fn index_of(&self, name: &str) -> u32 {
        self.order
            .iter()
            .position(|n| n == name)
            .map(|i| i as u32 + 1)
            .unwrap_or_else(|| panic!("unknown item '{name}'"))
    }

    pub fn name_of(&self, index: u32) -> Option<&str> {
        if index == 0 {
            None
        } else {
            self.order.get(index as usize - 1).map(String::as_str)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.order.iter().map(|name| &self.items[name])
    }
}

/// Treasures waiting to be brandished by the hero, in order. Chests, shop
/// purchases and the script `give_treasure` operation push here; the
/// orchestrator pops one at a time.
#[derive(Resource, Debug, Clone, Default)]
pub struct TreasureQueue(pub Vec<crate::resources::mapdata::TreasureData>);

/// Borrowed gameplay view over the savegame.
pub struct Equipment<'a> {
    savegame: &'a mut Savegame,
    registry: &'a ItemRegistry,
}

impl<'a> Equipment<'a> {
    pub fn new(savegame: &'a mut Savegame, registry: &'a ItemRegistry) -> Self {
        Equipment { savegame, registry }
    }

    // life, in quarters of heart

    pub fn get_life(&self) -> u32 {
        self.savegame.get_reserved_integer(ints::CURRENT_LIFE)
    }

    pub fn get_max_life(&self) -> u32 {
        self.savegame.get_reserved_integer(ints::MAX_HEARTS) * 4
    }

    pub fn set_life(&mut self, life: u32) {
        let life = life.min(self.get_max_life());
        self.savegame.set_reserved_integer(ints::CURRENT_LIFE, life);
    }

    pub fn add_life(&mut self, quarters: u32) {
        self.set_life(self.get_life() + quarters);
    }

    /// Remove raw quarters of life, without tunic reduction.
    pub fn remove_life(&mut self, quarters: u32) {
        let life = self.get_life().saturating_sub(quarters);
        self.savegame.set_reserved_integer(ints::CURRENT_LIFE, life);
    }

    /// Remove life from an attack: the damage is divided by the tunic level.
    pub fn hurt(&mut self, damage: u32) {
        let divisor = self.get_tunic().max(1);
        self.remove_life(damage.div_ceil(divisor));
    }

    pub fn add_max_life(&mut self, hearts: u32) {
        let max = self.savegame.get_reserved_integer(ints::MAX_HEARTS);
        self.savegame
            .set_reserved_integer(ints::MAX_HEARTS, max + hearts);
    }

    pub fn needs_hearts(&self) -> bool {
        self.get_life() < self.get_max_life()
    }

    // pieces of heart

    pub fn get_nb_pieces_of_heart(&self) -> u32 {
        self.savegame.get_reserved_integer(ints::PIECES_OF_HEART)
    }

    pub fn has_piece_of_heart(&self, number: usize) -> bool {
        self.savegame
            .get_reserved_integer(ints::FIRST_PIECE_OF_HEART + number)
            != 0
    }

    /// Give piece of heart `number`; 4 pieces make a new heart and refill
    /// the life.
    pub fn add_piece_of_heart(&mut self, number: usize) {
        assert!(
            !self.has_piece_of_heart(number),
            "piece of heart #{number} already found"
        );
        self.savegame
            .set_reserved_integer(ints::FIRST_PIECE_OF_HEART + number, 1);
        let pieces = self.get_nb_pieces_of_heart() + 1;
        self.savegame
            .set_reserved_integer(ints::PIECES_OF_HEART, pieces % 4);
        if pieces % 4 == 0 {
            self.add_max_life(1);
            self.set_life(self.get_max_life());
        }
    }

    // rupees

    pub fn get_rupees(&self) -> u32 {
        self.savegame.get_reserved_integer(ints::CURRENT_RUPEES)
    }

    pub fn get_max_rupees(&self) -> u32 {
        self.savegame.get_reserved_integer(ints::MAX_RUPEES)
    }

    pub fn add_rupees(&mut self, amount: u32) {
        let rupees = (self.get_rupees() + amount).min(self.get_max_rupees());
        self.savegame
            .set_reserved_integer(ints::CURRENT_RUPEES, rupees);
    }

    pub fn remove_rupees(&mut self, amount: u32) {
        let rupees = self.get_rupees().saturating_sub(amount);
        self.savegame
            .set_reserved_integer(ints::CURRENT_RUPEES, rupees);
    }

    // magic, bombs, arrows

    pub fn get_magic(&self) -> u32 {
        self.savegame.get_reserved_integer(ints::CURRENT_MAGIC)
    }

    pub fn get_max_magic(&self) -> u32 {
        self.savegame.get_reserved_integer(ints::MAX_MAGIC)
    }

    pub fn add_magic(&mut self, amount: u32) {
        let magic = (self.get_magic() + amount).min(self.get_max_magic());
        self.savegame
            .set_reserved_integer(ints::CURRENT_MAGIC, magic);
    }

    pub fn remove_magic(&mut self, amount: u32) {
        let magic = self.get_magic().saturating_sub(amount);
        self.savegame
            .set_reserved_integer(ints::CURRENT_MAGIC, magic);
    }

    pub fn counter(&self, counter: ItemCounter) -> u32 {
        let index = match counter {
            ItemCounter::Bombs => ints::CURRENT_BOMBS,
            ItemCounter::Arrows => ints::CURRENT_ARROWS,
            ItemCounter::Rupees => ints::CURRENT_RUPEES,
            ItemCounter::Magic => ints::CURRENT_MAGIC,
        };
        self.savegame.get_reserved_integer(index)
    }

    pub fn add_counter(&mut self, counter: ItemCounter, amount: u32) {
        match counter {
            ItemCounter::Bombs => {
                let max = self.savegame.get_reserved_integer(ints::MAX_BOMBS);
                let v = (self.counter(counter) + amount).min(max);
                self.savegame.set_reserved_integer(ints::CURRENT_BOMBS, v);
            }
            ItemCounter::Arrows => {
                let max = self.savegame.get_reserved_integer(ints::MAX_ARROWS);
                let v = (self.counter(counter) + amount).min(max);
                self.savegame.set_reserved_integer(ints::CURRENT_ARROWS, v);
            }
            ItemCounter::Rupees => self.add_rupees(amount),
            ItemCounter::Magic => self.add_magic(amount),
        }
    }

    pub fn remove_counter(&mut self, counter: ItemCounter, amount: u32) {
        let index = match counter {
            ItemCounter::Bombs => ints::CURRENT_BOMBS,
            ItemCounter::Arrows => ints::CURRENT_ARROWS,
            ItemCounter::Rupees => ints::CURRENT_RUPEES,
            ItemCounter::Magic => ints::CURRENT_MAGIC,
        };
        let v = self.savegame.get_reserved_integer(index).saturating_sub(amount);
        self.savegame.set_reserved_integer(index, v);
    }

    // abilities

    pub fn get_tunic(&self) -> u32 {
        self.savegame.get_reserved_integer(ints::TUNIC)
    }

    pub fn set_tunic(&mut self, level: u32) {
        assert!((1..=3).contains(&level), "bad tunic level {level}");
        self.savegame.set_reserved_integer(ints::TUNIC, level);
    }

    pub fn get_sword(&self) -> u32 {
        self.savegame.get_reserved_integer(ints::SWORD)
    }

    pub fn has_sword(&self) -> bool {
        self.get_sword() > 0
    }

    pub fn set_sword(&mut self, level: u32) {
        assert!(level <= 4, "bad sword level {level}");
        self.savegame.set_reserved_integer(ints::SWORD, level);
    }

    pub fn get_shield(&self) -> u32 {
        self.savegame.get_reserved_integer(ints::SHIELD)
    }

    pub fn has_shield(&self) -> bool {
        self.get_shield() > 0
    }

    pub fn set_shield(&mut self, level: u32) {
        assert!(level <= 3, "bad shield level {level}");
        self.savegame.set_reserved_integer(ints::SHIELD, level);
    }

    // inventory items

    pub fn has_item(&self, name: &str) -> bool {
        self.get_item_variant(name) > 0
    }

    pub fn get_item_variant(&self, name: &str) -> u32 {
        let item = self.registry.get(name);
        self.savegame.get_integer(item.savegame_variable)
    }

    pub fn set_item_variant(&mut self, name: &str, variant: u32) {
        let item = self.registry.get(name);
        assert!(
            variant <= item.nb_variants,
            "item '{name}' has no variant {variant}"
        );
        self.savegame.set_integer(item.savegame_variable, variant);
    }

    // assignable slots: 0 is ITEM_1, 1 is ITEM_2

    fn slot_index(slot: usize) -> usize {
        match slot {
            0 => ints::ITEM_SLOT_1,
            1 => ints::ITEM_SLOT_2,
            _ => panic!("bad item slot {slot}"),
        }
    }

    pub fn get_item_assigned(&self, slot: usize) -> Option<&str> {
        let code = self.savegame.get_reserved_integer(Self::slot_index(slot));
        self.registry.name_of(code)
    }

    pub fn set_item_assigned(&mut self, slot: usize, name: Option<&str>) {
        let code = match name {
            Some(name) => {
                assert!(
                    self.registry.get(name).attributable,
                    "item '{name}' is not attributable"
                );
                self.registry.index_of(name)
            }
            None => 0,
        };
        self.savegame
            .set_reserved_integer(Self::slot_index(slot), code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ItemRegistry {
        let mut registry = ItemRegistry::default();
        registry.insert(ItemDefinition {
            name: "flippers".into(),
            nb_variants: 1,
            savegame_variable: 200,
            counter: None,
            attributable: false,
            dungeon_only: false,
        });
        registry.insert(ItemDefinition {
            name: "bombs".into(),
            nb_variants: 1,
            savegame_variable: 201,
            counter: Some(ItemCounter::Bombs),
            attributable: true,
            dungeon_only: false,
        });
        registry
    }

    #[test]
    fn hurt_applies_tunic_divisor() {
        let mut savegame = Savegame::in_memory();
        let registry = registry();
        let mut equipment = Equipment::new(&mut savegame, &registry);
        equipment.set_life(12);
        equipment.set_tunic(2);
        equipment.hurt(4);
        assert_eq!(equipment.get_life(), 10);
        equipment.set_tunic(3);
        equipment.hurt(4);
        // 4 / 3 rounds up to 2 quarters
        assert_eq!(equipment.get_life(), 8);
    }

    #[test]
    fn fourth_piece_of_heart_adds_a_heart() {
        let mut savegame = Savegame::in_memory();
        let registry = registry();
        let mut equipment = Equipment::new(&mut savegame, &registry);
        let max_before = equipment.get_max_life();
        for n in 0..4 {
            equipment.add_piece_of_heart(n);
        }
        assert_eq!(equipment.get_max_life(), max_before + 4);
        assert_eq!(equipment.get_life(), equipment.get_max_life());
        assert_eq!(equipment.get_nb_pieces_of_heart(), 0);
    }

    #[test]
    fn item_slots_round_trip_through_registry_codes() {
        let mut savegame = Savegame::in_memory();
        let registry = registry();
        let mut equipment = Equipment::new(&mut savegame, &registry);
        assert_eq!(equipment.get_item_assigned(0), None);
        equipment.set_item_assigned(0, Some("bombs"));
        assert_eq!(equipment.get_item_assigned(0), Some("bombs"));
        equipment.set_item_assigned(0, None);
        assert_eq!(equipment.get_item_assigned(0), None);
    }
}
