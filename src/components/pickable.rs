//! Pickable items and destructible entities.

use bevy_ecs::prelude::Component;

use crate::resources::equipment::ItemCounter;
use crate::resources::mapdata::TreasureData;

/// What a pickable item gives when picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickableSubtype {
    Rupee(u32),
    Heart,
    PieceOfHeart(usize),
    SmallKey,
    Fairy,
    Bomb(u32),
    Arrow(u32),
    Magic(u32),
}

impl PickableSubtype {
    pub fn parse(name: &str) -> Self {
        match name {
            "rupee_1" => PickableSubtype::Rupee(1),
            "rupee_5" => PickableSubtype::Rupee(5),
            "rupee_20" => PickableSubtype::Rupee(20),
            "heart" => PickableSubtype::Heart,
            "small_key" => PickableSubtype::SmallKey,
            "fairy" => PickableSubtype::Fairy,
            "bomb_1" => PickableSubtype::Bomb(1),
            "bomb_5" => PickableSubtype::Bomb(5),
            "bomb_10" => PickableSubtype::Bomb(10),
            "arrow_1" => PickableSubtype::Arrow(1),
            "arrow_5" => PickableSubtype::Arrow(5),
            "arrow_10" => PickableSubtype::Arrow(10),
            "magic_small" => PickableSubtype::Magic(6),
            "magic_big" => PickableSubtype::Magic(42),
            other => {
                if let Some(n) = other.strip_prefix("piece_of_heart_") {
                    PickableSubtype::PieceOfHeart(n.parse().expect("bad piece of heart number"))
                } else {
                    panic!("unknown pickable subtype '{other}'")
                }
            }
        }
    }

    /// Counter incremented by this pickable, when it feeds one.
    pub fn counter(&self) -> Option<(ItemCounter, u32)> {
        match self {
            PickableSubtype::Rupee(n) => Some((ItemCounter::Rupees, *n)),
            PickableSubtype::Bomb(n) => Some((ItemCounter::Bombs, *n)),
            PickableSubtype::Arrow(n) => Some((ItemCounter::Arrows, *n)),
            PickableSubtype::Magic(n) => Some((ItemCounter::Magic, *n)),
            _ => None,
        }
    }

    pub fn sound(&self) -> &'static str {
        match self {
            PickableSubtype::Rupee(_) => "picked_rupee",
            PickableSubtype::Heart | PickableSubtype::Fairy => "picked_item",
            PickableSubtype::PieceOfHeart(_) => "piece_of_heart",
            PickableSubtype::SmallKey => "picked_small_key",
            _ => "picked_item",
        }
    }
}

/// A falling height when a pickable appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallingHeight {
    Low,
    Medium,
    High,
}

impl FallingHeight {
    pub fn index(self) -> usize {
        match self {
            FallingHeight::Low => 0,
            FallingHeight::Medium => 1,
            FallingHeight::High => 2,
        }
    }
}

/// An item lying on the ground, picked on contact.
#[derive(Debug, Clone, Component)]
pub struct Pickable {
    pub subtype: PickableSubtype,
    /// Custom boolean marking a unique pickable as taken.
    pub savegame_variable: Option<usize>,
    /// Before this date the item cannot be picked (it is still bouncing).
    pub can_be_picked_date: u32,
    /// Blinking starts here; 0 for persistent items.
    pub blink_date: u32,
    /// The item vanishes here; 0 for persistent items.
    pub disappear_date: u32,
}

impl Pickable {
    /// A pickable placed by the map, never expiring.
    pub fn placed(subtype: PickableSubtype, savegame_variable: Option<usize>) -> Self {
        Pickable {
            subtype,
            savegame_variable,
            can_be_picked_date: 0,
            blink_date: 0,
            disappear_date: 0,
        }
    }

    /// A pickable dropped by an enemy or a destructible: bounces, blinks
    /// and expires.
    pub fn dropped(subtype: PickableSubtype, now: u32) -> Self {
        Pickable {
            subtype,
            savegame_variable: None,
            can_be_picked_date: now + 700,
            blink_date: now + 8000,
            disappear_date: now + 10_000,
        }
    }
}

/// What a destructible looks like and how it reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestructibleSubtype {
    Grass,
    Bush,
    Pot,
    StoneSmallWhite,
    StoneSmallBlack,
}

impl DestructibleSubtype {
    pub fn parse(name: &str) -> Self {
        match name {
            "grass" => DestructibleSubtype::Grass,
            "bush" => DestructibleSubtype::Bush,
            "pot" => DestructibleSubtype::Pot,
            "stone_small_white" => DestructibleSubtype::StoneSmallWhite,
            "stone_small_black" => DestructibleSubtype::StoneSmallBlack,
            other => panic!("unknown destructible subtype '{other}'"),
        }
    }

    pub fn can_be_lifted(self) -> bool {
        !matches!(self, DestructibleSubtype::Grass)
    }

    pub fn can_be_cut(self) -> bool {
        matches!(self, DestructibleSubtype::Grass | DestructibleSubtype::Bush)
    }

    /// Lift ability level required.
    pub fn weight(self) -> u32 {
        match self {
            DestructibleSubtype::StoneSmallBlack => 2,
            _ => 1,
        }
    }

    pub fn destruction_sound(self) -> &'static str {
        match self {
            DestructibleSubtype::Grass | DestructibleSubtype::Bush => "bush",
            _ => "stone",
        }
    }
}

/// A bush, pot or stone the hero can lift or cut.
#[derive(Debug, Clone, Component)]
pub struct Destructible {
    pub subtype: DestructibleSubtype,
    /// Dropped when destroyed.
    pub treasure: Option<TreasureData>,
}

impl Destructible {
    pub fn new(subtype: DestructibleSubtype, treasure: Option<TreasureData>) -> Self {
        Destructible { subtype, treasure }
    }
}
