//! Items sold in shops.

use bevy_ecs::prelude::Component;

use crate::resources::mapdata::TreasureData;

/// A treasure on a stand, bought with the action key.
#[derive(Debug, Clone, Component)]
pub struct ShopItem {
    pub treasure: TreasureData,
    pub price: u32,
    /// Dialog describing the item, shown before the buy question.
    pub message: String,
}

impl ShopItem {
    pub fn new(treasure: TreasureData, price: u32, message: impl Into<String>) -> Self {
        ShopItem {
            treasure,
            price,
            message: message.into(),
        }
    }
}
