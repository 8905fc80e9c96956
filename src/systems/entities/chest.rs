//! Chests: the treasure pops after the opening animation.

use bevy_ecs::prelude::*;

use crate::components::chest::Chest;
use crate::resources::equipment::TreasureQueue;
use crate::resources::gameclock::{GameClock, GameSuspension};

/// Hand an opened chest's treasure to the orchestrator once its opening
/// delay elapsed.
pub fn chest_update(
    clock: Res<GameClock>,
    suspension: Res<GameSuspension>,
    mut treasures: ResMut<TreasureQueue>,
    mut query: Query<&mut Chest>,
) {
    if suspension.suspended {
        return;
    }
    for mut chest in query.iter_mut() {
        if chest.treasure_date != 0 && clock.now >= chest.treasure_date {
            chest.treasure_date = 0;
            if let Some(treasure) = chest.treasure.take() {
                treasures.0.push(treasure);
            }
        }
    }
}
