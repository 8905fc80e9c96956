//! Post-update sweep: drop removed entities and resort the Y-order lists.

use bevy_ecs::prelude::*;

use crate::components::entity::BoundingBox;
use crate::resources::mapentities::MapEntities;

/// Despawn the entities marked for removal and clear every list that held
/// them, then restore the Y ordering of the display lists. The sort is
/// stable: entities at the same Y keep their insertion order.
pub fn post_update_sweep(
    mut entities: ResMut<MapEntities>,
    boxes: Query<&BoundingBox>,
    mut commands: Commands,
) {
    let to_remove = std::mem::take(&mut entities.to_remove);
    for entity in to_remove {
        entities.sweep_entity(entity);
        commands.entity(entity).despawn();
    }

    for layer in 0..crate::components::entity::Layer::COUNT {
        entities.displayed_y_order[layer].sort_by_key(|entity| {
            boxes
                .get(*entity)
                .map(|b| b.rect.y + b.rect.height)
                .unwrap_or(i32::MAX)
        });
    }
}
