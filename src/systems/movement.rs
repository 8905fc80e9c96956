//! Movement update system.
//!
//! Advances every attached [`Movement`] in MapEntities iteration order,
//! testing candidate boxes against the tile grid and the obstacle entity
//! index. A moved entity patches its index entry immediately, so entities
//! updated later in the same tick collide against fresh positions, and
//! publishes an [`EntityMoved`] message for the detector check.

use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;

use crate::components::entity::{BoundingBox, EntityKind, Layer, Suspended};
use crate::components::hero::Hero;
use crate::components::movement::{Movement, MovementKind};
use crate::events::detector::EntityMoved;
use crate::geometry::Point;
use crate::resources::gameclock::GameClock;
use crate::resources::map::Map;
use crate::resources::mapentities::MapEntities;
use crate::resources::obstacles::{Candidate, ObstacleIndex, test_obstacles};

/// Advance the [`EntityMoved`] queue each tick.
pub fn update_moved_messages(mut msgs: ResMut<Messages<EntityMoved>>) {
    msgs.update();
}

/// Advance every movement and apply the resulting position changes.
pub fn movement(
    clock: Res<GameClock>,
    map: Res<Map>,
    mut index: ResMut<ObstacleIndex>,
    entities: Res<MapEntities>,
    mut query: Query<(
        &EntityKind,
        &Layer,
        &mut BoundingBox,
        &mut Movement,
        Option<&Suspended>,
        Option<&Hero>,
    )>,
    anchors: Query<&BoundingBox>,
    mut moved_writer: MessageWriter<EntityMoved>,
) {
    let now = clock.now;

    // resolve follow/target anchors before borrowing anything mutably
    let mut anchor_points: FxHashMap<Entity, Point> = FxHashMap::default();
    for entity in entities.all.iter().chain(entities.hero.iter()) {
        if let Ok(bounding_box) = anchors.get(*entity) {
            anchor_points.insert(*entity, bounding_box.origin_point());
        }
    }

    let mut order: Vec<Entity> = Vec::with_capacity(entities.all.len() + 1);
    if let Some(hero) = entities.hero {
        order.push(hero);
    }
    order.extend(entities.all.iter().copied().filter(|e| Some(*e) != entities.hero));

    for entity in order {
        let Ok((kind, layer, mut bounding_box, mut movement, suspended, hero)) =
            query.get_mut(entity)
        else {
            continue;
        };
        if suspended.is_some_and(|s| s.suspended) && !movement.is_suspended() {
            // suspension is normally applied by apply_suspension; this
            // covers movements attached while already suspended
            movement.set_suspended(true, now);
        }

        // refresh the anchor of target/follow movements
        match &mut movement.kind {
            MovementKind::Target {
                target,
                entity: Some(target_entity),
                ..
            } => {
                if let Some(point) = anchor_points.get(target_entity) {
                    *target = *point;
                }
            }
            MovementKind::Follow {
                followed, anchor, ..
            } => {
                if let Some(point) = anchor_points.get(followed) {
                    *anchor = *point;
                }
            }
            _ => {}
        }

        let candidate = Candidate {
            entity,
            kind: *kind,
            layer: *layer,
            current_rect: bounding_box.rect,
            blocked_by_sensors: hero.is_some_and(|h| h.state.is_sensor_obstacle()),
        };

        let before = bounding_box.rect.position();
        {
            let index_ref = &*index;
            let map_ref = &*map;
            let mut test =
                |rect: &crate::geometry::Rectangle| test_obstacles(map_ref, index_ref, rect, &candidate);
            movement.update(now, &mut *bounding_box, &mut test);
        }

        if bounding_box.rect.position() != before {
            index.update_position(entity, bounding_box.rect);
            moved_writer.write(EntityMoved { entity });
        }
    }
}
