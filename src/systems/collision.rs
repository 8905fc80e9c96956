//! Collision resolver: obstacle index build and detector dispatch.
//!
//! Two systems and an observer:
//! - [`build_obstacle_index`] rebuilds the entity-obstacle index each tick.
//! - [`detector_check`] runs the overlap predicates of every detector
//!   against the entities that moved, triggering one
//!   [`DetectorHit`](crate::events::detector::DetectorHit) per
//!   (detector, entity, mode) that holds.
//! - [`detector_hit_observer`] dispatches a hit to the detector kind's
//!   behavior (teleport, sensor, jump, conveyor, switch, pickable, enemy
//!   touch).

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use smallvec::SmallVec;

use crate::components::detectors::{
    CollisionMode, ConveyorBelt, CrystalSwitchBlock, CrystalSwitchState, CustomObstacle, Detector,
    JumpSensor, Sensor, Stairs, Switch, Teletransporter,
};
use crate::components::door::Door;
use crate::components::enemy::Enemy;
use crate::components::entity::{BoundingBox, EntityKind, EntityName, Facing, Layer};
use crate::components::hero::Hero;
use crate::components::movement::Movement;
use crate::components::pickable::Pickable;
use crate::components::sprite::SpriteSet;
use crate::events::audio::AudioCmd;
use crate::events::detector::{DetectorHit, EntityMoved};
use crate::geometry::Point;
use crate::resources::animations::AnimationStore;
use crate::resources::gameclock::GameClock;
use crate::resources::mapentities::MapEntities;
use crate::resources::obstacles::{BlockingRule, ObstacleEntry, ObstacleIndex};

/// Rebuild the obstacle entity index from the per-layer obstacle lists.
pub fn build_obstacle_index(
    mut index: ResMut<ObstacleIndex>,
    entities: Res<MapEntities>,
    crystal_state: Res<CrystalSwitchState>,
    query: Query<(
        &EntityKind,
        &Layer,
        &BoundingBox,
        Option<&Door>,
        Option<&CustomObstacle>,
        Option<&CrystalSwitchBlock>,
        Option<&Movement>,
        Option<&Enemy>,
    )>,
) {
    index.clear();
    for layer in 0..Layer::COUNT {
        for entity in entities.obstacle_entities[layer].iter().copied() {
            let Ok((kind, layer, bounding_box, door, custom, crystal_block, movement, enemy)) =
                query.get(entity)
            else {
                continue;
            };
            let rule = match kind {
                EntityKind::Door => {
                    BlockingRule::DoorClosed(door.is_some_and(|d| d.is_obstacle()))
                }
                EntityKind::Block => BlockingRule::Block {
                    moving: movement.is_some_and(|m| !m.is_finished()),
                },
                EntityKind::CrystalSwitchBlock => {
                    let raised = crystal_block
                        .is_some_and(|block| crystal_state.is_raised(block.color));
                    BlockingRule::CrystalBlock { raised }
                }
                EntityKind::CustomObstacle => {
                    let Some(custom) = custom else { continue };
                    BlockingRule::Custom {
                        stops_hero: custom.stops_hero,
                        stops_enemies: custom.stops_enemies,
                        stops_npcs: custom.stops_npcs,
                        stops_blocks: custom.stops_blocks,
                    }
                }
                EntityKind::Sensor => BlockingRule::Sensor,
                EntityKind::JumpSensor => BlockingRule::JumpSensor,
                EntityKind::Hero => BlockingRule::Hero,
                EntityKind::Chest
                | EntityKind::Destructible
                | EntityKind::Npc
                | EntityKind::ShopItem
                | EntityKind::CrystalSwitch => BlockingRule::Always,
                // disabled enemies do not block either way; enemies never do
                EntityKind::Enemy => {
                    let _ = enemy;
                    continue;
                }
                // detectors that entities walk onto
                _ => continue,
            };
            index.push(ObstacleEntry {
                entity,
                kind: *kind,
                layer: *layer,
                rect: bounding_box.rect,
                rule,
            });
        }
    }
}

/// Pixel-precise overlap of two sprites. Falls back to false when either
/// sprite has no mask for its current animation.
pub fn sprites_pixel_overlap(
    store: &AnimationStore,
    a: (&crate::components::sprite::Sprite, Point),
    b: (&crate::components::sprite::Sprite, Point),
) -> bool {
    let (sprite_a, origin_a) = a;
    let (sprite_b, origin_b) = b;
    let set_a = store.get(&sprite_a.animation_set_id);
    let set_b = store.get(&sprite_b.animation_set_id);
    let anim_a = set_a.animation(&sprite_a.animation);
    let anim_b = set_b.animation(&sprite_b.animation);
    if !anim_a.has_masks(sprite_a.direction) || !anim_b.has_masks(sprite_b.direction) {
        return false;
    }

    // frame top-left corners in map coordinates
    let top_a = Point::new(origin_a.x - anim_a.origin_x, origin_a.y - anim_a.origin_y);
    let top_b = Point::new(origin_b.x - anim_b.origin_x, origin_b.y - anim_b.origin_y);

    let x0 = top_a.x.max(top_b.x);
    let y0 = top_a.y.max(top_b.y);
    let x1 = (top_a.x + anim_a.frame_width).min(top_b.x + anim_b.frame_width);
    let y1 = (top_a.y + anim_a.frame_height).min(top_b.y + anim_b.frame_height);

    for y in y0..y1 {
        for x in x0..x1 {
            if anim_a.pixel(sprite_a.direction, sprite_a.frame, x - top_a.x, y - top_a.y)
                && anim_b.pixel(sprite_b.direction, sprite_b.frame, x - top_b.x, y - top_b.y)
            {
                return true;
            }
        }
    }
    false
}

/// Run the detectors' overlap predicates against the moved entities.
pub fn detector_check(
    mut moved_reader: MessageReader<EntityMoved>,
    entities: Res<MapEntities>,
    animations: Res<AnimationStore>,
    detectors: Query<(&Detector, &EntityKind, &Layer, &BoundingBox)>,
    subjects: Query<(
        &EntityKind,
        &Layer,
        &BoundingBox,
        Option<&Facing>,
        Option<&SpriteSet>,
    )>,
    mut commands: Commands,
) {
    let mut check =
        |detector_entity: Entity, other: Entity, commands: &mut Commands| {
            let Ok((detector, _, detector_layer, detector_box)) = detectors.get(detector_entity)
            else {
                return;
            };
            let Ok((_, layer, bounding_box, facing, sprites)) = subjects.get(other) else {
                return;
            };
            if !detector.layer_ignored && detector_layer != layer {
                return;
            }
            let mut hits: SmallVec<[CollisionMode; 2]> = SmallVec::new();
            for mode in CollisionMode::ALL {
                if !detector.modes.contains(mode.flag()) {
                    continue;
                }
                let overlap = match mode {
                    CollisionMode::Rectangle => detector_box.rect.overlaps(&bounding_box.rect),
                    CollisionMode::OriginPoint => {
                        let origin = bounding_box.origin_point();
                        detector_box.rect.contains(origin.x, origin.y)
                    }
                    CollisionMode::FacingPoint => {
                        let direction = facing.map_or(3, |f| f.direction);
                        let point = bounding_box.facing_point(direction.min(3));
                        detector_box.rect.contains(point.x, point.y)
                    }
                    CollisionMode::Sprite => {
                        let (Ok((_, _, dbox, _, dsprites)), Some(sprites)) =
                            (subjects.get(detector_entity), sprites)
                        else {
                            continue;
                        };
                        match (dsprites.and_then(|s| s.main()), sprites.main()) {
                            (Some(a), Some(b)) => sprites_pixel_overlap(
                                &animations,
                                (a, dbox.origin_point()),
                                (b, bounding_box.origin_point()),
                            ),
                            _ => false,
                        }
                    }
                    CollisionMode::Containing => {
                        detector_box.rect.contains_rectangle(&bounding_box.rect)
                    }
                    CollisionMode::Center => {
                        let center = bounding_box.rect.center();
                        detector_box.rect.contains(center.x, center.y)
                    }
                    CollisionMode::Custom => {
                        // jump sensors and stairs activate on the origin
                        let origin = bounding_box.origin_point();
                        detector_box.rect.contains(origin.x, origin.y)
                    }
                };
                if overlap {
                    hits.push(mode);
                }
            }
            for mode in hits {
                commands.trigger(DetectorHit {
                    detector: detector_entity,
                    other,
                    mode,
                });
            }
        };

    for moved in moved_reader.read() {
        for detector_entity in entities.detectors.iter().copied() {
            if detector_entity != moved.entity {
                check(detector_entity, moved.entity, &mut commands);
            }
        }
        // a moving detector also tests the hero it may have reached
        if let Some(hero) = entities.hero {
            if hero != moved.entity && entities.detectors.contains(&moved.entity) {
                check(moved.entity, hero, &mut commands);
            }
        }
    }
}

/// Everything the detector behaviors may touch.
#[derive(SystemParam)]
pub struct DetectorHitParams<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub clock: Res<'w, GameClock>,
    pub entities: ResMut<'w, MapEntities>,
    pub heroes: Query<'w, 's, &'static mut Hero>,
    pub kinds: Query<'w, 's, &'static EntityKind>,
    pub names: Query<'w, 's, &'static EntityName>,
    pub teletransporters: Query<'w, 's, &'static Teletransporter>,
    pub sensors: Query<'w, 's, &'static mut Sensor>,
    pub jump_sensors: Query<'w, 's, &'static JumpSensor>,
    pub conveyors: Query<'w, 's, &'static ConveyorBelt>,
    pub switches: Query<'w, 's, &'static mut Switch>,
    pub stairs: Query<'w, 's, &'static Stairs>,
    pub pickables: Query<'w, 's, &'static Pickable>,
    pub enemies: Query<'w, 's, &'static Enemy>,
    pub layers: Query<'w, 's, &'static mut Layer>,
    pub boxes: Query<'w, 's, &'static mut BoundingBox>,
    pub animations: Res<'w, AnimationStore>,
    pub audio_cmds: MessageWriter<'w, AudioCmd>,
    pub pending_map_change: ResMut<'w, crate::resources::map::PendingMapChange>,
    pub script_events: ResMut<'w, crate::resources::script::ScriptEventQueue>,
    pub savegame: ResMut<'w, crate::resources::savegame::Savegame>,
    pub item_registry: Res<'w, crate::resources::equipment::ItemRegistry>,
    pub movements: Query<'w, 's, &'static mut Movement>,
    pub facings: Query<'w, 's, &'static mut Facing>,
    pub sprites: Query<'w, 's, &'static mut SpriteSet>,
}

/// Dispatch a detector hit to the kind-specific behavior in
/// `systems::entities`.
pub fn detector_hit_observer(trigger: On<DetectorHit>, params: DetectorHitParams) {
    let hit = *trigger.event();
    crate::systems::entities::dispatch_detector_hit(hit, params);
}
