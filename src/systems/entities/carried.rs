//! Thrown items, boomerangs, bombs and explosions.

use bevy_ecs::prelude::*;

use crate::components::carried::{Bomb, Boomerang, CarriedItem, Explosion};
use crate::components::door::{Door, DoorState};
use crate::components::enemy::{Enemy, EnemyLifePhase};
use crate::components::entity::{BeingRemoved, BoundingBox, EntityKind, Facing, Layer, Suspended};
use crate::components::movement::{Movement, MovementKind};
use crate::components::sprite::SpriteSet;
use crate::events::audio::AudioCmd;
use crate::resources::gameclock::{GameClock, GameSuspension};
use crate::resources::mapentities::MapEntities;

/// A thrown item breaks on obstacles, on enemies, or on its own at the end
/// of its arc.
pub fn carried_item_update(
    clock: Res<GameClock>,
    suspension: Res<GameSuspension>,
    mut entities: ResMut<MapEntities>,
    query: Query<(Entity, &CarriedItem, &BoundingBox, &Layer, Option<&Movement>)>,
    mut enemies: Query<(&mut Enemy, &BoundingBox, &Layer), Without<CarriedItem>>,
    mut audio_cmds: MessageWriter<AudioCmd>,
    mut commands: Commands,
) {
    if suspension.suspended {
        return;
    }
    let now = clock.now;
    for (entity, carried, bounding_box, layer, movement) in query.iter() {
        if !carried.thrown {
            continue;
        }
        let mut breaks = carried.break_date != 0 && now >= carried.break_date;
        if let Some(movement) = movement {
            breaks |= movement.stopped_by_obstacle || movement.is_finished();
        }
        // an enemy in the way takes the hit and breaks the item
        for (mut enemy, enemy_box, enemy_layer) in enemies.iter_mut() {
            if enemy_layer == layer
                && enemy.enabled
                && enemy.phase == EnemyLifePhase::Normal
                && enemy_box.rect.overlaps(&bounding_box.rect)
            {
                enemy.life -= carried.damage_on_enemies as i32;
                enemy.phase = if enemy.life <= 0 {
                    EnemyLifePhase::Dying { until: now + 300 }
                } else {
                    EnemyLifePhase::Hurt { until: now + 300 }
                };
                breaks = true;
                break;
            }
        }
        if breaks {
            audio_cmds.write(AudioCmd::PlaySound {
                id: carried.destruction_sound.clone(),
            });
            entities.schedule_removal(entity);
            commands.entity(entity).insert(BeingRemoved);
        }
    }
}

/// The boomerang flies out, turns around, and comes back to the hero.
pub fn boomerang_update(
    clock: Res<GameClock>,
    suspension: Res<GameSuspension>,
    mut entities: ResMut<MapEntities>,
    mut query: Query<(Entity, &mut Boomerang, &BoundingBox, &Layer, &mut Movement)>,
    mut enemies: Query<(&mut Enemy, &BoundingBox, &Layer), Without<Boomerang>>,
    hero_boxes: Query<&BoundingBox, Without<Boomerang>>,
    mut commands: Commands,
) {
    if suspension.suspended {
        return;
    }
    let now = clock.now;
    let Some(hero) = entities.hero else {
        return;
    };
    let mut to_remove: Vec<Entity> = Vec::new();
    for (entity, mut boomerang, bounding_box, layer, mut movement) in query.iter_mut() {
        // hitting an enemy hurts it and recalls the boomerang
        for (mut enemy, enemy_box, enemy_layer) in enemies.iter_mut() {
            if enemy_layer == layer
                && enemy.enabled
                && enemy.phase == EnemyLifePhase::Normal
                && enemy_box.rect.overlaps(&bounding_box.rect)
            {
                enemy.life -= 1;
                enemy.phase = if enemy.life <= 0 {
                    EnemyLifePhase::Dying { until: now + 300 }
                } else {
                    EnemyLifePhase::Hurt { until: now + 300 }
                };
                boomerang.going_back = true;
            }
        }

        if !boomerang.going_back {
            let went_far = movement.is_finished() || movement.stopped_by_obstacle;
            if went_far {
                boomerang.going_back = true;
            }
        }
        if boomerang.going_back {
            let is_tracking = matches!(movement.kind, MovementKind::Target { .. });
            if !is_tracking {
                *movement = Movement::target_entity(hero, boomerang.speed, now);
                movement.ignore_obstacles = true;
            }
            if let Ok(hero_box) = hero_boxes.get(hero) {
                if hero_box.rect.overlaps(&bounding_box.rect) {
                    to_remove.push(entity);
                }
            }
        }
    }
    for entity in to_remove {
        entities.schedule_removal(entity);
        commands.entity(entity).insert(BeingRemoved);
    }
}

/// Bombs turn into explosions when their fuse runs out.
pub fn bomb_update(
    clock: Res<GameClock>,
    suspension: Res<GameSuspension>,
    mut entities: ResMut<MapEntities>,
    query: Query<(Entity, &Bomb, &BoundingBox, &Layer)>,
    mut audio_cmds: MessageWriter<AudioCmd>,
    mut commands: Commands,
) {
    if suspension.suspended {
        return;
    }
    let now = clock.now;
    for (entity, bomb, bounding_box, layer) in query.iter() {
        if now < bomb.explosion_date {
            continue;
        }
        entities.schedule_removal(entity);
        commands.entity(entity).insert(BeingRemoved);

        audio_cmds.write(AudioCmd::PlaySound {
            id: "explosion".into(),
        });
        let center = bounding_box.rect.center();
        let blast = crate::geometry::Rectangle::new(center.x - 24, center.y - 24, 48, 48);
        let explosion = commands
            .spawn((
                EntityKind::Explosion,
                *layer,
                BoundingBox::new(blast, crate::geometry::Point::new(24, 24)),
                Facing::new(0),
                Suspended::default(),
                Explosion::new(now),
                SpriteSet::default(),
            ))
            .id();
        entities.add_entity(explosion, EntityKind::Explosion, *layer, None);
    }
}

/// Explosions hurt enemies, blow weak doors, then vanish.
pub fn explosion_update(
    clock: Res<GameClock>,
    suspension: Res<GameSuspension>,
    mut entities: ResMut<MapEntities>,
    query: Query<(Entity, &Explosion, &BoundingBox, &Layer)>,
    mut enemies: Query<(&mut Enemy, &BoundingBox, &Layer), Without<Explosion>>,
    mut doors: Query<(&mut Door, &BoundingBox, &Layer), (Without<Explosion>, Without<Enemy>)>,
    mut audio_cmds: MessageWriter<AudioCmd>,
    mut commands: Commands,
) {
    if suspension.suspended {
        return;
    }
    let now = clock.now;
    for (entity, explosion, bounding_box, layer) in query.iter() {
        for (mut enemy, enemy_box, enemy_layer) in enemies.iter_mut() {
            if enemy_layer == layer
                && enemy.enabled
                && enemy.phase == EnemyLifePhase::Normal
                && enemy_box.rect.overlaps(&bounding_box.rect)
            {
                enemy.life -= 2;
                enemy.phase = if enemy.life <= 0 {
                    EnemyLifePhase::Dying { until: now + 300 }
                } else {
                    EnemyLifePhase::Hurt { until: now + 300 }
                };
            }
        }
        for (mut door, door_box, door_layer) in doors.iter_mut() {
            if door_layer == layer
                && door.state == DoorState::Closed
                && door.subtype.needs_explosion()
                && door_box.rect.overlaps(&bounding_box.rect)
            {
                door.state = DoorState::Opening;
                audio_cmds.write(AudioCmd::PlaySound {
                    id: "secret".into(),
                });
            }
        }
        if now >= explosion.end_date {
            entities.schedule_removal(entity);
            commands.entity(entity).insert(BeingRemoved);
        }
    }
}
