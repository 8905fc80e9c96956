//! Per-kind entity behavior.
//!
//! [`dispatch_detector_hit`] routes a detector collision to the behavior of
//! the detector's kind; the submodules hold the per-tick systems of the
//! kinds that have their own clocks (doors opening, chests popping their
//! treasure, enemies, pickables expiring, thrown items, bombs, dynamic
//! tiles rewriting the grid).

pub mod carried;
pub mod chest;
pub mod door;
pub mod dynamictile;
pub mod enemy;
pub mod pickable;
pub mod switch;

use bevy_ecs::prelude::Entity;

use crate::components::detectors::{CollisionMode, SensorSubtype, StairsSubtype};
use crate::components::enemy::EnemyLifePhase;
use crate::components::entity::{EntityKind, Layer};
use crate::components::hero::HeroState;
use crate::events::audio::AudioCmd;
use crate::events::detector::DetectorHit;
use crate::geometry::DIRECTIONS4;
use crate::resources::equipment::Equipment;
use crate::resources::map::MapChangeRequest;
use crate::resources::script::ScriptEvent;
use crate::systems::collision::DetectorHitParams;
use crate::systems::hero as hero_transitions;

/// Route one detector hit to the detector kind's behavior.
pub fn dispatch_detector_hit(hit: DetectorHit, mut params: DetectorHitParams) {
    let Ok(kind) = params.kinds.get(hit.detector) else {
        return;
    };
    match kind {
        EntityKind::Teletransporter => teletransporter_hit(&hit, &mut params),
        EntityKind::Sensor => sensor_hit(&hit, &mut params),
        EntityKind::JumpSensor => jump_sensor_hit(&hit, &mut params),
        EntityKind::ConveyorBelt => conveyor_hit(&hit, &mut params),
        EntityKind::Switch => switch::switch_hit(&hit, &mut params),
        EntityKind::Stairs => stairs_hit(&hit, &mut params),
        EntityKind::Pickable => pickable::pickable_hit(&hit, &mut params),
        EntityKind::Enemy => enemy_touch(&hit, &mut params),
        _ => {}
    }
}

fn is_hero(params: &DetectorHitParams, entity: Entity) -> bool {
    params.entities.hero == Some(entity)
}

fn teletransporter_hit(hit: &DetectorHit, params: &mut DetectorHitParams) {
    if hit.mode != CollisionMode::OriginPoint || !is_hero(params, hit.other) {
        return;
    }
    let Ok(data) = params.teletransporters.get(hit.detector) else {
        return;
    };
    let Ok(mut hero) = params.heroes.get_mut(hit.other) else {
        return;
    };
    if matches!(hero.state, HeroState::ReturningToSolidGround { .. }) {
        // honored once the recovery and its life loss are done
        hero.delayed_teletransporter = Some(hit.detector);
        return;
    }
    if hero.state.can_avoid_teletransporter() {
        return;
    }
    if params.pending_map_change.0.is_some() {
        return;
    }
    if !data.sound.is_empty() {
        params.audio_cmds.write(AudioCmd::PlaySound {
            id: data.sound.clone(),
        });
    }
    params.pending_map_change.0 = Some(MapChangeRequest {
        map_id: data.destination_map.clone(),
        destination: data.destination_point.clone(),
        style: data.transition,
    });
}

fn sensor_hit(hit: &DetectorHit, params: &mut DetectorHitParams) {
    if hit.mode != CollisionMode::OriginPoint || !is_hero(params, hit.other) {
        return;
    }
    let Ok(hero) = params.heroes.get(hit.other) else {
        return;
    };
    if hero.state.can_avoid_sensor() {
        return;
    }
    let Ok(mut sensor) = params.sensors.get_mut(hit.detector) else {
        return;
    };
    if sensor.activated {
        return;
    }
    sensor.activated = true;
    match sensor.subtype {
        SensorSubtype::Custom => {
            let detector = params
                .names
                .get(hit.detector)
                .map(|n| n.0.clone())
                .unwrap_or_default();
            let entity = params
                .names
                .get(hit.other)
                .map(|n| n.0.clone())
                .unwrap_or_else(|_| "hero".to_string());
            params
                .script_events
                .push(ScriptEvent::EntityOnDetector { detector, entity });
        }
        SensorSubtype::ChangeLayer => {
            let sensor_layer = *params.layers.get(hit.detector).unwrap_or(&Layer::Low);
            let Ok(mut other_layer) = params.layers.get_mut(hit.other) else {
                return;
            };
            if *other_layer != sensor_layer {
                params
                    .entities
                    .set_entity_layer(hit.other, *other_layer, sensor_layer);
                *other_layer = sensor_layer;
            }
        }
        SensorSubtype::ReturnFromBadGround => {
            let Ok(bounding_box) = params.boxes.get(hit.other) else {
                return;
            };
            let layer = *params.layers.get(hit.other).unwrap_or(&Layer::Low);
            let origin = bounding_box.origin_point();
            if let Ok(mut hero) = params.heroes.get_mut(hit.other) {
                hero.target_solid_ground = Some((origin, layer));
            }
        }
    }
}

fn jump_sensor_hit(hit: &DetectorHit, params: &mut DetectorHitParams) {
    if hit.mode != CollisionMode::Custom || !is_hero(params, hit.other) {
        return;
    }
    let Ok(jump_sensor) = params.jump_sensors.get(hit.detector) else {
        return;
    };
    let layer = *params.layers.get(hit.other).unwrap_or(&Layer::Low);
    let Ok(mut hero) = params.heroes.get_mut(hit.other) else {
        return;
    };
    if matches!(hero.state, HeroState::Jumping { .. }) {
        return;
    }
    let Ok(mut sprites) = params.sprites.get_mut(hit.other) else {
        return;
    };
    hero_transitions::start_jumping(
        &mut hero,
        hit.other,
        layer,
        jump_sensor.direction8,
        jump_sensor.jump_length,
        true,
        &mut sprites,
        &params.animations,
        &mut params.commands,
        &mut params.audio_cmds,
        params.clock.now,
    );
}

fn conveyor_hit(hit: &DetectorHit, params: &mut DetectorHitParams) {
    if hit.mode != CollisionMode::Center || !is_hero(params, hit.other) {
        return;
    }
    let Ok(conveyor) = params.conveyors.get(hit.detector) else {
        return;
    };
    let Ok(mut hero) = params.heroes.get_mut(hit.other) else {
        return;
    };
    if hero.state.can_avoid_conveyor_belt() {
        return;
    }
    let direction8 = conveyor.direction8;
    let Ok(mut sprites) = params.sprites.get_mut(hit.other) else {
        return;
    };
    hero_transitions::start_conveyor(
        &mut hero,
        hit.other,
        direction8,
        &mut sprites,
        &params.animations,
        &mut params.commands,
        params.clock.now,
    );
}

fn stairs_hit(hit: &DetectorHit, params: &mut DetectorHitParams) {
    if hit.mode != CollisionMode::OriginPoint || !is_hero(params, hit.other) {
        return;
    }
    let Ok(stairs) = params.stairs.get(hit.detector) else {
        return;
    };
    // inside-floor stairs commit a layer change as the hero crosses them
    if stairs.subtype == StairsSubtype::InsideFloor {
        let stairs_layer = *params.layers.get(hit.detector).unwrap_or(&Layer::Low);
        let target = if stairs.subtype.goes_up() || stairs_layer == Layer::Low {
            Layer::from_index((stairs_layer.index() + 1).min(Layer::COUNT - 1))
        } else {
            stairs_layer
        };
        let Ok(mut hero_layer) = params.layers.get_mut(hit.other) else {
            return;
        };
        if *hero_layer != target {
            params
                .entities
                .set_entity_layer(hit.other, *hero_layer, target);
            *hero_layer = target;
        }
    }
}

fn enemy_touch(hit: &DetectorHit, params: &mut DetectorHitParams) {
    if hit.mode != CollisionMode::Rectangle || !is_hero(params, hit.other) {
        return;
    }
    let now = params.clock.now;
    let Ok(enemy) = params.enemies.get(hit.detector) else {
        return;
    };
    if !enemy.enabled || enemy.phase != EnemyLifePhase::Normal {
        return;
    }
    let attack = enemy.attack;

    let Ok(hero) = params.heroes.get(hit.other) else {
        return;
    };
    if !hero.state.can_be_hurt() || now < hero.invincible_until {
        return;
    }

    let (hero_origin, enemy_origin, hero_facing) = {
        let Ok(hero_box) = params.boxes.get(hit.other) else {
            return;
        };
        let Ok(enemy_box) = params.boxes.get(hit.detector) else {
            return;
        };
        let facing = params
            .facings
            .get(hit.other)
            .map(|f| f.direction)
            .unwrap_or(3);
        (
            hero_box.origin_point(),
            enemy_box.origin_point(),
            facing,
        )
    };

    let mut equipment = Equipment::new(&mut params.savegame, &params.item_registry);

    // the shield blocks attacks coming from the facing direction
    let (fx, fy) = DIRECTIONS4[hero_facing as usize];
    let dx = enemy_origin.x - hero_origin.x;
    let dy = enemy_origin.y - hero_origin.y;
    if equipment.get_shield() > 0 && fx * dx + fy * dy > 0 {
        params.audio_cmds.write(AudioCmd::PlaySound {
            id: "shield".into(),
        });
        return;
    }

    equipment.hurt(attack);
    let life_empty = equipment.get_life() == 0;

    let Ok(mut hero) = params.heroes.get_mut(hit.other) else {
        return;
    };
    let Ok(mut sprites) = params.sprites.get_mut(hit.other) else {
        return;
    };
    hero_transitions::start_hurt(
        &mut hero,
        hit.other,
        enemy_origin,
        hero_origin,
        &mut sprites,
        &params.animations,
        &mut params.commands,
        &mut params.audio_cmds,
        now,
    );
    if life_empty && hero.state.can_start_gameover_sequence() {
        hero_transitions::start_gameover(
            &mut hero,
            hit.other,
            &mut sprites,
            &params.animations,
            &mut params.commands,
            now,
        );
    }
}
