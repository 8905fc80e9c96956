//! Switches and sensors: activation and release.

use bevy_ecs::prelude::*;

use crate::components::detectors::{CollisionMode, Sensor, Switch};
use crate::components::entity::{BoundingBox, EntityKind, Layer};
use crate::events::audio::AudioCmd;
use crate::events::detector::DetectorHit;
use crate::resources::mapentities::MapEntities;
use crate::resources::script::{ScriptEvent, ScriptEventQueue};
use crate::systems::collision::DetectorHitParams;

/// A switch hit by the hero (fully on it) or a block (center on it).
pub fn switch_hit(hit: &DetectorHit, params: &mut DetectorHitParams) {
    let Ok(mut switch) = params.switches.get_mut(hit.detector) else {
        return;
    };
    if switch.enabled || switch.locked {
        return;
    }
    let other_kind = params.kinds.get(hit.other).copied().unwrap_or(EntityKind::Hero);
    let activated = match hit.mode {
        CollisionMode::Containing => other_kind == EntityKind::Hero && !switch.needs_block,
        CollisionMode::Center => other_kind == EntityKind::Block,
        _ => false,
    };
    if !activated {
        return;
    }
    switch.enabled = true;
    params.audio_cmds.write(AudioCmd::PlaySound {
        id: "switch".into(),
    });
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

/// Release switches whose activator left, and re-arm sensors.
pub fn switch_update(
    entities: Res<MapEntities>,
    mut switches: Query<(Entity, &mut Switch, &BoundingBox, &Layer)>,
    mut sensors: Query<(&mut Sensor, &BoundingBox, &Layer)>,
    subjects: Query<(&EntityKind, &BoundingBox, &Layer), (Without<Switch>, Without<Sensor>)>,
    mut audio_cmds: MessageWriter<AudioCmd>,
    mut script_events: ResMut<ScriptEventQueue>,
    names: Query<&crate::components::entity::EntityName>,
) {
    let hero = entities.hero;

    for (switch_entity, mut switch, bounding_box, layer) in switches.iter_mut() {
        if !switch.enabled || switch.locked || !switch.disabled_when_leaving {
            continue;
        }
        let still_pressed = subjects.iter().any(|(kind, other_box, other_layer)| {
            if other_layer != layer {
                return false;
            }
            match kind {
                EntityKind::Hero => bounding_box.rect.contains_rectangle(&other_box.rect),
                EntityKind::Block => {
                    let center = other_box.rect.center();
                    bounding_box.rect.contains(center.x, center.y)
                }
                _ => false,
            }
        });
        if !still_pressed {
            switch.enabled = false;
            audio_cmds.write(AudioCmd::PlaySound {
                id: "switch".into(),
            });
            if let Ok(name) = names.get(switch_entity) {
                script_events.push(ScriptEvent::EntityOnDetector {
                    detector: name.0.clone(),
                    entity: String::new(),
                });
            }
        }
    }

    // a sensor re-arms once the hero is no longer on it
    let hero_state = hero.and_then(|h| subjects.get(h).ok());
    for (mut sensor, bounding_box, layer) in sensors.iter_mut() {
        if !sensor.activated {
            continue;
        }
        let hero_on_it = hero_state.is_some_and(|(_, hero_box, hero_layer)| {
            hero_layer == layer && {
                let origin = hero_box.origin_point();
                bounding_box.rect.contains(origin.x, origin.y)
            }
        });
        if !hero_on_it {
            sensor.activated = false;
        }
    }
}
