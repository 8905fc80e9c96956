//! Camera: hero tracking and script-driven moves.

use bevy_ecs::prelude::*;

use crate::components::entity::BoundingBox;
use crate::resources::gameclock::TICK_MS;
use crate::resources::map::{Camera, Map};
use crate::resources::mapentities::MapEntities;
use crate::resources::script::{ScriptEvent, ScriptEventQueue};

/// Center the camera on the hero, clamped to the map bounds, or advance a
/// script-driven camera move.
pub fn camera_update(
    mut map: ResMut<Map>,
    entities: Res<MapEntities>,
    boxes: Query<&BoundingBox>,
    mut script_events: ResMut<ScriptEventQueue>,
) {
    let hero_origin = entities
        .hero
        .and_then(|hero| boxes.get(hero).ok())
        .map(|bounding_box| bounding_box.origin_point());

    let (width, height) = (map.width, map.height);
    let camera = &mut map.camera;

    if camera.is_fixed_on_hero() {
        if let Some(origin) = hero_origin {
            camera.rect.x = origin.x - Camera::WIDTH / 2;
            camera.rect.y = origin.y - Camera::HEIGHT / 2;
        }
    } else {
        let target = match camera.moving_to {
            Some((x, y)) => (x - Camera::WIDTH / 2, y - Camera::HEIGHT / 2),
            None => match hero_origin {
                Some(origin) => (origin.x - Camera::WIDTH / 2, origin.y - Camera::HEIGHT / 2),
                None => (camera.rect.x, camera.rect.y),
            },
        };
        let step = (camera.speed.max(40) * TICK_MS as i32) / 1000;
        let dx = (target.0 - camera.rect.x).clamp(-step, step);
        let dy = (target.1 - camera.rect.y).clamp(-step, step);
        camera.rect.translate(dx, dy);
        if (camera.rect.x, camera.rect.y) == target {
            if camera.moving_to.take().is_some() {
                script_events.push(ScriptEvent::CameraReachedTarget);
            } else if camera.restoring {
                camera.restoring = false;
            }
        }
    }

    camera.rect.x = camera.rect.x.clamp(0, (width - Camera::WIDTH).max(0));
    camera.rect.y = camera.rect.y.clamp(0, (height - Camera::HEIGHT).max(0));
}
