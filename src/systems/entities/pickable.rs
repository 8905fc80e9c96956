//! Pickable items: pickup, blinking grace period, expiry.

use bevy_ecs::prelude::*;

use crate::components::detectors::CollisionMode;
use crate::components::entity::BeingRemoved;
use crate::components::hero::HeroState;
use crate::components::pickable::{Pickable, PickableSubtype};
use crate::components::sprite::SpriteSet;
use crate::events::audio::AudioCmd;
use crate::events::detector::DetectorHit;
use crate::resources::equipment::Equipment;
use crate::resources::gameclock::{GameClock, GameSuspension};
use crate::resources::mapentities::MapEntities;
use crate::systems::collision::DetectorHitParams;

/// The hero touched a pickable item.
pub fn pickable_hit(hit: &DetectorHit, params: &mut DetectorHitParams) {
    if hit.mode != CollisionMode::Rectangle || params.entities.hero != Some(hit.other) {
        return;
    }
    let now = params.clock.now;
    let Ok(pickable) = params.pickables.get(hit.detector) else {
        return;
    };
    if now < pickable.can_be_picked_date {
        return;
    }
    let Ok(hero) = params.heroes.get(hit.other) else {
        return;
    };
    if matches!(hero.state, HeroState::GameOver { .. }) {
        return;
    }

    let subtype = pickable.subtype.clone();
    let savegame_variable = pickable.savegame_variable;

    let mut equipment = Equipment::new(&mut params.savegame, &params.item_registry);
    match &subtype {
        PickableSubtype::Heart => equipment.add_life(4),
        PickableSubtype::Fairy => equipment.add_life(28),
        PickableSubtype::PieceOfHeart(number) => equipment.add_piece_of_heart(*number),
        PickableSubtype::SmallKey => {
            // outside a dungeon a small key is stored nowhere; the map
            // loader only places them where a counter exists
        }
        _ => {
            if let Some((counter, amount)) = subtype.counter() {
                equipment.add_counter(counter, amount);
            }
        }
    }
    if let Some(variable) = savegame_variable {
        params.savegame.set_boolean(variable, true);
    }
    params.audio_cmds.write(AudioCmd::PlaySound {
        id: subtype.sound().to_string(),
    });
    params.entities.schedule_removal(hit.detector);
    params.commands.entity(hit.detector).insert(BeingRemoved);
}

/// Blink dropped items near their end of life and despawn them on expiry.
pub fn pickable_update(
    clock: Res<GameClock>,
    suspension: Res<GameSuspension>,
    mut entities: ResMut<MapEntities>,
    mut query: Query<(Entity, &Pickable, &mut SpriteSet)>,
    mut commands: Commands,
) {
    if suspension.suspended {
        return;
    }
    let now = clock.now;
    for (entity, pickable, mut sprites) in query.iter_mut() {
        if pickable.blink_date != 0 && now >= pickable.blink_date {
            for sprite in &mut sprites.sprites {
                if !sprite.is_blinking() {
                    sprite.set_blinking(75, now);
                }
            }
        }
        if pickable.disappear_date != 0 && now >= pickable.disappear_date {
            entities.schedule_removal(entity);
            commands.entity(entity).insert(BeingRemoved);
        }
    }
}
