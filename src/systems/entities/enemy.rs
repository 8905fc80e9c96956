//! Enemies: hurt and dying phases, drops, saved kills.

use bevy_ecs::prelude::*;

use crate::components::enemy::{Enemy, EnemyLifePhase, EnemyRank};
use crate::components::entity::{BeingRemoved, BoundingBox, EntityKind, Facing, Layer, Suspended};
use crate::components::pickable::{Pickable, PickableSubtype};
use crate::components::sprite::SpriteSet;
use crate::events::audio::AudioCmd;
use crate::resources::gameclock::{GameClock, GameSuspension};
use crate::resources::mapentities::MapEntities;
use crate::resources::savegame::Savegame;
use crate::resources::script::{ScriptEvent, ScriptEventQueue};

/// Advance enemy life phases; a dead enemy drops its treasure and is
/// removed, remembering the kill when it has a saved flag.
pub fn enemy_update(
    clock: Res<GameClock>,
    suspension: Res<GameSuspension>,
    mut entities: ResMut<MapEntities>,
    mut savegame: ResMut<Savegame>,
    mut script_events: ResMut<ScriptEventQueue>,
    mut query: Query<(Entity, &mut Enemy, &BoundingBox, &Layer, Option<&mut SpriteSet>)>,
    names: Query<&crate::components::entity::EntityName>,
    mut audio_cmds: MessageWriter<AudioCmd>,
    mut commands: Commands,
) {
    if suspension.suspended {
        return;
    }
    let now = clock.now;
    for (entity, mut enemy, bounding_box, layer, sprites) in query.iter_mut() {
        if !enemy.enabled {
            continue;
        }
        match enemy.phase {
            EnemyLifePhase::Hurt { until } | EnemyLifePhase::Immobilized { until }
                if now >= until =>
            {
                enemy.phase = EnemyLifePhase::Normal;
                if let Some(mut sprites) = sprites {
                    for sprite in &mut sprites.sprites {
                        sprite.set_blinking(0, now);
                    }
                }
            }
            EnemyLifePhase::Dying { until } if now >= until => {
                audio_cmds.write(AudioCmd::PlaySound {
                    id: "enemy_killed".into(),
                });
                if let Some(variable) = enemy.savegame_variable {
                    savegame.set_boolean(variable, true);
                }
                if let Some(treasure) = enemy.treasure.take() {
                    let subtype = PickableSubtype::parse(&treasure.item);
                    let drop = commands
                        .spawn((
                            EntityKind::Pickable,
                            *layer,
                            BoundingBox::new(bounding_box.rect, bounding_box.origin),
                            Facing::new(0),
                            Suspended::default(),
                            crate::components::detectors::Detector::new(
                                crate::components::detectors::CollisionModes::RECTANGLE,
                            ),
                            Pickable::dropped(subtype, now),
                            crate::components::movement::Movement::falling_on_floor(1, now),
                            SpriteSet::default(),
                        ))
                        .id();
                    entities.add_entity(drop, EntityKind::Pickable, *layer, None);
                }
                if enemy.rank != EnemyRank::Normal {
                    // boss and miniboss deaths are script-visible
                    if let Ok(name) = names.get(entity) {
                        script_events.push(ScriptEvent::EntityOnDetector {
                            detector: name.0.clone(),
                            entity: "dead".to_string(),
                        });
                    }
                }
                entities.schedule_removal(entity);
                commands.entity(entity).insert(BeingRemoved);
            }
            _ => {}
        }
    }
}
