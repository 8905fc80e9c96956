//! Game orchestrator.
//!
//! The systems here implement the per-tick phases that tie the engine
//! together: routing logical keys to the active layer (pause > dialog >
//! hero), computing the game suspension flag, handing treasures to the
//! hero, and watching for the game-over condition. Map changes and
//! transitions are driven from the main loop through
//! [`process_map_change`] and [`start_game`], which need exclusive world
//! access.

use bevy_ecs::prelude::*;
use log::info;

use crate::components::entity::BeingRemoved;
use crate::components::hero::{GameOverPhase, Hero, HeroState};
use crate::components::sprite::SpriteSet;
use crate::events::audio::AudioCmd;
use crate::events::input::{DialogKeyMessage, GameKeyMessage, HeroKeyMessage, PauseKeyMessage};
use crate::resources::animations::AnimationStore;
use crate::resources::controls::GameKey;
use crate::resources::dialogbox::{DialogBox, PendingDialogs};
use crate::resources::dialogs::DialogStore;
use crate::resources::equipment::{Equipment, ItemRegistry, TreasureQueue};
use crate::resources::gameclock::{GameClock, GameSuspension};
use crate::resources::keyseffect::KeysEffect;
use crate::resources::map::PendingMapChange;
use crate::resources::mapdata::MapStore;
use crate::resources::mapentities::MapEntities;
use crate::resources::pause::PauseMenu;
use crate::resources::savegame::{Savegame, strings};
use crate::resources::script::{MapScript, ScriptEvent, ScriptEventQueue};
use crate::resources::transition::{
    CurrentTransition, Transition, TransitionDirection, TransitionStyle,
};
use crate::systems::hero::set_state;
use crate::systems::pause;

/// How long a treasure is brandished when it has no dialog.
const TREASURE_DURATION: u32 = 2000;

/// Pending silent-treasure completion date, when the current treasure has
/// no dialog to close it.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct TreasureTimer(pub Option<u32>);

/// Route this tick's logical key events to the active input layer.
pub fn route_keys(
    mut reader: MessageReader<GameKeyMessage>,
    mut pause: ResMut<PauseMenu>,
    savegame: Res<Savegame>,
    dialog_box: Res<DialogBox>,
    keys_effect: Res<KeysEffect>,
    transition: Res<CurrentTransition>,
    mut pause_writer: MessageWriter<PauseKeyMessage>,
    mut dialog_writer: MessageWriter<DialogKeyMessage>,
    mut hero_writer: MessageWriter<HeroKeyMessage>,
    mut audio_cmds: MessageWriter<AudioCmd>,
) {
    for message in reader.read() {
        let GameKeyMessage { key, pressed } = *message;
        if pause.open {
            pause_writer.write(PauseKeyMessage { key, pressed });
        } else if dialog_box.is_enabled() {
            dialog_writer.write(DialogKeyMessage { key, pressed });
        } else if key == GameKey::Pause
            && pressed
            && keys_effect.pause_enabled
            && transition.0.is_none()
        {
            pause::open(&mut pause, &savegame);
            audio_cmds.write(AudioCmd::PlaySound {
                id: "pause_open".into(),
            });
        } else {
            hero_writer.write(HeroKeyMessage { key, pressed });
        }
    }
}

/// The game is suspended while any overlay or sequence owns the tick.
pub fn update_suspension(
    pause: Res<PauseMenu>,
    dialog_box: Res<DialogBox>,
    transition: Res<CurrentTransition>,
    entities: Res<MapEntities>,
    heroes: Query<&Hero>,
    mut suspension: ResMut<GameSuspension>,
) {
    let hero_sequence = entities
        .hero
        .and_then(|hero| heroes.get(hero).ok())
        .map(|hero| {
            matches!(
                hero.state,
                HeroState::BrandishingTreasure { .. }
                    | HeroState::GameOver {
                        phase: GameOverPhase::Menu
                    }
            )
        })
        .unwrap_or(false);
    suspension.suspended =
        pause.open || dialog_box.is_enabled() || transition.0.is_some() || hero_sequence;
}

/// Hand queued treasures to the hero, one at a time.
pub fn treasure_update(
    clock: Res<GameClock>,
    mut treasures: ResMut<TreasureQueue>,
    mut treasure_timer: ResMut<TreasureTimer>,
    dialogs: Res<DialogStore>,
    mut pending_dialogs: ResMut<PendingDialogs>,
    mut savegame: ResMut<Savegame>,
    item_registry: Res<ItemRegistry>,
    animations: Res<AnimationStore>,
    entities: Res<MapEntities>,
    mut script_events: ResMut<ScriptEventQueue>,
    mut heroes: Query<(&mut Hero, &mut SpriteSet)>,
    mut audio_cmds: MessageWriter<AudioCmd>,
    mut commands: Commands,
) {
    let now = clock.now;
    let Some(hero_entity) = entities.hero else {
        return;
    };
    let Ok((mut hero, mut sprites)) = heroes.get_mut(hero_entity) else {
        return;
    };

    // finish a silent brandish when its timer elapses
    if let Some(end_date) = treasure_timer.0 {
        if now >= end_date {
            treasure_timer.0 = None;
            if let HeroState::BrandishingTreasure { treasure } = &hero.state {
                let treasure = treasure.clone();
                let mut equipment = Equipment::new(&mut savegame, &item_registry);
                if item_registry.find(&treasure.item).is_some() {
                    equipment.set_item_variant(&treasure.item, treasure.variant);
                }
                if let Some(variable) = treasure.savegame_variable {
                    savegame.set_boolean(variable, true);
                }
                script_events.push(ScriptEvent::ItemObtained {
                    item: treasure.item.clone(),
                    variant: treasure.variant,
                });
                set_state(
                    &mut hero,
                    HeroState::Free,
                    hero_entity,
                    &mut sprites,
                    &animations,
                    &mut commands,
                    now,
                );
            }
        }
        return;
    }

    if matches!(hero.state, HeroState::BrandishingTreasure { .. }) || treasures.0.is_empty() {
        return;
    }
    let treasure = treasures.0.remove(0);
    let dialog_id = format!("_treasure.{}.{}", treasure.item, treasure.variant);
    let has_dialog = dialogs.has(&dialog_id);
    crate::systems::hero::start_treasure(
        &mut hero,
        hero_entity,
        treasure,
        &mut sprites,
        &animations,
        &mut commands,
        &mut audio_cmds,
        now,
    );
    if has_dialog {
        pending_dialogs.0.push(dialog_id);
    } else {
        treasure_timer.0 = Some(now + TREASURE_DURATION);
    }
}

/// Watch the life total and trigger the game-over sequence.
pub fn gameover_check(
    clock: Res<GameClock>,
    mut savegame: ResMut<Savegame>,
    item_registry: Res<ItemRegistry>,
    animations: Res<AnimationStore>,
    entities: Res<MapEntities>,
    mut heroes: Query<(&mut Hero, &mut SpriteSet)>,
    mut audio_cmds: MessageWriter<AudioCmd>,
    mut commands: Commands,
) {
    let Some(hero_entity) = entities.hero else {
        return;
    };
    let Ok((mut hero, mut sprites)) = heroes.get_mut(hero_entity) else {
        return;
    };
    if matches!(hero.state, HeroState::GameOver { .. }) {
        return;
    }
    let equipment = Equipment::new(&mut savegame, &item_registry);
    if equipment.get_life() == 0 && hero.state.can_start_gameover_sequence() {
        info!("life exhausted, starting the game-over sequence");
        audio_cmds.write(AudioCmd::StopAllMusic);
        audio_cmds.write(AudioCmd::PlaySound {
            id: "game_over".into(),
        });
        crate::systems::hero::start_gameover(
            &mut hero,
            hero_entity,
            &mut sprites,
            &animations,
            &mut commands,
            clock.now,
        );
    }
}

/// Start a fresh game: load the starting map from the savegame and play
/// the opening transition.
pub fn start_game(world: &mut World) -> anyhow::Result<()> {
    let (map_id, destination) = {
        let savegame = world.resource::<Savegame>();
        let map_id = savegame.get_reserved_string(strings::STARTING_MAP).to_string();
        let destination = savegame
            .get_reserved_string(strings::STARTING_POINT)
            .to_string();
        let map_id = if map_id.is_empty() {
            "start".to_string()
        } else {
            map_id
        };
        (map_id, destination)
    };
    switch_map(world, &map_id, &destination)?;
    let now = world.resource::<GameClock>().now;
    world.resource_mut::<CurrentTransition>().0 = Some(Transition::start(
        TransitionStyle::Fade,
        TransitionDirection::In,
        now,
    ));
    Ok(())
}

/// Tear the old map down and bring the new one up.
fn switch_map(world: &mut World, map_id: &str, destination: &str) -> anyhow::Result<()> {
    // the previous map's entities go away, hero excepted
    if let Some(entities) = world.remove_resource::<MapEntities>() {
        for entity in entities.all {
            if Some(entity) == entities.hero {
                continue;
            }
            if let Ok(entity_mut) = world.get_entity_mut(entity) {
                entity_mut.despawn();
            }
        }
    }

    let data = {
        let store = world.resource::<MapStore>();
        store.get_map(map_id).clone()
    };
    crate::systems::maploader::load_map(world, &data, destination)?;

    // a fresh script owns the new map; its timers died with the old one
    let script = MapScript::new()?;
    if let Some(source) = world
        .resource::<MapStore>()
        .find_script(map_id)
        .map(str::to_string)
    {
        if let Err(e) = script.load_source(map_id, &source) {
            log::error!(target: "script", "failed to load script of map '{map_id}': {e}");
        }
    }
    world.insert_non_send_resource(script);

    world
        .resource_mut::<ScriptEventQueue>()
        .push(ScriptEvent::MapStarted {
            destination: destination.to_string(),
        });

    Ok(())
}

/// Drive pending map changes and the transition state machine. Runs from
/// the main loop between schedule runs.
pub fn process_map_change(world: &mut World) -> anyhow::Result<()> {
    let now = world.resource::<GameClock>().now;

    // a requested change starts the OUT transition
    let wants_change = world.resource::<PendingMapChange>().0.is_some();
    let transition = world.resource::<CurrentTransition>().0.clone();
    match transition {
        None if wants_change => {
            let style = world
                .resource::<PendingMapChange>()
                .0
                .as_ref()
                .map(|request| request.style)
                .unwrap_or_default();
            world.resource_mut::<CurrentTransition>().0 = Some(Transition::start(
                style,
                TransitionDirection::Out,
                now,
            ));
        }
        Some(transition) if transition.is_finished(now) => match transition.direction {
            TransitionDirection::Out => {
                let Some(request) = world.resource_mut::<PendingMapChange>().0.take() else {
                    // an OUT transition without a destination unwinds to
                    // the title screen (exit/reset requests)
                    world.resource_mut::<CurrentTransition>().0 = None;
                    return Ok(());
                };
                switch_map(world, &request.map_id, &request.destination)?;
                world.resource_mut::<CurrentTransition>().0 = Some(Transition::start(
                    request.style,
                    TransitionDirection::In,
                    now,
                ));
            }
            TransitionDirection::In => {
                world.resource_mut::<CurrentTransition>().0 = None;
                world
                    .resource_mut::<ScriptEventQueue>()
                    .push(ScriptEvent::MapOpeningTransitionFinished);
            }
        },
        _ => {}
    }
    Ok(())
}

/// Arm sensor-style entities for removal sweeps scheduled by commands from
/// the observers; keeps `BeingRemoved` and the removal queue coherent when
/// scripts remove entities that were never in the queue.
pub fn removal_guard(
    mut entities: ResMut<MapEntities>,
    removed: Query<Entity, With<BeingRemoved>>,
) {
    for entity in removed.iter() {
        entities.schedule_removal(entity);
    }
}
