//! Script system: event delivery, operation execution, timers.
//!
//! Once per tick, after the world update: queued engine events are
//! delivered to the Lua script in order, `event_update` fires, expired
//! timers call back, and every command the script queued along the way is
//! executed. Commands are atomic engine operations, so a script error can
//! only lose the rest of its own tick.

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use log::warn;

use crate::components::block::Block;
use crate::components::chest::Chest;
use crate::components::detectors::Switch;
use crate::components::door::{Door, DoorState};
use crate::components::enemy::Enemy;
use crate::components::entity::{BeingRemoved, BoundingBox, EntityKind, Facing, Layer};
use crate::components::hero::{Hero, HeroState};
use crate::components::movement::Movement;
use crate::components::sprite::SpriteSet;
use crate::components::tiles::DynamicTile;
use crate::events::audio::AudioCmd;
use crate::resources::animations::AnimationStore;
use crate::resources::dialogbox::{DialogBox, PendingDialogs};
use crate::resources::equipment::TreasureQueue;
use crate::resources::gameclock::{GameClock, GameSuspension};
use crate::resources::map::{Map, MapChangeRequest, PendingMapChange};
use crate::resources::mapentities::MapEntities;
use crate::resources::savegame::Savegame;
use crate::resources::script::{
    GameSnapshot, MapScript, ScriptCmd, ScriptEvent, ScriptEventQueue, ScriptTimer,
};
use crate::resources::transition::TransitionStyle;
use crate::systems::hero as hero_transitions;

/// Engine state the script operations may touch.
#[derive(SystemParam)]
pub struct ScriptExecParams<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub clock: Res<'w, GameClock>,
    pub animations: Res<'w, AnimationStore>,
    pub map: ResMut<'w, Map>,
    pub entities: ResMut<'w, MapEntities>,
    pub savegame: ResMut<'w, Savegame>,
    pub treasures: ResMut<'w, TreasureQueue>,
    pub pending_dialogs: ResMut<'w, PendingDialogs>,
    pub dialog_box: ResMut<'w, DialogBox>,
    pub pending_map_change: ResMut<'w, PendingMapChange>,
    pub audio_cmds: MessageWriter<'w, AudioCmd>,
    pub heroes: Query<'w, 's, (&'static mut Hero, &'static mut SpriteSet), With<Hero>>,
    pub boxes: Query<'w, 's, &'static mut BoundingBox>,
    pub layers: Query<'w, 's, &'static mut Layer>,
    pub facings: Query<'w, 's, &'static mut Facing>,
    pub kinds: Query<'w, 's, &'static EntityKind>,
    pub sprites: Query<'w, 's, &'static mut SpriteSet, Without<Hero>>,
    pub chests: Query<'w, 's, &'static mut Chest>,
    pub doors: Query<'w, 's, &'static mut Door>,
    pub blocks: Query<'w, 's, &'static mut Block>,
    pub enemies: Query<'w, 's, &'static mut Enemy>,
    pub tiles: Query<'w, 's, &'static mut DynamicTile>,
    pub switches: Query<'w, 's, &'static mut Switch>,
}

/// Deliver events, run `event_update`, fire timers, execute commands.
pub fn script_update(
    mut script: NonSendMut<MapScript>,
    mut events: ResMut<ScriptEventQueue>,
    suspension: Res<GameSuspension>,
    mut was_suspended: Local<bool>,
    mut params: ScriptExecParams,
) {
    let now = params.clock.now;

    // refresh the read-only snapshot scripts observe
    let mut snapshot = GameSnapshot::from_savegame(&params.savegame);
    if let Some(hero) = params.entities.hero {
        if let Ok(bounding_box) = params.boxes.get(hero) {
            let origin = bounding_box.origin_point();
            snapshot.hero_x = origin.x;
            snapshot.hero_y = origin.y;
        }
        if let Ok(layer) = params.layers.get(hero) {
            snapshot.hero_layer = layer.index() as u8;
        }
        if let Ok(facing) = params.facings.get(hero) {
            snapshot.hero_direction = facing.direction;
        }
    }
    script.update_snapshot(snapshot);

    // the script's timers follow the game suspension
    if suspension.suspended != *was_suspended {
        *was_suspended = suspension.suspended;
        script.suspended = suspension.suspended;
        for timer in &mut script.timers {
            timer.set_suspended(suspension.suspended, now);
        }
    }

    // deliver the events queued since the last tick, in order
    for event in std::mem::take(&mut events.0) {
        deliver(&script, event);
        for cmd in script.drain_commands() {
            execute(cmd, &mut script, &mut params);
        }
    }

    if !suspension.suspended {
        script.call_event("event_update", ());
        for cmd in script.drain_commands() {
            execute(cmd, &mut script, &mut params);
        }

        // tick-tock sounds, then expired timers call back and die
        let mut sounds = 0;
        for timer in &mut script.timers {
            if timer.sound_due(now) {
                sounds += 1;
            }
        }
        for _ in 0..sounds {
            params.audio_cmds.write(AudioCmd::PlaySound {
                id: "timer".into(),
            });
        }
        let mut fired: Vec<String> = Vec::new();
        script.timers.retain(|timer| {
            if timer.is_finished(now) {
                fired.push(timer.callback.clone());
                false
            } else {
                true
            }
        });
        for callback in fired {
            script.call_event(&callback, ());
            for cmd in script.drain_commands() {
                execute(cmd, &mut script, &mut params);
            }
        }
    }
}

/// Report NPC movements that finished this tick, by name.
pub fn npc_movement_notify(
    query: Query<(
        Entity,
        &EntityKind,
        &crate::components::entity::EntityName,
        &Movement,
    )>,
    mut finished: Local<rustc_hash::FxHashSet<Entity>>,
    mut script_events: ResMut<ScriptEventQueue>,
) {
    for (entity, kind, name, movement) in query.iter() {
        if *kind != EntityKind::Npc {
            continue;
        }
        if movement.is_finished() {
            if finished.insert(entity) {
                script_events.push(ScriptEvent::NpcMovementFinished {
                    name: name.0.clone(),
                });
            }
        } else {
            finished.remove(&entity);
        }
    }
}

fn deliver(script: &MapScript, event: ScriptEvent) {
    match event {
        ScriptEvent::MapStarted { destination } => {
            script.call_event("event_map_started", destination)
        }
        ScriptEvent::MapOpeningTransitionFinished => {
            script.call_event("event_map_opening_transition_finished", ())
        }
        ScriptEvent::MessageStarted { dialog_id } => {
            script.call_event("event_message_started", dialog_id)
        }
        ScriptEvent::DialogStarted { dialog_id } => {
            script.call_event("event_dialog_started", dialog_id)
        }
        ScriptEvent::DialogFinished {
            dialog_id,
            last_answer,
        } => script.call_event("event_dialog_finished", (dialog_id, last_answer)),
        ScriptEvent::EntityOnDetector { detector, entity } => {
            script.call_event("event_entity_on_detector", (detector, entity))
        }
        ScriptEvent::NpcDialog { name } => script.call_event("event_npc_dialog", name),
        ScriptEvent::NpcMovementFinished { name } => {
            script.call_event("event_npc_movement_finished", name)
        }
        ScriptEvent::CameraReachedTarget => script.call_event("event_camera_reached_target", ()),
        ScriptEvent::ItemObtained { item, variant } => {
            script.call_event("event_item_obtained", (item, variant))
        }
        ScriptEvent::ItemUsed { item } => script.call_event("event_item_used", item),
    }
}

/// Execute one atomic engine operation requested by the script.
fn execute(cmd: ScriptCmd, script: &mut MapScript, params: &mut ScriptExecParams) {
    let now = params.clock.now;
    match cmd {
        ScriptCmd::SetCurrentMap {
            map_id,
            destination,
            transition,
        } => {
            params.pending_map_change.0 = Some(MapChangeRequest {
                map_id,
                destination,
                style: TransitionStyle::parse(&transition),
            });
        }
        ScriptCmd::PlaySound { id } => {
            params.audio_cmds.write(AudioCmd::PlaySound { id });
        }
        ScriptCmd::PlayMusic { id } => {
            params.audio_cmds.write(AudioCmd::PlayMusic { id, looped: true });
        }
        ScriptCmd::StopMusic => {
            params.audio_cmds.write(AudioCmd::StopAllMusic);
        }
        ScriptCmd::SetLight { level } => {
            params.map.light = level;
        }
        ScriptCmd::CameraMove { x, y, speed } => {
            params.map.camera.moving_to = Some((x, y));
            params.map.camera.speed = speed;
            params.map.camera.restoring = false;
        }
        ScriptCmd::CameraRestore => {
            params.map.camera.moving_to = None;
            params.map.camera.restoring = true;
        }
        ScriptCmd::HeroFreeze => {
            with_hero(params, |hero, entity, sprites, animations, commands| {
                hero_transitions::freeze(hero, entity, sprites, animations, commands, now);
            });
        }
        ScriptCmd::HeroUnfreeze => {
            with_hero(params, |hero, entity, sprites, animations, commands| {
                hero_transitions::unfreeze(hero, entity, sprites, animations, commands, now);
            });
        }
        ScriptCmd::HeroSetDirection { direction4 } => {
            if let Some(hero) = params.entities.hero {
                if let Ok(mut facing) = params.facings.get_mut(hero) {
                    facing.direction = direction4.clamp(0, 3);
                }
            }
        }
        ScriptCmd::HeroSetPosition { x, y, layer } => {
            if let Some(hero) = params.entities.hero {
                if let Ok(mut bounding_box) = params.boxes.get_mut(hero) {
                    bounding_box.set_origin_position(x, y);
                }
                if let Some(layer_index) = layer {
                    let new_layer = Layer::from_index(layer_index as usize);
                    if let Ok(mut hero_layer) = params.layers.get_mut(hero) {
                        if *hero_layer != new_layer {
                            params.entities.set_entity_layer(hero, *hero_layer, new_layer);
                            *hero_layer = new_layer;
                        }
                    }
                }
            }
        }
        ScriptCmd::HeroAlignOnSensor { name } => {
            let Some(sensor) = params.entities.find_entity(&name) else {
                warn!(target: "script", "no sensor named '{name}'");
                return;
            };
            let sensor_rect = params.boxes.get(sensor).map(|b| b.rect);
            if let (Some(hero), Ok(rect)) = (params.entities.hero, sensor_rect) {
                if let Ok(mut bounding_box) = params.boxes.get_mut(hero) {
                    bounding_box.rect.set_position(rect.x, rect.y);
                }
            }
        }
        ScriptCmd::HeroStartJumping {
            direction8,
            length,
            ignore_obstacles,
        } => {
            let layer = params
                .entities
                .hero
                .and_then(|hero| params.layers.get(hero).ok().copied())
                .unwrap_or(Layer::Low);
            let Some(hero_entity) = params.entities.hero else {
                return;
            };
            let Ok((mut hero, mut sprites)) = params.heroes.get_mut(hero_entity) else {
                return;
            };
            hero_transitions::start_jumping(
                &mut hero,
                hero_entity,
                layer,
                direction8,
                length,
                ignore_obstacles,
                &mut sprites,
                &params.animations,
                &mut params.commands,
                &mut params.audio_cmds,
                now,
            );
        }
        ScriptCmd::HeroStartVictory => {
            with_hero(params, |hero, entity, sprites, animations, commands| {
                hero_transitions::set_state(
                    hero,
                    HeroState::Victory,
                    entity,
                    sprites,
                    animations,
                    commands,
                    now,
                );
            });
        }
        ScriptCmd::HeroStartBoomerang => {
            start_boomerang(params, now);
        }
        ScriptCmd::HeroStartBow => {
            with_hero(params, |hero, entity, sprites, animations, commands| {
                hero_transitions::set_state(
                    hero,
                    HeroState::Bow,
                    entity,
                    sprites,
                    animations,
                    commands,
                    now,
                );
            });
        }
        ScriptCmd::HeroStartRunning => {
            with_hero(params, |hero, entity, sprites, animations, commands| {
                hero_transitions::set_state(
                    hero,
                    HeroState::Running { since: now },
                    entity,
                    sprites,
                    animations,
                    commands,
                    now,
                );
            });
            if let Some(hero_entity) = params.entities.hero {
                params
                    .commands
                    .entity(hero_entity)
                    .insert(Movement::player(Hero::WALKING_SPEED * 2.0, now));
            }
        }
        ScriptCmd::NpcWalk {
            name,
            path,
            loops,
            ignore_obstacles,
        } => {
            if let Some(entity) = find_named(params, &name) {
                let mut movement = Movement::path(&path, 64.0, loops, true, now);
                movement.ignore_obstacles = ignore_obstacles;
                params.commands.entity(entity).insert(movement);
            }
        }
        ScriptCmd::NpcRandomWalk { name } => {
            if let Some(entity) = find_named(params, &name) {
                params
                    .commands
                    .entity(entity)
                    .insert(Movement::random_walk(32.0, now));
            }
        }
        ScriptCmd::NpcJump {
            name,
            direction8,
            length,
            ignore_obstacles,
        } => {
            if let Some(entity) = find_named(params, &name) {
                params
                    .commands
                    .entity(entity)
                    .insert(Movement::jump(direction8, length, 160.0, ignore_obstacles, now));
            }
        }
        ScriptCmd::NpcSetAnimation { name, animation } => {
            if let Some(entity) = find_named(params, &name) {
                if let Ok(mut sprites) = params.sprites.get_mut(entity) {
                    for sprite in &mut sprites.sprites {
                        let Some(set) = params.animations.find(&sprite.animation_set_id) else {
                            continue;
                        };
                        if set.has_animation(&animation) {
                            sprite.set_animation(&animation, now, set);
                        }
                    }
                }
            }
        }
        ScriptCmd::NpcSetDirection { name, direction } => {
            if let Some(entity) = find_named(params, &name) {
                if let Ok(mut facing) = params.facings.get_mut(entity) {
                    facing.direction = direction;
                }
            }
        }
        ScriptCmd::NpcRemove { name } => {
            if let Some(entity) = find_named(params, &name) {
                params.entities.schedule_removal(entity);
                params.commands.entity(entity).insert(BeingRemoved);
            }
        }
        ScriptCmd::ChestSetOpen { name, open } => {
            let entity = params.entities.get_entity(&name);
            if let Ok(mut chest) = params.chests.get_mut(entity) {
                chest.open = open;
            }
        }
        ScriptCmd::ChestSetHidden { name, hidden } => {
            let entity = params.entities.get_entity(&name);
            if let Ok(mut chest) = params.chests.get_mut(entity) {
                chest.hidden = hidden;
            }
        }
        ScriptCmd::TileSetEnabled { name, enabled } => {
            let entity = params.entities.get_entity(&name);
            if let Ok(mut tile) = params.tiles.get_mut(entity) {
                tile.set_enabled(enabled);
            }
        }
        ScriptCmd::TileSetEnabledPrefix { prefix, enabled } => {
            for entity in params.entities.entities_with_prefix(&prefix) {
                if let Ok(mut tile) = params.tiles.get_mut(entity) {
                    tile.set_enabled(enabled);
                }
            }
        }
        ScriptCmd::BlockReset { name } => {
            let entity = params.entities.get_entity(&name);
            reset_block(params, entity);
        }
        ScriptCmd::BlockResetAll => {
            let blocks: Vec<Entity> = params
                .entities
                .all
                .iter()
                .copied()
                .filter(|entity| {
                    params
                        .kinds
                        .get(*entity)
                        .map(|kind| *kind == EntityKind::Block)
                        .unwrap_or(false)
                })
                .collect();
            for entity in blocks {
                reset_block(params, entity);
            }
        }
        ScriptCmd::SwitchSetEnabled { name, enabled } => {
            let entity = params.entities.get_entity(&name);
            if let Ok(mut switch) = params.switches.get_mut(entity) {
                switch.enabled = enabled;
            }
        }
        ScriptCmd::SwitchSetLocked { name, locked } => {
            let entity = params.entities.get_entity(&name);
            if let Ok(mut switch) = params.switches.get_mut(entity) {
                switch.locked = locked;
            }
        }
        ScriptCmd::EnemySetEnabled { name, enabled } => {
            let entity = params.entities.get_entity(&name);
            if let Ok(mut enemy) = params.enemies.get_mut(entity) {
                enemy.enabled = enabled;
            }
        }
        ScriptCmd::BossStartBattle { name } => {
            let entity = params.entities.get_entity(&name);
            params.entities.boss = Some(entity);
            if let Ok(mut enemy) = params.enemies.get_mut(entity) {
                enemy.enabled = true;
            }
            params.audio_cmds.write(AudioCmd::PlayMusic {
                id: "boss".into(),
                looped: true,
            });
        }
        ScriptCmd::BossEndBattle => {
            params.entities.boss = None;
            params.audio_cmds.write(AudioCmd::PlayMusic {
                id: "victory".into(),
                looped: false,
            });
        }
        ScriptCmd::MinibossStartBattle { name } => {
            let entity = params.entities.get_entity(&name);
            params.entities.miniboss = Some(entity);
            if let Ok(mut enemy) = params.enemies.get_mut(entity) {
                enemy.enabled = true;
            }
            params.audio_cmds.write(AudioCmd::PlayMusic {
                id: "boss".into(),
                looped: true,
            });
        }
        ScriptCmd::MinibossEndBattle => {
            params.entities.miniboss = None;
            params.audio_cmds.write(AudioCmd::PlayMusic {
                id: params.map.music_id.clone(),
                looped: true,
            });
        }
        ScriptCmd::DoorOpen { prefix } => {
            set_doors_open(params, &prefix, true);
        }
        ScriptCmd::DoorClose { prefix } => {
            set_doors_open(params, &prefix, false);
        }
        ScriptCmd::DoorSetOpen { prefix, open } => {
            // immediate, no animation and no sound
            for entity in params.entities.entities_with_prefix(&prefix) {
                if let Ok(mut door) = params.doors.get_mut(entity) {
                    door.state = if open { DoorState::Open } else { DoorState::Closed };
                }
            }
        }
        ScriptCmd::GiveTreasure {
            item,
            variant,
            savegame_variable,
        } => {
            params.treasures.0.push(crate::resources::mapdata::TreasureData {
                item,
                variant,
                savegame_variable,
            });
        }
        ScriptCmd::DialogStart { id } => {
            params.pending_dialogs.0.push(id);
        }
        ScriptCmd::DialogSetVariable { id, value } => {
            params.dialog_box.set_variable(id, value);
        }
        ScriptCmd::SavegameSetInteger { index, value } => {
            params.savegame.set_integer(index, value);
        }
        ScriptCmd::SavegameSetBoolean { index, value } => {
            params.savegame.set_boolean(index, value);
        }
        ScriptCmd::TimerStart {
            callback,
            duration,
            with_sound,
        } => {
            // one timer per callback name; restarting replaces it
            script.timers.retain(|timer| timer.callback != callback);
            let mut timer = ScriptTimer::new(callback, duration, with_sound, now);
            if script.suspended {
                timer.set_suspended(true, now);
            }
            script.timers.push(timer);
        }
        ScriptCmd::TimerStop { callback } => {
            script.timers.retain(|timer| timer.callback != callback);
        }
    }
}

fn find_named(params: &ScriptExecParams, name: &str) -> Option<Entity> {
    let found = params.entities.find_entity(name);
    if found.is_none() {
        warn!(target: "script", "no entity named '{name}'");
    }
    found
}

fn with_hero(
    params: &mut ScriptExecParams,
    f: impl FnOnce(&mut Hero, Entity, &mut SpriteSet, &AnimationStore, &mut Commands),
) {
    let Some(hero_entity) = params.entities.hero else {
        return;
    };
    let Ok((mut hero, mut sprites)) = params.heroes.get_mut(hero_entity) else {
        return;
    };
    f(
        &mut hero,
        hero_entity,
        &mut sprites,
        &params.animations,
        &mut params.commands,
    );
}

fn reset_block(params: &mut ScriptExecParams, entity: Entity) {
    if let Ok(mut block) = params.blocks.get_mut(entity) {
        block.reset();
        let initial = block.initial_position;
        if let Ok(mut bounding_box) = params.boxes.get_mut(entity) {
            bounding_box.rect.set_position(initial.x, initial.y);
        }
    }
}

/// Open or close a whole batch of doors; one sound per batch.
fn set_doors_open(params: &mut ScriptExecParams, prefix: &str, open: bool) {
    let mut any = false;
    for entity in params.entities.entities_with_prefix(prefix) {
        let Ok(mut door) = params.doors.get_mut(entity) else {
            continue;
        };
        match (open, door.state) {
            (true, DoorState::Closed) | (true, DoorState::Closing) => {
                door.state = DoorState::Opening;
                any = true;
            }
            (false, DoorState::Open) | (false, DoorState::Opening) => {
                door.state = DoorState::Closing;
                any = true;
            }
            _ => {}
        }
        if let Ok(mut sprites) = params.sprites.get_mut(entity) {
            if let Some(sprite) = sprites.main_mut() {
                if let Some(set) = params.animations.find(&sprite.animation_set_id) {
                    let animation = if open { "opening" } else { "closing" };
                    if set.has_animation(animation) {
                        sprite.set_animation(animation, params.clock.now, set);
                    }
                }
            }
        }
    }
    if any {
        params.audio_cmds.write(AudioCmd::PlaySound {
            id: if open {
                "door_open".into()
            } else {
                "door_closed".into()
            },
        });
    }
}

/// Spawn the hero's boomerang and enter the throwing state.
fn start_boomerang(params: &mut ScriptExecParams, now: u32) {
    let Some(hero_entity) = params.entities.hero else {
        return;
    };
    let (origin, layer, direction4) = {
        let Ok(bounding_box) = params.boxes.get(hero_entity) else {
            return;
        };
        let layer = params.layers.get(hero_entity).copied().unwrap_or(Layer::Low);
        let direction = params
            .facings
            .get(hero_entity)
            .map(|f| f.direction)
            .unwrap_or(3);
        (bounding_box.rect, layer, direction)
    };
    with_hero(params, |hero, entity, sprites, animations, commands| {
        hero_transitions::set_state(
            hero,
            HeroState::Boomerang,
            entity,
            sprites,
            animations,
            commands,
            now,
        );
    });
    let boomerang = crate::components::carried::Boomerang::new(direction4 * 2);
    let (dx, dy) = crate::geometry::DIRECTIONS4[direction4 as usize];
    let movement = Movement::straight(
        boomerang.speed * dx as f32,
        boomerang.speed * dy as f32,
        boomerang.max_distance,
        now,
    );
    let entity = params
        .commands
        .spawn((
            EntityKind::Boomerang,
            layer,
            BoundingBox::new(origin, crate::geometry::Point::new(8, 8)),
            Facing::new(direction4),
            crate::components::entity::Suspended::default(),
            boomerang,
            movement,
            SpriteSet::default(),
        ))
        .id();
    params.entities.add_entity(entity, EntityKind::Boomerang, layer, None);
}
