//! The hero state machine.
//!
//! One system, [`hero_update`], drives the machine every tick: it consumes
//! the key events routed to the hero, advances the current state's timers,
//! applies ground effects and refreshes the facing entity and the action
//! key effect. Transitions go through [`set_state`], which runs the old
//! state's stop effects strictly before the new state's start effects; no
//! tick ever observes a hero without a state.
//!
//! The detector observer and the script executor reuse the `start_*`
//! helpers from [`transitions`] so walk-on detectors, scripts and the
//! machine agree on the transition rules.

mod transitions;

pub use transitions::*;

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;

use crate::components::block::{BLOCK_MOVE_COOLDOWN, Block, BlockSubtype};
use crate::components::carried::CarriedItem;
use crate::components::chest::Chest;
use crate::components::detectors::Teletransporter;
use crate::components::door::{Door, DoorState, DoorSubtype};
use crate::components::entity::{BoundingBox, EntityKind, EntityName, Facing, Layer, Suspended};
use crate::components::hero::{GameOverPhase, Hero, HeroState};
use crate::components::movement::{Movement, MovementKind};
use crate::components::npc::Npc;
use crate::components::pickable::Destructible;
use crate::components::shopitem::ShopItem;
use crate::components::sprite::SpriteSet;
use crate::events::audio::AudioCmd;
use crate::events::input::HeroKeyMessage;
use crate::geometry::{Point, Rectangle, direction8_to_direction4, opposite_direction4};
use crate::resources::animations::AnimationStore;
use crate::resources::controls::{Controls, GameKey};
use crate::resources::dialogbox::{PendingDialogs, PendingShopPurchase};
use crate::resources::dungeon::Dungeon;
use crate::resources::equipment::{Equipment, ItemRegistry};
use crate::resources::gameclock::{GameClock, GameSuspension};
use crate::resources::gamestate::{GameStates, NextGameState};
use crate::resources::keyseffect::{ActionKeyEffect, KeysEffect, SwordKeyEffect};
use crate::resources::map::{Ground, Map, MapChangeRequest, PendingMapChange};
use crate::resources::mapentities::MapEntities;
use crate::resources::savegame::Savegame;
use crate::resources::script::{ScriptEvent, ScriptEventQueue};

/// Time pushing against an obstacle before the pushing animation starts.
pub const PUSHING_DELAY: u32 = 800;
/// Time holding the sword before it is loaded for a spin attack.
pub const SWORD_LOADING_DELAY: u32 = 1000;
/// Cadence of the sword tapping sound.
const SWORD_TAPPING_SOUND_DELAY: u32 = 100;
/// Duration of the knock-back after being hurt.
pub const HURT_DURATION: u32 = 200;
/// Blinking invincibility after being hurt.
pub const HURT_INVINCIBILITY: u32 = 2000;
/// Distance from solid ground beyond which a hole swallows the hero.
const HOLE_FALL_DISTANCE: i32 = 8;
/// Speed of the forced walk back to solid ground, px/s.
const RETURN_SPEED: f32 = 12.0;

/// Advance the [`HeroKeyMessage`] queue each tick.
pub fn update_hero_key_messages(mut msgs: ResMut<Messages<HeroKeyMessage>>) {
    msgs.update();
}

/// What the facing scan found in front of the hero.
#[derive(Debug, Clone, Copy)]
pub struct FacingTarget {
    pub entity: Entity,
    pub kind: EntityKind,
    pub rect: Rectangle,
}

/// Read-only context of the hero system.
#[derive(SystemParam)]
pub struct HeroCtx<'w> {
    pub clock: Res<'w, GameClock>,
    pub suspension: Res<'w, GameSuspension>,
    pub controls: Res<'w, Controls>,
    pub map: Res<'w, Map>,
    pub animations: Res<'w, AnimationStore>,
    pub item_registry: Res<'w, ItemRegistry>,
    pub dungeon: Option<Res<'w, Dungeon>>,
}

/// Mutable engine state the hero machine touches.
#[derive(SystemParam)]
pub struct HeroWorld<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub keys_effect: ResMut<'w, KeysEffect>,
    pub entities: ResMut<'w, MapEntities>,
    pub savegame: ResMut<'w, Savegame>,
    pub script_events: ResMut<'w, ScriptEventQueue>,
    pub pending_dialogs: ResMut<'w, PendingDialogs>,
    pub pending_shop: ResMut<'w, PendingShopPurchase>,
    pub pending_map_change: ResMut<'w, PendingMapChange>,
    pub next_game_state: ResMut<'w, NextGameState>,
    pub audio_cmds: MessageWriter<'w, AudioCmd>,
    pub chests: Query<'w, 's, &'static mut Chest>,
    pub doors: Query<'w, 's, &'static mut Door>,
    pub npcs: Query<'w, 's, &'static Npc>,
    pub destructibles: Query<'w, 's, &'static Destructible>,
    pub blocks: Query<'w, 's, &'static mut Block>,
    pub shop_items: Query<'w, 's, &'static ShopItem>,
    pub teletransporters: Query<'w, 's, &'static Teletransporter>,
    pub names: Query<'w, 's, &'static EntityName>,
    pub movements: Query<'w, 's, &'static mut Movement, Without<Hero>>,
    pub carried_items: Query<'w, 's, &'static mut CarriedItem>,
}

type HeroQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static mut Hero,
        &'static mut BoundingBox,
        &'static mut Facing,
        &'static mut Layer,
        &'static mut SpriteSet,
        Option<&'static mut Movement>,
    ),
>;
type ScanQuery<'w, 's> = Query<'w, 's, (Entity, &'static EntityKind, &'static BoundingBox, &'static Layer)>;

/// Per-tick update of the hero.
pub fn hero_update(
    ctx: HeroCtx,
    mut world: HeroWorld,
    mut key_reader: MessageReader<HeroKeyMessage>,
    mut queries: ParamSet<(HeroQuery<'_, '_>, ScanQuery<'_, '_>)>,
) {
    let now = ctx.clock.now;
    let Some(hero_entity) = world.entities.hero else {
        return;
    };

    // facing scan snapshot, taken before the mutable hero borrow
    let (hero_rect, hero_layer, hero_direction) = {
        let p0 = queries.p0();
        let Ok((_, _, bounding_box, facing, layer, _, _)) = p0.get(hero_entity) else {
            return;
        };
        (bounding_box.rect, *layer, facing.direction)
    };
    let facing_box = BoundingBox::new(hero_rect, Point::new(Hero::ORIGIN_X, Hero::ORIGIN_Y));
    let facing_point = facing_box.facing_point(hero_direction);
    let facing_target = queries
        .p1()
        .iter()
        .filter(|(entity, kind, bounding_box, layer)| {
            *entity != hero_entity
                && **layer == hero_layer
                && matches!(
                    kind,
                    EntityKind::Chest
                        | EntityKind::Npc
                        | EntityKind::Destructible
                        | EntityKind::Block
                        | EntityKind::ShopItem
                        | EntityKind::Door
                )
                && bounding_box.rect.contains(facing_point.x, facing_point.y)
        })
        .map(|(entity, kind, bounding_box, _)| FacingTarget {
            entity,
            kind: *kind,
            rect: bounding_box.rect,
        })
        .next();

    let mut p0 = queries.p0();
    let Ok((_, mut hero, mut bounding_box, mut facing, mut layer, mut sprites, mut movement)) =
        p0.get_mut(hero_entity)
    else {
        return;
    };

    hero.facing_entity = facing_target.map(|t| t.entity);

    if ctx.suspension.suspended {
        // drain routed keys; overlay-driven states end elsewhere
        key_reader.read();
        return;
    }

    let keys: Vec<HeroKeyMessage> = key_reader.read().copied().collect();
    for key in &keys {
        handle_key(
            key,
            &ctx,
            &mut world,
            hero_entity,
            &mut hero,
            &bounding_box,
            &facing,
            *layer,
            &mut sprites,
            facing_target,
            now,
        );
    }

    // wanted direction feeds the player movement; facing follows
    let wanted = ctx.controls.get_wanted_direction8();
    if let Some(movement) = movement.as_deref_mut() {
        if let MovementKind::Player { direction8, .. } = &mut movement.kind {
            if hero.state.is_free_to_move() {
                *direction8 = wanted;
            }
        }
    }
    if wanted != -1 && !hero.state.is_direction_locked() && hero.state.is_free_to_move() {
        facing.direction = direction8_to_direction4(wanted);
    }

    advance_state(
        &ctx,
        &mut world,
        hero_entity,
        &mut hero,
        &mut bounding_box,
        &mut facing,
        &mut layer,
        &mut sprites,
        movement.as_deref(),
        facing_target,
        wanted,
        now,
    );

    if hero.state.is_touching_ground() {
        apply_ground(
            &ctx,
            &mut world,
            hero_entity,
            &mut hero,
            &mut bounding_box,
            &mut layer,
            &mut sprites,
            now,
        );
    }

    // stop blinking when the invincibility window closes
    if hero.invincible_until != 0 && now >= hero.invincible_until {
        hero.invincible_until = 0;
        for sprite in &mut sprites.sprites {
            sprite.set_blinking(0, now);
        }
    }

    refresh_animation(&ctx, &hero, &mut sprites, &facing, wanted, now);
    refresh_keys_effect(&ctx, &mut world, &hero, facing_target);
}

/// React to one routed key event.
fn handle_key(
    key: &HeroKeyMessage,
    ctx: &HeroCtx,
    world: &mut HeroWorld,
    hero_entity: Entity,
    hero: &mut Hero,
    bounding_box: &BoundingBox,
    facing: &Facing,
    layer: Layer,
    sprites: &mut SpriteSet,
    facing_target: Option<FacingTarget>,
    now: u32,
) {
    match (key.key, key.pressed) {
        (GameKey::Action, true) => action_key_pressed(
            ctx,
            world,
            hero_entity,
            hero,
            facing,
            layer,
            sprites,
            facing_target,
            now,
        ),
        (GameKey::Action, false) => {
            if hero.state.is_grabbing_or_pulling() {
                hero.grabbed_entity = None;
                set_state(
                    hero,
                    HeroState::Free,
                    hero_entity,
                    sprites,
                    &ctx.animations,
                    &mut world.commands,
                    now,
                );
            }
        }
        (GameKey::Sword, true) => sword_key_pressed(
            ctx,
            world,
            hero_entity,
            hero,
            bounding_box,
            facing,
            sprites,
            now,
        ),
        (GameKey::Sword, false) => {
            if let HeroState::SwordLoading { loaded, .. } = hero.state {
                let next = if loaded {
                    world.audio_cmds.write(AudioCmd::PlaySound {
                        id: "sword_spin_attack_release".into(),
                    });
                    HeroState::SpinAttack
                } else {
                    HeroState::Free
                };
                set_state(
                    hero,
                    next,
                    hero_entity,
                    sprites,
                    &ctx.animations,
                    &mut world.commands,
                    now,
                );
            }
        }
        (GameKey::Item1, true) | (GameKey::Item2, true) => {
            if !world.keys_effect.item_keys_enabled || !hero.state.can_start_item() {
                return;
            }
            let slot = if key.key == GameKey::Item1 { 0 } else { 1 };
            let mut equipment = Equipment::new(&mut world.savegame, &ctx.item_registry);
            if let Some(item) = equipment.get_item_assigned(slot) {
                let item = item.to_string();
                world
                    .script_events
                    .push(ScriptEvent::ItemUsed { item: item.clone() });
                set_state(
                    hero,
                    HeroState::UsingInventoryItem { item },
                    hero_entity,
                    sprites,
                    &ctx.animations,
                    &mut world.commands,
                    now,
                );
            }
        }
        _ => {}
    }
}

/// The action key, dispatched on its current effect.
fn action_key_pressed(
    ctx: &HeroCtx,
    world: &mut HeroWorld,
    hero_entity: Entity,
    hero: &mut Hero,
    facing: &Facing,
    layer: Layer,
    sprites: &mut SpriteSet,
    facing_target: Option<FacingTarget>,
    now: u32,
) {
    if !world.keys_effect.action_enabled {
        return;
    }
    let Some(target) = facing_target else {
        return;
    };
    match world.keys_effect.action {
        ActionKeyEffect::Open => match target.kind {
            EntityKind::Chest => open_chest(ctx, world, target.entity, now),
            EntityKind::Door => try_open_door(ctx, world, target.entity),
            _ => {}
        },
        ActionKeyEffect::Lift => {
            if target.kind == EntityKind::Destructible {
                lift_destructible(ctx, world, hero_entity, hero, target, layer, sprites, now);
            }
        }
        ActionKeyEffect::Speak => {
            if target.kind == EntityKind::Npc {
                if let Ok(npc) = world.npcs.get(target.entity) {
                    match &npc.message {
                        Some(message) => world.pending_dialogs.0.push(message.clone()),
                        None => {
                            if let Ok(name) = world.names.get(target.entity) {
                                world
                                    .script_events
                                    .push(ScriptEvent::NpcDialog { name: name.0.clone() });
                            }
                        }
                    }
                }
            }
        }
        ActionKeyEffect::Look => {
            if target.kind == EntityKind::ShopItem {
                if let Ok(shop_item) = world.shop_items.get(target.entity) {
                    world.pending_dialogs.0.push(shop_item.message.clone());
                    world.pending_shop.0 = Some((target.entity, shop_item.message.clone()));
                }
            }
        }
        ActionKeyEffect::Grab => {
            if target.kind == EntityKind::Block && matches!(hero.state, HeroState::Free) {
                hero.grabbed_entity = Some(target.entity);
                set_state(
                    hero,
                    HeroState::Grabbing,
                    hero_entity,
                    sprites,
                    &ctx.animations,
                    &mut world.commands,
                    now,
                );
            }
        }
        _ => {
            let _ = facing;
        }
    }
}

fn open_chest(ctx: &HeroCtx, world: &mut HeroWorld, chest_entity: Entity, now: u32) {
    let Ok(mut chest) = world.chests.get_mut(chest_entity) else {
        return;
    };
    if chest.open || chest.hidden {
        return;
    }
    chest.open = true;
    chest.treasure_date = now + 300;
    world.audio_cmds.write(AudioCmd::PlaySound {
        id: "chest_open".into(),
    });
    let _ = ctx;
}

fn try_open_door(ctx: &HeroCtx, world: &mut HeroWorld, door_entity: Entity) {
    let Ok(mut door) = world.doors.get_mut(door_entity) else {
        return;
    };
    if door.state != DoorState::Closed || !door.subtype.needs_key() {
        return;
    }
    let can_open = match door.subtype {
        DoorSubtype::SmallKey | DoorSubtype::SmallKeyBlock => ctx
            .dungeon
            .as_ref()
            .is_some_and(|dungeon| dungeon.get_small_keys(&world.savegame) > 0),
        DoorSubtype::BigKey => ctx
            .dungeon
            .as_ref()
            .is_some_and(|dungeon| dungeon.has_big_key(&world.savegame)),
        DoorSubtype::BossKey => ctx
            .dungeon
            .as_ref()
            .is_some_and(|dungeon| dungeon.has_boss_key(&world.savegame)),
        _ => false,
    };
    if !can_open {
        world.audio_cmds.write(AudioCmd::PlaySound {
            id: "wrong_key".into(),
        });
        return;
    }
    if matches!(
        door.subtype,
        DoorSubtype::SmallKey | DoorSubtype::SmallKeyBlock
    ) {
        if let Some(dungeon) = ctx.dungeon.as_ref() {
            dungeon.remove_small_key(&mut world.savegame);
        }
    }
    door.state = DoorState::Opening;
    world.audio_cmds.write(AudioCmd::PlaySound {
        id: "door_open".into(),
    });
}

/// Lift a facing destructible: it becomes a carried item above the head.
fn lift_destructible(
    ctx: &HeroCtx,
    world: &mut HeroWorld,
    hero_entity: Entity,
    hero: &mut Hero,
    target: FacingTarget,
    layer: Layer,
    sprites: &mut SpriteSet,
    now: u32,
) {
    let Ok(destructible) = world.destructibles.get(target.entity) else {
        return;
    };
    let mut equipment = Equipment::new(&mut world.savegame, &ctx.item_registry);
    if !destructible.subtype.can_be_lifted()
        || equipment.get_tunic() < destructible.subtype.weight()
    {
        return;
    }
    let sound = destructible.subtype.destruction_sound().to_string();

    // the destructible disappears; a carried item takes its place
    world.entities.schedule_removal(target.entity);
    world
        .commands
        .entity(target.entity)
        .insert(crate::components::entity::BeingRemoved);

    let carried_item = CarriedItem::new(sound);
    let follow = Movement::follow(hero_entity, 0, -carried_item.item_height);
    let carried = world
        .commands
        .spawn((
            EntityKind::CarriedItem,
            layer,
            BoundingBox::new(target.rect, Point::new(8, 13)),
            Facing::new(0),
            Suspended::default(),
            carried_item,
            follow,
            SpriteSet::default(),
        ))
        .id();
    world
        .entities
        .add_entity(carried, EntityKind::CarriedItem, layer, None);
    hero.lifted_item = Some(carried);
    world.audio_cmds.write(AudioCmd::PlaySound { id: "lift".into() });
    set_state(
        hero,
        HeroState::Lifting { lifted: carried },
        hero_entity,
        sprites,
        &ctx.animations,
        &mut world.commands,
        now,
    );
}

/// The sword key: swing, throw a carried item, or validate nothing.
fn sword_key_pressed(
    ctx: &HeroCtx,
    world: &mut HeroWorld,
    hero_entity: Entity,
    hero: &mut Hero,
    bounding_box: &BoundingBox,
    facing: &Facing,
    sprites: &mut SpriteSet,
    now: u32,
) {
    if !world.keys_effect.sword_enabled {
        return;
    }
    let mut equipment = Equipment::new(&mut world.savegame, &ctx.item_registry);
    if matches!(hero.state, HeroState::Carrying) {
        throw_carried_item(world, hero, bounding_box, facing, now);
        set_state(
            hero,
            HeroState::Free,
            hero_entity,
            sprites,
            &ctx.animations,
            &mut world.commands,
            now,
        );
        return;
    }
    if hero.state.can_start_sword() && equipment.has_sword() {
        world.audio_cmds.write(AudioCmd::PlaySound { id: "sword1".into() });
        set_state(
            hero,
            HeroState::SwordSwinging,
            hero_entity,
            sprites,
            &ctx.animations,
            &mut world.commands,
            now,
        );
    }
}

/// Throw the carried item in the facing direction.
fn throw_carried_item(
    world: &mut HeroWorld,
    hero: &mut Hero,
    bounding_box: &BoundingBox,
    facing: &Facing,
    now: u32,
) {
    let Some(carried) = hero.lifted_item.take() else {
        return;
    };
    hero.thrown_item = Some(carried);
    let (dx, dy) = crate::geometry::DIRECTIONS4[facing.direction as usize];
    let speed = 200.0;
    world.commands.entity(carried).insert(Movement::straight(
        speed * dx as f32,
        speed * dy as f32,
        96,
        now,
    ));
    if let Ok(mut carried_item) = world.carried_items.get_mut(carried) {
        carried_item.thrown = true;
        carried_item.break_date = now + 600;
    }
    world.audio_cmds.write(AudioCmd::PlaySound { id: "throw".into() });
    let _ = bounding_box;
}

/// Advance the current state: timers, animation ends, movement outcomes.
fn advance_state(
    ctx: &HeroCtx,
    world: &mut HeroWorld,
    hero_entity: Entity,
    hero: &mut Hero,
    bounding_box: &mut BoundingBox,
    facing: &mut Facing,
    layer: &mut Layer,
    sprites: &mut SpriteSet,
    movement: Option<&Movement>,
    facing_target: Option<FacingTarget>,
    wanted: i32,
    now: u32,
) {
    let main_finished = sprites.main().is_some_and(|s| s.finished);
    let sword_held = ctx.controls.is_key_pressed(GameKey::Sword);
    let movement_blocked = movement.is_some_and(|m| m.stopped_by_obstacle);
    let movement_finished = movement.is_some_and(|m| m.is_finished());

    let mut next: Option<HeroState> = None;
    match &mut hero.state {
        HeroState::Free => {
            // walking into an obstacle long enough starts pushing
            if movement_blocked && wanted != -1 && wanted == facing.direction * 2 {
                let since = *hero.pushing_since.get_or_insert(now);
                if now - since >= PUSHING_DELAY {
                    next = Some(HeroState::Pushing {
                        since: now,
                        moving_block: None,
                    });
                }
            } else {
                hero.pushing_since = None;
            }
        }
        HeroState::SwordSwinging => {
            if main_finished {
                next = Some(if sword_held {
                    HeroState::SwordLoading {
                        since: now,
                        loaded: false,
                    }
                } else {
                    HeroState::Free
                });
            }
        }
        HeroState::SwordLoading { since, loaded } => {
            if !*loaded && now - *since >= SWORD_LOADING_DELAY {
                *loaded = true;
                world.audio_cmds.write(AudioCmd::PlaySound {
                    id: "sword_loading".into(),
                });
            }
            // pushing against a wall while loading taps the sword on it
            if movement_blocked && wanted != -1 && wanted == facing.direction * 2 {
                next = Some(HeroState::SwordTapping {
                    next_sound_date: now,
                });
            }
        }
        HeroState::SwordTapping { next_sound_date } => {
            if now >= *next_sound_date {
                world.audio_cmds.write(AudioCmd::PlaySound {
                    id: "sword_tapping".into(),
                });
                *next_sound_date = now + SWORD_TAPPING_SOUND_DELAY;
            }
            if !movement_blocked || wanted == -1 {
                next = Some(if sword_held {
                    HeroState::SwordLoading {
                        since: now,
                        loaded: false,
                    }
                } else {
                    HeroState::Free
                });
            }
        }
        HeroState::SpinAttack => {
            if main_finished {
                next = Some(HeroState::Free);
            }
        }
        HeroState::Grabbing => {
            // direction keys against the obstacle push, away pull
            if wanted != -1 {
                let direction4 = direction8_to_direction4(wanted);
                if direction4 == facing.direction {
                    next = Some(HeroState::Pushing {
                        since: now,
                        moving_block: None,
                    });
                } else if direction4 == opposite_direction4(facing.direction) {
                    next = Some(HeroState::Pulling);
                }
            }
        }
        HeroState::Pulling => {
            // settle a statue move that finished or got blocked
            if let Some(grabbed) = hero.grabbed_entity {
                let settled = world
                    .movements
                    .get(grabbed)
                    .map(|m| m.is_finished())
                    .unwrap_or(false);
                if settled {
                    let blocked = world
                        .movements
                        .get(grabbed)
                        .map(|m| m.stopped_by_obstacle)
                        .unwrap_or(false);
                    world.commands.entity(grabbed).remove::<Movement>();
                    if let Ok(mut block_data) = world.blocks.get_mut(grabbed) {
                        if !blocked {
                            block_data.consume_move();
                        }
                        block_data.when_can_move = now + BLOCK_MOVE_COOLDOWN;
                    }
                }
            }
            if wanted == -1
                || direction8_to_direction4(wanted) != opposite_direction4(facing.direction)
            {
                next = Some(HeroState::Grabbing);
            } else if let Some(grabbed) = hero.grabbed_entity {
                try_move_grabbed(world, grabbed, opposite_direction4(facing.direction), now);
            }
        }
        HeroState::Pushing { moving_block, .. } => {
            if let Some(block) = *moving_block {
                // the block finished or hit something: settle the move
                let done = world
                    .movements
                    .get(block)
                    .map(|m| m.is_finished())
                    .unwrap_or(true);
                if done {
                    let blocked = world
                        .movements
                        .get(block)
                        .map(|m| m.stopped_by_obstacle)
                        .unwrap_or(false);
                    world.commands.entity(block).remove::<Movement>();
                    if let Ok(mut block_data) = world.blocks.get_mut(block) {
                        if !blocked {
                            block_data.consume_move();
                            world.audio_cmds.write(AudioCmd::PlaySound {
                                id: "hero_pushes".into(),
                            });
                        }
                        block_data.when_can_move = now + BLOCK_MOVE_COOLDOWN;
                    }
                    *moving_block = None;
                    if hero.grabbed_entity.is_some() {
                        next = Some(HeroState::Grabbing);
                    }
                }
            } else if wanted == -1 || direction8_to_direction4(wanted) != facing.direction {
                hero.pushing_since = None;
                next = Some(if hero.grabbed_entity.is_some() {
                    HeroState::Grabbing
                } else {
                    HeroState::Free
                });
            } else {
                // try to move the facing block
                if let Some(target) = facing_target.filter(|t| t.kind == EntityKind::Block) {
                    if let Ok(block) = world.blocks.get(target.entity) {
                        if block.can_move(facing.direction, now) {
                            let path: String =
                                char::from(b'0' + facing.direction as u8 * 2).to_string();
                            world.commands.entity(target.entity).insert(Movement::path(
                                &path.repeat(2),
                                40.0,
                                false,
                                false,
                                now,
                            ));
                            *moving_block = Some(target.entity);
                        }
                    }
                }
            }
        }
        HeroState::Lifting { lifted } => {
            if main_finished {
                let lifted = *lifted;
                hero.lifted_item = Some(lifted);
                next = Some(HeroState::Carrying);
            }
        }
        HeroState::Carrying | HeroState::Freezed | HeroState::Victory => {}
        HeroState::BrandishingTreasure { .. } => {
            // ends when the treasure dialog closes (see game::update)
        }
        HeroState::Jumping { layer_after, .. } => {
            if movement_finished {
                let committed = *layer_after;
                if committed != *layer {
                    world
                        .entities
                        .set_entity_layer(hero_entity, *layer, committed);
                    *layer = committed;
                }
                next = Some(HeroState::Free);
            }
        }
        HeroState::Hurt { end_date } => {
            if now >= *end_date {
                next = Some(HeroState::Free);
            }
        }
        HeroState::Plunging => {
            if main_finished {
                let mut equipment = Equipment::new(&mut world.savegame, &ctx.item_registry);
                if equipment.has_item("flippers") {
                    next = Some(HeroState::Swimming);
                } else {
                    equipment.hurt(1);
                    let (target, target_layer) = recovery_point(hero, bounding_box, *layer);
                    next = Some(HeroState::ReturningToSolidGround {
                        target,
                        target_layer,
                    });
                }
            }
        }
        HeroState::Falling => {
            if main_finished {
                let mut equipment = Equipment::new(&mut world.savegame, &ctx.item_registry);
                equipment.hurt(2);
                let (target, target_layer) = recovery_point(hero, bounding_box, *layer);
                next = Some(HeroState::ReturningToSolidGround {
                    target,
                    target_layer,
                });
            }
        }
        HeroState::ReturningToSolidGround {
            target,
            target_layer,
        } => {
            if movement_finished {
                if *target_layer != *layer {
                    world
                        .entities
                        .set_entity_layer(hero_entity, *layer, *target_layer);
                    *layer = *target_layer;
                }
                bounding_box.set_origin_position(target.x, target.y);
                for sprite in &mut sprites.sprites {
                    sprite.set_blinking(50, now);
                }
                hero.invincible_until = now + HURT_INVINCIBILITY;
                // a teletransporter touched during the recovery fires now
                if let Some(teletransporter) = hero.delayed_teletransporter.take() {
                    if let Ok(data) = world.teletransporters.get(teletransporter) {
                        world.pending_map_change.0 = Some(MapChangeRequest {
                            map_id: data.destination_map.clone(),
                            destination: data.destination_point.clone(),
                            style: data.transition,
                        });
                    }
                }
                next = Some(HeroState::Free);
            }
        }
        HeroState::Swimming => {}
        HeroState::UsingInventoryItem { item } => {
            // consumable items act here; the rest is script-driven
            let item = item.clone();
            let definition = ctx.item_registry.get(&item);
            if definition.counter == Some(crate::resources::equipment::ItemCounter::Bombs) {
                let mut equipment = Equipment::new(&mut world.savegame, &ctx.item_registry);
                if equipment.counter(crate::resources::equipment::ItemCounter::Bombs) > 0 {
                    equipment
                        .remove_counter(crate::resources::equipment::ItemCounter::Bombs, 1);
                    let (dx, dy) = crate::geometry::DIRECTIONS4[facing.direction as usize];
                    let mut bomb_rect = bounding_box.rect;
                    bomb_rect.translate(dx * 16, dy * 16);
                    let bomb = world
                        .commands
                        .spawn((
                            EntityKind::Bomb,
                            *layer,
                            BoundingBox::new(bomb_rect, Point::new(8, 13)),
                            Facing::new(0),
                            Suspended::default(),
                            crate::components::carried::Bomb::new(now),
                            SpriteSet::default(),
                        ))
                        .id();
                    world.entities.add_entity(bomb, EntityKind::Bomb, *layer, None);
                }
            }
            next = Some(HeroState::Free);
        }
        HeroState::ConveyorBelt { .. } => {
            if movement_finished {
                next = Some(HeroState::Free);
            }
        }
        HeroState::Running { .. } => {
            if movement_blocked {
                world.audio_cmds.write(AudioCmd::PlaySound { id: "bump".into() });
                next = Some(HeroState::Free);
            }
        }
        HeroState::Bow | HeroState::Boomerang => {
            if main_finished {
                next = Some(HeroState::Free);
            }
        }
        HeroState::GameOver { phase } => match phase {
            GameOverPhase::Dying => {
                if main_finished {
                    let mut equipment = Equipment::new(&mut world.savegame, &ctx.item_registry);
                    if equipment.has_item("fairy") {
                        equipment.set_item_variant("fairy", 0);
                        equipment.set_life(28.min(equipment.get_max_life()));
                        *phase = GameOverPhase::Resurrecting;
                    } else {
                        *phase = GameOverPhase::Menu;
                    }
                }
            }
            GameOverPhase::Resurrecting => {
                for sprite in &mut sprites.sprites {
                    sprite.set_blinking(50, now);
                }
                hero.invincible_until = now + HURT_INVINCIBILITY;
                next = Some(HeroState::Free);
            }
            GameOverPhase::Menu => {
                world.next_game_state.set(GameStates::Resetting);
            }
        },
    }

    if let Some(next_state) = next {
        // entering carrying keeps the item floating above the head
        set_state(
            hero,
            next_state,
            hero_entity,
            sprites,
            &ctx.animations,
            &mut world.commands,
            now,
        );
        if matches!(hero.state, HeroState::Swimming) {
            world
                .commands
                .entity(hero_entity)
                .insert(Movement::player(hero.normal_walking_speed * 0.5, now));
        }
        if matches!(hero.state, HeroState::ReturningToSolidGround { .. }) {
            if let HeroState::ReturningToSolidGround { target, .. } = hero.state {
                let mut movement =
                    Movement::target_point(target.x, target.y, RETURN_SPEED, now);
                movement.ignore_obstacles = true;
                world.commands.entity(hero_entity).insert(movement);
            }
        }
    }
}

/// Where a bad-ground recovery sends the hero.
fn recovery_point(hero: &Hero, bounding_box: &BoundingBox, layer: Layer) -> (Point, Layer) {
    hero.target_solid_ground
        .or(hero.last_solid_ground)
        .unwrap_or((bounding_box.origin_point(), layer))
}

/// Move a grabbed statue while pulling.
fn try_move_grabbed(world: &mut HeroWorld, grabbed: Entity, direction4: i32, now: u32) {
    let Ok(block) = world.blocks.get(grabbed) else {
        return;
    };
    if block.subtype != BlockSubtype::Statue || !block.can_move(direction4, now) {
        return;
    }
    if world.movements.get(grabbed).is_ok() {
        return;
    }
    let path: String = char::from(b'0' + direction4 as u8 * 2).to_string();
    world
        .commands
        .entity(grabbed)
        .insert(Movement::path(&path.repeat(2), 40.0, false, false, now));
}

/// Ground effects under the hero's feet.
fn apply_ground(
    ctx: &HeroCtx,
    world: &mut HeroWorld,
    hero_entity: Entity,
    hero: &mut Hero,
    bounding_box: &mut BoundingBox,
    layer: &mut Layer,
    sprites: &mut SpriteSet,
    now: u32,
) {
    let origin = bounding_box.origin_point();
    let ground = ctx.map.get_ground(layer.index(), origin.x, origin.y);
    hero.ground = ground;

    match ground {
        Ground::Normal | Ground::Ladder | Ground::ShallowWater => {
            hero.last_solid_ground = Some((origin, *layer));
            hero.target_solid_ground = None;
            if matches!(hero.state, HeroState::Swimming) {
                set_state(
                    hero,
                    HeroState::Free,
                    hero_entity,
                    sprites,
                    &ctx.animations,
                    &mut world.commands,
                    now,
                );
            }
        }
        Ground::DeepWater => {
            if !hero.state.can_avoid_deep_water() {
                world.audio_cmds.write(AudioCmd::PlaySound {
                    id: "splash".into(),
                });
                set_state(
                    hero,
                    HeroState::Plunging,
                    hero_entity,
                    sprites,
                    &ctx.animations,
                    &mut world.commands,
                    now,
                );
            }
        }
        Ground::Hole => {
            if hero.state.can_avoid_hole() {
                return;
            }
            let anchor = hero
                .last_solid_ground
                .map(|(point, _)| point)
                .unwrap_or(origin);
            let distance = (origin.x - anchor.x).abs().max((origin.y - anchor.y).abs());
            if distance >= HOLE_FALL_DISTANCE {
                world.audio_cmds.write(AudioCmd::PlaySound {
                    id: "hero_falls".into(),
                });
                set_state(
                    hero,
                    HeroState::Falling,
                    hero_entity,
                    sprites,
                    &ctx.animations,
                    &mut world.commands,
                    now,
                );
            } else {
                // the hole pulls at twice the walking pace
                let center = Point::new(origin.x / 8 * 8 + 4, origin.y / 8 * 8 + 4);
                let dx = (center.x - origin.x).signum() * 2;
                let dy = (center.y - origin.y).signum() * 2;
                bounding_box.rect.translate(dx, dy);
            }
        }
        Ground::Empty => {
            // nothing below: drop one layer
            if *layer != Layer::Low {
                let below = Layer::from_index(layer.index() - 1);
                world.entities.set_entity_layer(hero_entity, *layer, below);
                *layer = below;
            }
        }
    }
}

/// Walking/stopped animation selection for the movable states.
fn refresh_animation(
    ctx: &HeroCtx,
    hero: &Hero,
    sprites: &mut SpriteSet,
    facing: &Facing,
    wanted: i32,
    now: u32,
) {
    let animation = match (&hero.state, wanted != -1) {
        (HeroState::Free, false) => Some("stopped"),
        (HeroState::Free, true) => Some("walking"),
        (HeroState::Carrying, false) => Some("carrying_stopped"),
        (HeroState::Carrying, true) => Some("carrying_walking"),
        (HeroState::Swimming, false) => Some("swimming_stopped"),
        (HeroState::Swimming, true) => Some("swimming_walking"),
        (HeroState::SwordLoading { .. }, false) => Some("sword_loading_stopped"),
        (HeroState::SwordLoading { .. }, true) => Some("sword_loading_walking"),
        _ => None,
    };
    for sprite in &mut sprites.sprites {
        if let (Some(animation), Some(set)) = (animation, ctx.animations.find(&sprite.animation_set_id))
        {
            if set.has_animation(animation) {
                sprite.set_animation(animation, now, set);
            }
        }
        sprite.set_direction(facing.direction);
    }
}

/// Keep the action/sword key effects in sync with what is in front.
fn refresh_keys_effect(
    ctx: &HeroCtx,
    world: &mut HeroWorld,
    hero: &Hero,
    facing_target: Option<FacingTarget>,
) {
    let mut equipment = Equipment::new(&mut world.savegame, &ctx.item_registry);
    world.keys_effect.sword = if equipment.has_sword()
        && hero.state.can_start_sword()
        && world.keys_effect.sword_enabled
    {
        SwordKeyEffect::Sword
    } else {
        SwordKeyEffect::None
    };

    let action = match &hero.state {
        HeroState::Free => match facing_target {
            Some(target) => match target.kind {
                EntityKind::Chest => {
                    let closed = world
                        .chests
                        .get(target.entity)
                        .map(|chest| !chest.open && !chest.hidden)
                        .unwrap_or(false);
                    if closed {
                        ActionKeyEffect::Open
                    } else {
                        ActionKeyEffect::None
                    }
                }
                EntityKind::Door => {
                    let openable = world
                        .doors
                        .get(target.entity)
                        .map(|door| door.state == DoorState::Closed && door.subtype.needs_key())
                        .unwrap_or(false);
                    if openable {
                        ActionKeyEffect::Open
                    } else {
                        ActionKeyEffect::None
                    }
                }
                EntityKind::Npc => ActionKeyEffect::Speak,
                EntityKind::ShopItem => ActionKeyEffect::Look,
                EntityKind::Block => ActionKeyEffect::Grab,
                EntityKind::Destructible => {
                    let liftable = world
                        .destructibles
                        .get(target.entity)
                        .map(|d| {
                            d.subtype.can_be_lifted()
                                && equipment.get_tunic() >= d.subtype.weight()
                        })
                        .unwrap_or(false);
                    if liftable {
                        ActionKeyEffect::Lift
                    } else {
                        ActionKeyEffect::Look
                    }
                }
                _ => ActionKeyEffect::None,
            },
            None => ActionKeyEffect::None,
        },
        HeroState::Carrying => ActionKeyEffect::Throw,
        HeroState::Grabbing | HeroState::Pulling => ActionKeyEffect::None,
        HeroState::Swimming => ActionKeyEffect::Swim,
        _ => world.keys_effect.action,
    };
    world.keys_effect.action = action;
}

/// The area the sword sweeps: one hero-sized box in the facing direction.
fn sword_hitbox(hero_rect: Rectangle, direction4: i32) -> Rectangle {
    let (dx, dy) = crate::geometry::DIRECTIONS4[direction4 as usize];
    Rectangle::new(
        hero_rect.x + dx * hero_rect.width,
        hero_rect.y + dy * hero_rect.height,
        hero_rect.width,
        hero_rect.height,
    )
}

/// Resolve the sword against enemies, crystal switches and cuttable
/// destructibles while a sword state is active.
pub fn sword_attack(
    clock: Res<GameClock>,
    suspension: Res<GameSuspension>,
    mut savegame: ResMut<Savegame>,
    item_registry: Res<ItemRegistry>,
    mut crystal_state: ResMut<crate::components::detectors::CrystalSwitchState>,
    heroes: Query<(&Hero, &BoundingBox, &Facing, &Layer)>,
    mut enemies: Query<
        (&mut crate::components::enemy::Enemy, &BoundingBox, &Layer),
        Without<Hero>,
    >,
    mut crystals: Query<
        (
            &mut crate::components::detectors::CrystalSwitch,
            &BoundingBox,
            &Layer,
        ),
        Without<Hero>,
    >,
    destructibles: Query<(Entity, &Destructible, &BoundingBox, &Layer), Without<Hero>>,
    mut treasures: ResMut<crate::resources::equipment::TreasureQueue>,
    mut map_entities: ResMut<MapEntities>,
    mut audio_cmds: MessageWriter<AudioCmd>,
    mut commands: Commands,
) {
    if suspension.suspended {
        return;
    }
    let now = clock.now;
    let Some(hero_entity) = map_entities.hero else {
        return;
    };
    let Ok((hero, bounding_box, facing, hero_layer)) = heroes.get(hero_entity) else {
        return;
    };
    let swinging = matches!(
        hero.state,
        HeroState::SwordSwinging | HeroState::SpinAttack | HeroState::SwordTapping { .. }
    );
    if !swinging {
        return;
    }
    let hitbox = sword_hitbox(bounding_box.rect, facing.direction);
    let damage_factor = hero.state.get_sword_damage_factor();
    let sword_level = {
        let equipment = Equipment::new(&mut savegame, &item_registry);
        equipment.get_sword()
    };

    for (mut enemy, enemy_box, layer) in enemies.iter_mut() {
        if layer == hero_layer
            && enemy.enabled
            && enemy.is_in_normal_phase()
            && now >= enemy.invulnerable_until
            && enemy_box.rect.overlaps(&hitbox)
        {
            enemy.hurt_by_sword(sword_level, damage_factor, now);
            audio_cmds.write(AudioCmd::PlaySound {
                id: "enemy_hurt".into(),
            });
        }
    }

    if hero.state.can_sword_hit_crystal_switch() {
        for (mut crystal, crystal_box, layer) in crystals.iter_mut() {
            if layer == hero_layer
                && now >= crystal.next_toggle_date
                && crystal_box.rect.overlaps(&hitbox)
            {
                crystal.next_toggle_date = now + 1000;
                crystal_state.toggle();
                audio_cmds.write(AudioCmd::PlaySound {
                    id: "switch".into(),
                });
            }
        }
    }

    for (entity, destructible, destructible_box, layer) in destructibles.iter() {
        if layer == hero_layer
            && destructible.subtype.can_be_cut()
            && destructible_box.rect.overlaps(&hitbox)
        {
            audio_cmds.write(AudioCmd::PlaySound {
                id: destructible.subtype.destruction_sound().to_string(),
            });
            if let Some(treasure) = &destructible.treasure {
                treasures.0.push(treasure.clone());
            }
            map_entities.schedule_removal(entity);
            commands
                .entity(entity)
                .insert(crate::components::entity::BeingRemoved);
        }
    }
}
