//! Dialog box system: starting, revealing, keys, closing consequences.

use bevy_ecs::prelude::*;

use crate::components::hero::{Hero, HeroState};
use crate::components::sprite::SpriteSet;
use crate::events::audio::AudioCmd;
use crate::events::input::DialogKeyMessage;
use crate::resources::animations::AnimationStore;
use crate::resources::controls::GameKey;
use crate::resources::dialogbox::{DialogBox, DialogClosed, DialogTick, PendingDialogs, PendingShopPurchase};
use crate::resources::dialogs::DialogStore;
use crate::resources::equipment::{Equipment, ItemRegistry, TreasureQueue};
use crate::resources::gameclock::GameClock;
use crate::resources::keyseffect::{ActionKeyEffect, KeysEffect, SwordKeyEffect};
use crate::resources::mapentities::MapEntities;
use crate::resources::savegame::Savegame;
use crate::resources::script::{ScriptEvent, ScriptEventQueue};
use crate::systems::hero::set_state;

/// Advance the [`DialogKeyMessage`] queue each tick.
pub fn update_dialog_key_messages(mut msgs: ResMut<Messages<DialogKeyMessage>>) {
    msgs.update();
}

/// Start queued dialogs, advance the reveal, consume routed keys and apply
/// the consequences of a closing dialog.
pub fn dialog_update(
    clock: Res<GameClock>,
    store: Res<DialogStore>,
    animations: Res<AnimationStore>,
    mut dialog_box: ResMut<DialogBox>,
    mut pending: ResMut<PendingDialogs>,
    mut pending_shop: ResMut<PendingShopPurchase>,
    mut treasures: ResMut<TreasureQueue>,
    mut keys_effect: ResMut<KeysEffect>,
    mut savegame: ResMut<Savegame>,
    item_registry: Res<ItemRegistry>,
    entities: Res<MapEntities>,
    mut script_events: ResMut<ScriptEventQueue>,
    mut key_reader: MessageReader<DialogKeyMessage>,
    mut heroes: Query<(&mut Hero, &mut SpriteSet)>,
    shop_items: Query<&crate::components::shopitem::ShopItem>,
    mut audio_cmds: MessageWriter<AudioCmd>,
    mut commands: Commands,
) {
    let now = clock.now;

    // open the next queued dialog
    if !dialog_box.is_enabled() {
        if let Some(dialog_id) = pending.0.first().cloned() {
            pending.0.remove(0);
            keys_effect.save_effects();
            keys_effect.action = ActionKeyEffect::Next;
            keys_effect.sword = SwordKeyEffect::Skip;
            dialog_box.start(&dialog_id, &store, now);
            script_events.push(ScriptEvent::DialogStarted {
                dialog_id: dialog_id.clone(),
            });
            script_events.push(ScriptEvent::MessageStarted { dialog_id });
        }
    }
    if !dialog_box.is_enabled() {
        key_reader.read();
        return;
    }

    let mut closed: Option<DialogClosed> = None;
    let mut ticks: Vec<DialogTick> = Vec::new();

    let previous_message = dialog_box.current_message_id().map(str::to_string);
    for key in key_reader.read() {
        if !key.pressed {
            continue;
        }
        match key.key {
            GameKey::Action => {
                let (tick, close) = dialog_box.key_action(&store, now);
                ticks.push(tick);
                closed = closed.or(close);
            }
            GameKey::Sword => {
                let (tick, close) = dialog_box.key_sword(&store, now);
                ticks.push(tick);
                closed = closed.or(close);
            }
            GameKey::Up | GameKey::Down => dialog_box.toggle_answer(),
            _ => {}
        }
    }
    // stepping to a new message notifies the script
    if closed.is_none() {
        let current = dialog_box.current_message_id().map(str::to_string);
        if current != previous_message {
            if let Some(dialog_id) = current {
                script_events.push(ScriptEvent::MessageStarted { dialog_id });
            }
        }
    }

    ticks.push(dialog_box.update(now));

    if ticks.iter().any(|tick| tick.play_letter_sound) {
        audio_cmds.write(AudioCmd::PlaySound {
            id: "message_letter".into(),
        });
    }

    let Some(closed) = closed else {
        return;
    };

    // restore the keys of the previous context
    keys_effect.restore_effects();
    script_events.push(ScriptEvent::DialogFinished {
        dialog_id: closed.dialog_id.clone(),
        last_answer: closed.last_answer,
    });

    // a brandished treasure lands in the equipment when its dialog closes
    if let Some(hero_entity) = entities.hero {
        if let Ok((mut hero, mut sprites)) = heroes.get_mut(hero_entity) {
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
    }

    // a shop purchase settles on answer 0 of its buy question
    if let Some((shop_entity, dialog_id)) = pending_shop.0.take() {
        if dialog_id == closed.dialog_id {
            if closed.last_answer == 0 {
                if let Ok(shop_item) = shop_items.get(shop_entity) {
                    let mut equipment = Equipment::new(&mut savegame, &item_registry);
                    if equipment.get_rupees() >= shop_item.price {
                        equipment.remove_rupees(shop_item.price);
                        treasures.0.push(shop_item.treasure.clone());
                        audio_cmds.write(AudioCmd::PlaySound {
                            id: "picked_item".into(),
                        });
                    } else {
                        audio_cmds.write(AudioCmd::PlaySound { id: "wrong".into() });
                    }
                }
            }
        } else {
            pending_shop.0 = Some((shop_entity, dialog_id));
        }
    }
}
