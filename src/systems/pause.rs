//! Pause menu: submenu navigation, item assignment, save dialog.

use bevy_ecs::prelude::*;

use crate::events::audio::AudioCmd;
use crate::events::input::PauseKeyMessage;
use crate::resources::controls::GameKey;
use crate::resources::equipment::{Equipment, ItemRegistry};
use crate::resources::gameclock::GameClock;
use crate::resources::gamestate::{GameStates, NextGameState};
use crate::resources::pause::{
    INVENTORY_COLUMNS, ItemFlight, PauseMenu, PauseSubmenu, SaveDialog, SaveDialogPhase,
};
use crate::resources::savegame::{Savegame, ints};

/// Advance the [`PauseKeyMessage`] queue each tick.
pub fn update_pause_key_messages(mut msgs: ResMut<Messages<PauseKeyMessage>>) {
    msgs.update();
}

/// Screen position of an item slot icon.
fn slot_position(slot: usize) -> (i32, i32) {
    if slot == 0 { (265, 8) } else { (296, 8) }
}

/// Screen position of an inventory cell.
fn cell_position(row: usize, column: usize) -> (i32, i32) {
    (60 + column as i32 * 32, 70 + row as i32 * 32)
}

/// Consume the keys routed to the pause menu and run its logic.
pub fn pause_update(
    clock: Res<GameClock>,
    mut pause: ResMut<PauseMenu>,
    mut savegame: ResMut<Savegame>,
    item_registry: Res<ItemRegistry>,
    mut next_game_state: ResMut<NextGameState>,
    mut key_reader: MessageReader<PauseKeyMessage>,
    mut audio_cmds: MessageWriter<AudioCmd>,
) {
    let now = clock.now;
    if !pause.open {
        key_reader.read();
        return;
    }

    // an item icon in flight absorbs input until it lands
    if let Some(flight) = &mut pause.item_flight {
        key_reader.read();
        while now >= flight.next_move_date && !flight.arrived() {
            flight.x += (flight.target_x - flight.x).clamp(-4, 4);
            flight.y += (flight.target_y - flight.y).clamp(-4, 4);
            flight.next_move_date += 16;
        }
        if flight.arrived() {
            let item = flight.item.clone();
            let slot = flight.slot;
            pause.item_flight = None;
            let mut equipment = Equipment::new(&mut savegame, &item_registry);
            // swap with the other slot when it already holds this item
            let other = 1 - slot;
            if equipment.get_item_assigned(other) == Some(item.as_str()) {
                let previous = equipment.get_item_assigned(slot).map(str::to_string);
                equipment.set_item_assigned(other, previous.as_deref());
            }
            equipment.set_item_assigned(slot, Some(&item));
            audio_cmds.write(AudioCmd::PlaySound { id: "ok".into() });
        }
        return;
    }

    let keys: Vec<PauseKeyMessage> = key_reader.read().copied().collect();
    for key in keys {
        if !key.pressed {
            continue;
        }
        if let Some(save_dialog) = &mut pause.save_dialog {
            let closed = handle_save_dialog_key(
                key.key,
                save_dialog,
                &mut savegame,
                &mut next_game_state,
                &mut audio_cmds,
            );
            if closed {
                pause.save_dialog = None;
            }
            continue;
        }
        match key.key {
            GameKey::Pause => {
                close(&mut pause, &mut savegame);
                audio_cmds.write(AudioCmd::PlaySound {
                    id: "pause_closed".into(),
                });
            }
            GameKey::Left | GameKey::Right => {
                let delta = if key.key == GameKey::Left { -1 } else { 1 };
                let at_edge = match pause.submenu {
                    PauseSubmenu::Inventory => {
                        (delta < 0 && pause.inventory_column == 0)
                            || (delta > 0 && pause.inventory_column == INVENTORY_COLUMNS - 1)
                    }
                    _ => true,
                };
                if at_edge {
                    pause.switch_submenu(delta);
                    audio_cmds.write(AudioCmd::PlaySound {
                        id: "pause_submenu".into(),
                    });
                } else {
                    pause.move_inventory_cursor(delta, 0);
                    audio_cmds.write(AudioCmd::PlaySound {
                        id: "cursor".into(),
                    });
                }
            }
            GameKey::Up | GameKey::Down => {
                if pause.submenu == PauseSubmenu::Inventory {
                    let dy = if key.key == GameKey::Up { -1 } else { 1 };
                    pause.move_inventory_cursor(0, dy);
                    audio_cmds.write(AudioCmd::PlaySound {
                        id: "cursor".into(),
                    });
                }
            }
            GameKey::Item1 | GameKey::Item2 => {
                if pause.submenu == PauseSubmenu::Inventory {
                    let slot = if key.key == GameKey::Item1 { 0 } else { 1 };
                    try_assign_item(
                        &mut pause,
                        slot,
                        &mut savegame,
                        &item_registry,
                        &mut audio_cmds,
                        now,
                    );
                }
            }
            GameKey::Action => {
                // the save dialog opens from the quest status submenu
                if pause.submenu == PauseSubmenu::QuestStatus {
                    pause.save_dialog = Some(SaveDialog {
                        phase: SaveDialogPhase::SaveQuestion,
                        answer: 0,
                    });
                }
            }
            GameKey::Sword => {}
        }
    }
}

/// Open the pause menu (from the key router) restoring the last submenu.
pub fn open(pause: &mut PauseMenu, savegame: &Savegame) {
    pause.open = true;
    pause.submenu = PauseSubmenu::from_index(
        savegame.get_reserved_integer(ints::PAUSE_LAST_SUBMENU) as usize,
    );
    pause.inventory_row =
        (savegame.get_reserved_integer(ints::INVENTORY_LAST_ROW) as usize).min(3);
    pause.inventory_column =
        (savegame.get_reserved_integer(ints::INVENTORY_LAST_COLUMN) as usize)
            .min(INVENTORY_COLUMNS - 1);
}

/// Close the pause menu, remembering the cursor for next time.
pub fn close(pause: &mut PauseMenu, savegame: &mut Savegame) {
    pause.open = false;
    pause.save_dialog = None;
    savegame.set_reserved_integer(ints::PAUSE_LAST_SUBMENU, pause.submenu.index() as u32);
    savegame.set_reserved_integer(ints::INVENTORY_LAST_ROW, pause.inventory_row as u32);
    savegame.set_reserved_integer(ints::INVENTORY_LAST_COLUMN, pause.inventory_column as u32);
}

/// Start the flight of the selected item toward the pressed slot.
fn try_assign_item(
    pause: &mut PauseMenu,
    slot: usize,
    savegame: &mut Savegame,
    item_registry: &ItemRegistry,
    audio_cmds: &mut MessageWriter<AudioCmd>,
    now: u32,
) {
    let index = pause.inventory_index();
    let Some(item) = item_registry.iter().nth(index) else {
        audio_cmds.write(AudioCmd::PlaySound { id: "wrong".into() });
        return;
    };
    let item = item.clone();
    let equipment = Equipment::new(savegame, item_registry);
    if !item.attributable || equipment.get_item_variant(&item.name) == 0 {
        audio_cmds.write(AudioCmd::PlaySound { id: "wrong".into() });
        return;
    }
    let (x, y) = cell_position(pause.inventory_row, pause.inventory_column);
    let (target_x, target_y) = slot_position(slot);
    pause.item_flight = Some(ItemFlight {
        item: item.name.clone(),
        slot,
        x,
        y,
        target_x,
        target_y,
        next_move_date: now,
    });
    audio_cmds.write(AudioCmd::PlaySound { id: "throw".into() });
}

/// One key of the two-question save dialog. Returns true when it closed.
fn handle_save_dialog_key(
    key: GameKey,
    save_dialog: &mut SaveDialog,
    savegame: &mut Savegame,
    next_game_state: &mut NextGameState,
    audio_cmds: &mut MessageWriter<AudioCmd>,
) -> bool {
    match key {
        GameKey::Left | GameKey::Right => {
            save_dialog.answer = 1 - save_dialog.answer;
            audio_cmds.write(AudioCmd::PlaySound {
                id: "cursor".into(),
            });
            false
        }
        GameKey::Sword | GameKey::Action => match save_dialog.phase {
            SaveDialogPhase::SaveQuestion => {
                if save_dialog.answer == 0 {
                    match savegame.save() {
                        Ok(()) => audio_cmds.write(AudioCmd::PlaySound { id: "ok".into() }),
                        Err(e) => {
                            log::error!("savegame write failed: {e:#}");
                            audio_cmds.write(AudioCmd::PlaySound { id: "wrong".into() })
                        }
                    };
                }
                save_dialog.phase = SaveDialogPhase::ContinueQuestion;
                save_dialog.answer = 0;
                false
            }
            SaveDialogPhase::ContinueQuestion => {
                if save_dialog.answer == 1 {
                    next_game_state.set(GameStates::Quitting);
                }
                true
            }
        },
        _ => false,
    }
}
