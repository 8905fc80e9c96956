//! HUD update: counters flowing toward their values, visibility, opacity.

use bevy_ecs::prelude::*;

use crate::components::entity::BoundingBox;
use crate::events::audio::AudioCmd;
use crate::resources::dialogbox::DialogBox;
use crate::resources::dungeon::Dungeon;
use crate::resources::equipment::{Equipment, ItemRegistry};
use crate::resources::gameclock::GameClock;
use crate::resources::hud::{HUD_CORNER_HEIGHT, HUD_CORNER_WIDTH, Hud, HudElementKind};
use crate::resources::map::Map;
use crate::resources::mapentities::MapEntities;
use crate::resources::savegame::Savegame;

/// Feed the HUD elements from the equipment and the overlay states.
pub fn hud_update(
    clock: Res<GameClock>,
    mut hud: ResMut<Hud>,
    mut savegame: ResMut<Savegame>,
    item_registry: Res<ItemRegistry>,
    dungeon: Option<Res<Dungeon>>,
    map: Res<Map>,
    entities: Res<MapEntities>,
    dialog_box: Res<DialogBox>,
    boxes: Query<&BoundingBox>,
    mut audio_cmds: MessageWriter<AudioCmd>,
) {
    let now = clock.now;
    let equipment = Equipment::new(&mut savegame, &item_registry);
    let life = equipment.get_life();
    let max_life = equipment.get_max_life();
    let rupees = equipment.get_rupees();
    let magic = equipment.get_magic();
    let has_magic = equipment.get_max_magic() > 0;

    // the hero under the top-left corner demotes the whole HUD
    let hero_under_hud = entities
        .hero
        .and_then(|hero| boxes.get(hero).ok())
        .map(|bounding_box| {
            let origin = bounding_box.origin_point();
            let camera = &map.camera.rect;
            origin.x - camera.x < HUD_CORNER_WIDTH && origin.y - camera.y < HUD_CORNER_HEIGHT
        })
        .unwrap_or(false);
    let opacity = if hero_under_hud { 96 } else { 255 };

    for element in &mut hud.elements {
        element.opacity = opacity;
        element.update_blink(now);
        match &mut element.kind {
            HudElementKind::HeartsView {
                displayed_life,
                next_update_date,
                next_danger_sound_date,
            } => {
                if *displayed_life != life && now >= *next_update_date {
                    *displayed_life = Hud::counter_step(*displayed_life, life);
                    *next_update_date = now + 50;
                    if *displayed_life < life {
                        audio_cmds.write(AudioCmd::PlaySound {
                            id: "heart".into(),
                        });
                    }
                }
                if life <= max_life / 4 && life > 0 && now >= *next_danger_sound_date {
                    audio_cmds.write(AudioCmd::PlaySound {
                        id: "danger".into(),
                    });
                    *next_danger_sound_date = now + 750;
                }
            }
            HudElementKind::RupeesCounter {
                displayed,
                next_update_date,
            } => {
                if *displayed != rupees && now >= *next_update_date {
                    *displayed = Hud::counter_step(*displayed, rupees);
                    *next_update_date = now + 40;
                    audio_cmds.write(AudioCmd::PlaySound {
                        id: "rupee_counter".into(),
                    });
                    if *displayed == rupees {
                        audio_cmds.write(AudioCmd::PlaySound {
                            id: "rupee_counter_end".into(),
                        });
                    }
                }
            }
            HudElementKind::MagicBar {
                displayed,
                next_update_date,
            } => {
                element.visible = has_magic;
                if *displayed != magic && now >= *next_update_date {
                    *displayed = Hud::counter_step(*displayed, magic);
                    *next_update_date = now + 40;
                }
            }
            HudElementKind::ItemIcon { .. } => {
                // item icons hide while a dialog covers the top of the
                // screen
                element.visible = !dialog_box.is_enabled();
            }
            HudElementKind::SmallKeysCounter => {
                element.visible = dungeon
                    .as_ref()
                    .is_some_and(|d| d.small_keys_variable.is_some());
            }
            HudElementKind::FloorView => {
                element.visible = map.floor.is_some();
            }
            HudElementKind::SwordIcon
            | HudElementKind::PauseIcon
            | HudElementKind::ActionIcon => {}
        }
    }
}
