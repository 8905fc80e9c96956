//! Rendering with Raylib.
//!
//! Draws one frame into the fixed 320×240 render target: tiles bottom-up
//! by layer with the Y-ordered entities interleaved after the plain ones,
//! then the HUD, the dialog box, the pause menu and the transition veil,
//! and finally blits the target to the window with letterboxing.

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use raylib::prelude::{Color, RaylibDraw, RaylibTextureModeExt, Rectangle as RlRectangle, Vector2};

use crate::components::entity::{BoundingBox, Layer};
use crate::components::movement::Movement;
use crate::components::sprite::SpriteSet;
use crate::components::tiles::DynamicTile;
use crate::geometry::Rectangle;
use crate::resources::animations::AnimationStore;
use crate::resources::dialogbox::DialogBox;
use crate::resources::fontstore::FontStore;
use crate::resources::gameclock::GameClock;
use crate::resources::hud::{Hud, HudElementKind};
use crate::resources::keyseffect::{ActionKeyEffect, KeysEffect};
use crate::resources::map::Map;
use crate::resources::mapentities::MapEntities;
use crate::resources::pause::{PauseMenu, PauseSubmenu};
use crate::resources::rendertarget::RenderTarget;
use crate::resources::texturestore::TextureStore;
use crate::resources::tileset::TilesetStore;
use crate::resources::transition::{CurrentTransition, TransitionDirection};
use crate::resources::windowsize::WindowSize;

/// Read-only resources of the render pass.
#[derive(SystemParam)]
pub struct RenderResources<'w> {
    pub clock: Res<'w, GameClock>,
    pub map: Res<'w, Map>,
    pub entities: Res<'w, MapEntities>,
    pub tilesets: Res<'w, TilesetStore>,
    pub textures: Res<'w, TextureStore>,
    pub animations: Res<'w, AnimationStore>,
    pub hud: Res<'w, Hud>,
    pub keys_effect: Res<'w, KeysEffect>,
    pub dialog_box: Res<'w, DialogBox>,
    pub pause: Res<'w, PauseMenu>,
    pub transition: Res<'w, CurrentTransition>,
    pub window_size: Res<'w, WindowSize>,
}

fn to_rl(rect: &Rectangle) -> RlRectangle {
    RlRectangle {
        x: rect.x as f32,
        y: rect.y as f32,
        width: rect.width as f32,
        height: rect.height as f32,
    }
}

/// Draw one frame.
pub fn render_system(
    mut rl: NonSendMut<raylib::RaylibHandle>,
    th: NonSend<raylib::RaylibThread>,
    mut render_target: NonSendMut<RenderTarget>,
    fonts: NonSend<FontStore>,
    res: RenderResources,
    sprites_query: Query<(&SpriteSet, &BoundingBox, Option<&Movement>)>,
    tiles_query: Query<(&DynamicTile, &BoundingBox, &Layer)>,
) {
    let now = res.clock.now;
    let camera = res.map.camera.rect;

    {
        let mut d = rl.begin_texture_mode(&th, &mut render_target.texture);
        d.clear_background(Color::BLACK);

        let tileset = res.tilesets.get(&res.map.tileset_id);
        let tileset_texture = res.textures.get(&res.map.tileset_id);

        for layer in 0..Layer::COUNT {
            // static tiles
            if let Some(texture) = tileset_texture {
                for tile in &res.entities.tiles[layer] {
                    if !tile.rect.overlaps(&camera) {
                        continue;
                    }
                    let pattern = tileset.pattern(tile.pattern_id);
                    let src = pattern.frame_rect(now);
                    d.draw_texture_pro(
                        texture,
                        to_rl(&src),
                        RlRectangle {
                            x: (tile.rect.x - camera.x) as f32,
                            y: (tile.rect.y - camera.y) as f32,
                            width: tile.rect.width as f32,
                            height: tile.rect.height as f32,
                        },
                        Vector2::zero(),
                        0.0,
                        Color::WHITE,
                    );
                }
                // dynamic tiles of this layer
                for (tile, bounding_box, tile_layer) in tiles_query.iter() {
                    if tile_layer.index() != layer
                        || !tile.enabled
                        || !bounding_box.rect.overlaps(&camera)
                    {
                        continue;
                    }
                    let pattern = tileset.pattern(tile.pattern_id);
                    d.draw_texture_pro(
                        texture,
                        to_rl(&pattern.frame_rect(now)),
                        RlRectangle {
                            x: (bounding_box.rect.x - camera.x) as f32,
                            y: (bounding_box.rect.y - camera.y) as f32,
                            width: bounding_box.rect.width as f32,
                            height: bounding_box.rect.height as f32,
                        },
                        Vector2::zero(),
                        0.0,
                        Color::WHITE,
                    );
                }
            }

            // entities in plain order, then the Y-ordered ones
            for entity in res.entities.displayed_first[layer]
                .iter()
                .chain(res.entities.displayed_y_order[layer].iter())
            {
                let Ok((sprites, bounding_box, movement)) = sprites_query.get(*entity) else {
                    continue;
                };
                let height_above_shadow = movement.map_or(0, |m| m.jump_height());
                for sprite in &sprites.sprites {
                    if !sprite.is_visible() {
                        continue;
                    }
                    let Some(set) = res.animations.find(&sprite.animation_set_id) else {
                        continue;
                    };
                    let Some(texture) = res.textures.get(&sprite.animation_set_id) else {
                        continue;
                    };
                    let animation = set.animation(&sprite.animation);
                    let src = animation.frame_rect(sprite.direction, sprite.frame);
                    let origin = bounding_box.origin_point();
                    let x = origin.x - animation.origin_x - camera.x;
                    let y = origin.y - animation.origin_y - camera.y - height_above_shadow;
                    let tint = Color::new(255, 255, 255, sprite.alpha as u8);
                    d.draw_texture_pro(
                        texture,
                        to_rl(&src),
                        RlRectangle {
                            x: x as f32,
                            y: y as f32,
                            width: src.width as f32,
                            height: src.height as f32,
                        },
                        Vector2::zero(),
                        0.0,
                        tint,
                    );
                }
            }
        }

        draw_hud(&mut d, &res);
        if res.dialog_box.is_enabled() {
            draw_dialog(&mut d, &res, &fonts);
        }
        if res.pause.open {
            draw_pause(&mut d, &res);
        }

        // darkness veil of unlit rooms
        if res.map.light == 0 {
            d.draw_rectangle(0, 0, 320, 240, Color::new(0, 0, 0, 208));
        }

        // transition veil
        if let Some(transition) = &res.transition.0 {
            let cover = match transition.direction {
                TransitionDirection::Out => 255 - transition.alpha(now),
                TransitionDirection::In => 255 - transition.alpha(now),
            };
            if cover > 0 {
                d.draw_rectangle(0, 0, 320, 240, Color::new(0, 0, 0, cover as u8));
            }
        }
    }

    // blit to the window
    let letterbox = res.window_size.calculate_letterbox(
        render_target.game_width,
        render_target.game_height,
    );
    let source = render_target.source_rect();
    let mut d = rl.begin_drawing(&th);
    d.clear_background(Color::BLACK);
    d.draw_texture_pro(
        &render_target.texture,
        source,
        letterbox,
        Vector2::zero(),
        0.0,
        Color::WHITE,
    );
}

fn draw_hud(d: &mut impl RaylibDraw, res: &RenderResources) {
    for element in &res.hud.elements {
        if !element.is_drawn() {
            continue;
        }
        let alpha = element.opacity as u8;
        match &element.kind {
            HudElementKind::HeartsView { displayed_life, .. } => {
                let full = displayed_life / 4;
                let quarters = displayed_life % 4;
                for i in 0..full {
                    d.draw_rectangle(
                        element.x + i as i32 * 9,
                        element.y,
                        8,
                        8,
                        Color::new(208, 32, 32, alpha),
                    );
                }
                if quarters > 0 {
                    d.draw_rectangle(
                        element.x + full as i32 * 9,
                        element.y,
                        2 * quarters as i32,
                        8,
                        Color::new(208, 32, 32, alpha),
                    );
                }
            }
            HudElementKind::RupeesCounter { displayed, .. } => {
                d.draw_text(
                    &format!("{displayed:03}"),
                    element.x,
                    element.y,
                    10,
                    Color::new(64, 224, 64, alpha),
                );
            }
            HudElementKind::MagicBar { displayed, .. } => {
                d.draw_rectangle(
                    element.x,
                    element.y,
                    *displayed as i32,
                    4,
                    Color::new(64, 192, 64, alpha),
                );
            }
            HudElementKind::ItemIcon { slot } => {
                d.draw_rectangle_lines(
                    element.x,
                    element.y,
                    24,
                    24,
                    Color::new(255, 255, 255, alpha),
                );
                d.draw_text(
                    if *slot == 0 { "X" } else { "V" },
                    element.x + 2,
                    element.y + 2,
                    10,
                    Color::new(255, 255, 255, alpha),
                );
            }
            HudElementKind::ActionIcon => {
                let label = match res.keys_effect.action {
                    ActionKeyEffect::None => "",
                    ActionKeyEffect::Validate => "OK",
                    ActionKeyEffect::Next => "Next",
                    ActionKeyEffect::Look => "Look",
                    ActionKeyEffect::Open => "Open",
                    ActionKeyEffect::Lift => "Lift",
                    ActionKeyEffect::Throw => "Throw",
                    ActionKeyEffect::Grab => "Grab",
                    ActionKeyEffect::Speak => "Speak",
                    ActionKeyEffect::Change => "Change",
                    ActionKeyEffect::Swim => "Swim",
                };
                if !label.is_empty() {
                    d.draw_text(label, element.x, element.y, 10, Color::new(96, 144, 255, alpha));
                }
            }
            HudElementKind::SwordIcon | HudElementKind::PauseIcon => {}
            HudElementKind::SmallKeysCounter | HudElementKind::FloorView => {
                // drawn from their update-computed visibility; values are
                // cheap enough to skip caching
            }
        }
    }
}

fn draw_dialog(d: &mut impl RaylibDraw, res: &RenderResources, fonts: &FontStore) {
    d.draw_rectangle(24, 160, 272, 64, Color::new(0, 0, 32, 224));
    d.draw_rectangle_lines(24, 160, 272, 64, Color::WHITE);
    let lines = res.dialog_box.lines();
    for (i, line) in lines.iter().enumerate() {
        let y = 168 + i as i32 * 16;
        match fonts.get("dialog") {
            Some(font) => d.draw_text_ex(
                font,
                line,
                Vector2 {
                    x: 32.0,
                    y: y as f32,
                },
                11.0,
                1.0,
                Color::WHITE,
            ),
            None => d.draw_text(line, 32, y, 10, Color::WHITE),
        }
    }
    if res.dialog_box.is_question() {
        let y = 184 + res.dialog_box.current_answer() as i32 * 16;
        d.draw_text(">", 26, y, 10, Color::WHITE);
    }
}

fn draw_pause(d: &mut impl RaylibDraw, res: &RenderResources) {
    d.draw_rectangle(16, 16, 288, 208, Color::new(0, 0, 48, 232));
    d.draw_rectangle_lines(16, 16, 288, 208, Color::WHITE);
    let title = match res.pause.submenu {
        PauseSubmenu::Inventory => "Inventory",
        PauseSubmenu::Map => "Map",
        PauseSubmenu::QuestStatus => "Quest Status",
        PauseSubmenu::Options => "Options",
    };
    d.draw_text(title, 130, 24, 10, Color::WHITE);

    if res.pause.submenu == PauseSubmenu::Inventory {
        for row in 0..4 {
            for column in 0..7 {
                let x = 60 + column * 32;
                let y = 70 + row * 32;
                d.draw_rectangle_lines(x, y, 24, 24, Color::GRAY);
            }
        }
        let x = 60 + res.pause.inventory_column as i32 * 32;
        let y = 70 + res.pause.inventory_row as i32 * 32;
        d.draw_rectangle_lines(x - 2, y - 2, 28, 28, Color::YELLOW);
        if let Some(flight) = &res.pause.item_flight {
            d.draw_rectangle(flight.x, flight.y, 16, 16, Color::YELLOW);
        }
    }

    if let Some(save_dialog) = &res.pause.save_dialog {
        d.draw_rectangle(70, 90, 180, 60, Color::new(0, 0, 0, 240));
        d.draw_rectangle_lines(70, 90, 180, 60, Color::WHITE);
        let question = match save_dialog.phase {
            crate::resources::pause::SaveDialogPhase::SaveQuestion => "Save the game?",
            crate::resources::pause::SaveDialogPhase::ContinueQuestion => "Keep playing?",
        };
        d.draw_text(question, 80, 100, 10, Color::WHITE);
        d.draw_text("Yes", 100, 124, 10, Color::WHITE);
        d.draw_text("No", 180, 124, 10, Color::WHITE);
        let x = if save_dialog.answer == 0 { 90 } else { 170 };
        d.draw_text(">", x, 124, 10, Color::YELLOW);
    }
}
