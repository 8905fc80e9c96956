//! Emberward engine entry point.
//!
//! A 2D top-down action-adventure engine using:
//! - **raylib** for windowing, graphics, and audio
//! - **bevy_ecs** for the world and the per-tick systems
//! - **mlua + LuaJIT** for per-map scripting
//!
//! # Main loop
//!
//! 1. Initialize the window, the ECS world and the audio thread
//! 2. Load the quest data (maps, tilesets, animations, dialogs, items)
//! 3. Load the savegame and start on its starting map
//! 4. Run the fixed-step loop: accumulate wall-clock time, run 16 ms
//!    logical updates to catch up (rendering is skipped while more than
//!    one update is pending), draw, repeat
//! 5. Shut the audio thread down on exit

// Do not create console on Windows
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]
#![recursion_limit = "512"]

mod components;
mod events;
mod game;
mod geometry;
mod resources;
mod systems;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use clap::Parser;
use log::{error, info};

use crate::events::audio::AudioCmd;
use crate::events::detector::EntityMoved;
use crate::events::input::{DialogKeyMessage, GameKeyMessage, HeroKeyMessage, PauseKeyMessage};
use crate::resources::animations::AnimationStore;
use crate::resources::audio::{setup_audio, shutdown_audio};
use crate::components::detectors::CrystalSwitchState;
use crate::resources::controls::Controls;
use crate::resources::dialogbox::{DialogBox, PendingDialogs, PendingShopPurchase};
use crate::resources::dialogs::DialogStore;
use crate::resources::equipment::{ItemRegistry, TreasureQueue};
use crate::resources::fontstore::FontStore;
use crate::resources::gameclock::{GameClock, GameSuspension};
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use crate::resources::hud::Hud;
use crate::resources::keyseffect::KeysEffect;
use crate::resources::map::PendingMapChange;
use crate::resources::mapdata::{MapData, MapStore};
use crate::resources::obstacles::ObstacleIndex;
use crate::resources::pause::PauseMenu;
use crate::resources::rendertarget::RenderTarget;
use crate::resources::savegame::{Savegame, ints, strings};
use crate::resources::screensize::ScreenSize;
use crate::resources::script::ScriptEventQueue;
use crate::resources::texturestore::TextureStore;
use crate::resources::tileset::TilesetStore;
use crate::resources::transition::CurrentTransition;
use crate::resources::windowsize::WindowSize;
use crate::systems::collision::{build_obstacle_index, detector_check, detector_hit_observer};
use crate::systems::movement::{movement, update_moved_messages};

/// Logical step duration in seconds.
const STEP: f64 = 1.0 / 60.0;
/// Updates per loop iteration before time is dropped to survive stalls.
const MAX_UPDATES_PER_FRAME: u32 = 10;

/// Emberward, a 2D action-adventure engine
#[derive(Parser)]
#[command(version, about = "Emberward 2D action-adventure engine")]
struct Cli {
    /// Quest data directory.
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Savegame file.
    #[arg(long, default_value = "./save1.dat")]
    savegame: PathBuf,

    /// Start on this map instead of the saved one.
    #[arg(long)]
    map: Option<String>,

    /// Validate the quest data files and exit.
    #[arg(long)]
    check_data: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.check_data {
        let mut world = World::new();
        load_quest_data(&mut world, &cli.data_dir)?;
        println!("quest data OK");
        return Ok(());
    }

    let mut config = GameConfig::new();
    config.load_from_file().ok(); // missing file keeps the defaults

    let (mut rl, thread) = raylib::init()
        .size(config.window_width as i32, config.window_height as i32)
        .resizable()
        .title("Emberward")
        .build();
    rl.set_target_fps(config.target_fps);
    rl.set_exit_key(None);

    let render_target =
        RenderTarget::new(&mut rl, &thread, 320, 240).expect("failed to create render target");

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    world.insert_resource(GameClock::default());
    world.insert_resource(GameSuspension::default());
    world.insert_resource(ScreenSize::default());
    world.insert_resource(WindowSize {
        w: rl.get_screen_width(),
        h: rl.get_screen_height(),
    });
    world.insert_resource(config);
    world.insert_resource(GameState::new());
    world.insert_resource(NextGameState::new());
    world.insert_resource(KeysEffect::new());
    world.insert_resource(DialogBox::new());
    world.insert_resource(PendingDialogs::default());
    world.insert_resource(PendingShopPurchase::default());
    world.insert_resource(TreasureQueue::default());
    world.insert_resource(game::TreasureTimer::default());
    world.insert_resource(Hud::new());
    world.insert_resource(PauseMenu::new());
    world.insert_resource(CurrentTransition::default());
    world.insert_resource(PendingMapChange::default());
    world.insert_resource(CrystalSwitchState::default());
    world.insert_resource(ObstacleIndex::default());
    world.insert_resource(ScriptEventQueue::default());
    world.insert_resource(Messages::<GameKeyMessage>::default());
    world.insert_resource(Messages::<HeroKeyMessage>::default());
    world.insert_resource(Messages::<DialogKeyMessage>::default());
    world.insert_resource(Messages::<PauseKeyMessage>::default());
    world.insert_resource(Messages::<EntityMoved>::default());

    setup_audio(&mut world); // before anything writes AudioCmd messages

    load_quest_data(&mut world, &cli.data_dir)?;

    let mut savegame = Savegame::load(&cli.savegame)?;
    if let Some(map) = &cli.map {
        savegame.set_reserved_string(strings::STARTING_MAP, map);
        savegame.set_reserved_string(strings::STARTING_POINT, "");
    }
    let controls = Controls::load(&mut savegame);
    world.insert_resource(savegame);
    world.insert_resource(controls);

    load_backend_assets(&mut world, &mut rl, &thread, &cli.data_dir);
    world.insert_non_send_resource(render_target);
    world.insert_non_send_resource(rl);
    world.insert_non_send_resource(thread);

    world.spawn(Observer::new(detector_hit_observer));
    world.flush();

    // --------------- schedules ---------------
    let mut update = Schedule::default();
    update.add_systems(systems::time::advance_clock);
    update.add_systems(systems::gameconfig::apply_gameconfig_changes);
    update.add_systems(
        (
            systems::input::update_game_key_messages,
            systems::input::update_input_state,
            game::route_keys,
            systems::hero::update_hero_key_messages,
            systems::dialog::update_dialog_key_messages,
            systems::pause::update_pause_key_messages,
        )
            .chain(),
    );
    update.add_systems(
        (
            systems::audio::update_bevy_audio_cmds,
            systems::audio::forward_audio_cmds,
            systems::audio::poll_audio_messages,
            systems::audio::update_bevy_audio_messages,
        )
            .chain(),
    );
    update.add_systems(
        (
            game::update_suspension,
            systems::time::apply_suspension,
            update_moved_messages,
            build_obstacle_index,
            systems::hero::hero_update,
            movement,
            detector_check,
            systems::hero::sword_attack,
        )
            .chain()
            .after(game::route_keys),
    );
    update.add_systems(
        (
            systems::entities::switch::switch_update,
            systems::entities::chest::chest_update,
            systems::entities::door::door_update,
            systems::entities::enemy::enemy_update,
            systems::entities::pickable::pickable_update,
            systems::entities::carried::carried_item_update,
            systems::entities::carried::boomerang_update,
            systems::entities::carried::bomb_update,
            systems::entities::carried::explosion_update,
        )
            .after(detector_check),
    );
    update.add_systems(
        (
            systems::script::npc_movement_notify,
            systems::script::script_update,
            game::treasure_update,
            game::gameover_check,
        )
            .chain()
            .after(detector_check),
    );
    update.add_systems(
        (
            (
                systems::dialog::dialog_update,
                systems::pause::pause_update,
                systems::hud::hud_update,
                systems::camera::camera_update,
            )
                .chain(),
            (
                systems::sprite::sprite_update,
                systems::entities::dynamictile::dynamic_tile_update,
                game::removal_guard,
                systems::sweep::post_update_sweep,
            )
                .chain(),
        )
            .chain()
            .after(systems::script::script_update),
    );
    update
        .initialize(&mut world)
        .expect("failed to initialize update schedule");

    let mut draw = Schedule::default();
    draw.add_systems(systems::render::render_system);
    draw.initialize(&mut world)
        .expect("failed to initialize draw schedule");

    // --------------- start the game ---------------
    game::start_game(&mut world)?;
    {
        let mut state = world.resource_mut::<GameState>();
        state.set(GameStates::Playing);
    }
    info!("game started");

    // --------------- fixed-step main loop ---------------
    let mut accumulator = 0.0f64;
    'main: loop {
        let frame_time = {
            let rl = world.non_send_resource::<raylib::RaylibHandle>();
            if rl.window_should_close() {
                break 'main;
            }
            rl.get_frame_time() as f64
        };
        accumulator += frame_time.min(0.25);

        let mut updates = 0;
        while accumulator >= STEP && updates < MAX_UPDATES_PER_FRAME {
            update.run(&mut world);
            world.clear_trackers();
            if let Err(e) = game::process_map_change(&mut world) {
                error!("map change failed: {e:#}");
            }
            if let Some(next) = world.resource_mut::<NextGameState>().take() {
                match next {
                    GameStates::Quitting => break 'main,
                    GameStates::Resetting => {
                        // restart from the saved state with some life back
                        {
                            let mut savegame = world.resource_mut::<Savegame>();
                            let max = savegame.get_reserved_integer(ints::MAX_HEARTS) * 4;
                            savegame.set_reserved_integer(ints::CURRENT_LIFE, max.min(28));
                        }
                        game::start_game(&mut world)?;
                    }
                    other => world.resource_mut::<GameState>().set(other),
                }
            }
            accumulator -= STEP;
            updates += 1;
        }
        if updates >= MAX_UPDATES_PER_FRAME {
            // drop the backlog after a long stall
            accumulator = 0.0;
        }

        // rendering is skipped while more than one update is pending
        if accumulator < 2.0 * STEP {
            draw.run(&mut world);
        }

        let (w, h) = {
            let rl = world.non_send_resource::<raylib::RaylibHandle>();
            (rl.get_screen_width(), rl.get_screen_height())
        };
        let mut window_size = world.resource_mut::<WindowSize>();
        window_size.w = w;
        window_size.h = h;
    }

    shutdown_audio(&mut world);
    Ok(())
}

/// Parse every data file of the quest into the stores.
fn load_quest_data(world: &mut World, data_dir: &Path) -> Result<()> {
    let mut items = ItemRegistry::default();
    let items_path = data_dir.join("items.json");
    if items_path.exists() {
        let json = std::fs::read_to_string(&items_path)
            .with_context(|| format!("cannot read {}", items_path.display()))?;
        items = ItemRegistry::load_json(&json)?;
    }
    world.insert_resource(items);

    let mut dialogs = DialogStore::new();
    for path in json_files(&data_dir.join("dialogs"))? {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        dialogs
            .load_json(&json)
            .with_context(|| format!("in {}", path.display()))?;
    }
    world.insert_resource(dialogs);

    let mut tilesets = TilesetStore::new();
    for path in json_files(&data_dir.join("tilesets"))? {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        tilesets
            .load_json(&json)
            .with_context(|| format!("in {}", path.display()))?;
    }
    world.insert_resource(tilesets);

    let mut animations = AnimationStore::new();
    for path in json_files(&data_dir.join("animations"))? {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        animations
            .load_json(&json)
            .with_context(|| format!("in {}", path.display()))?;
    }
    world.insert_resource(animations);

    let mut maps = MapStore::new();
    for path in json_files(&data_dir.join("maps"))? {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let data = MapData::load_json(&json).with_context(|| format!("in {}", path.display()))?;
        let script_path = data_dir.join("maps").join(format!("{}.lua", data.id));
        if script_path.exists() {
            let source = std::fs::read_to_string(&script_path)
                .with_context(|| format!("cannot read {}", script_path.display()))?;
            maps.insert_script(data.id.clone(), source);
        }
        maps.insert_map(data);
    }
    world.insert_resource(maps);
    Ok(())
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    for entry in std::fs::read_dir(dir).with_context(|| format!("cannot list {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load the textures, fonts and audio the backend needs.
fn load_backend_assets(
    world: &mut World,
    rl: &mut raylib::RaylibHandle,
    thread: &raylib::RaylibThread,
    data_dir: &Path,
) {
    let mut textures = TextureStore::new();
    let images = data_dir.join("images");
    if images.exists() {
        for entry in std::fs::read_dir(&images).into_iter().flatten().flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "png") {
                let id = path.file_stem().unwrap().to_string_lossy().to_string();
                match rl.load_texture(thread, path.to_string_lossy().as_ref()) {
                    Ok(texture) => textures.insert(id, texture),
                    Err(e) => error!("failed to load texture {}: {e}", path.display()),
                }
            }
        }
    }
    world.insert_resource(textures);

    let mut fonts = FontStore::new();
    let font_path = data_dir.join("fonts/dialog.ttf");
    if font_path.exists() {
        if let Ok(font) = rl.load_font(thread, font_path.to_string_lossy().as_ref()) {
            fonts.add("dialog", font);
        }
    }
    world.insert_non_send_resource(fonts);

    // sounds and musics go to the audio thread by id
    let mut audio_cmds = Vec::new();
    for (dir, is_music) in [("sounds", false), ("musics", true)] {
        let dir = data_dir.join(dir);
        if !dir.exists() {
            continue;
        }
        for entry in std::fs::read_dir(&dir).into_iter().flatten().flatten() {
            let path = entry.path();
            let Some(id) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            let path = path.to_string_lossy().to_string();
            audio_cmds.push(if is_music {
                AudioCmd::LoadMusic { id, path }
            } else {
                AudioCmd::LoadSound { id, path }
            });
        }
    }
    let mut messages = world.resource_mut::<Messages<AudioCmd>>();
    for cmd in audio_cmds {
        messages.write(cmd);
    }
}
