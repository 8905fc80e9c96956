//! Shared world/schedule builders for the scenario tests.
//!
//! Builds a headless world with the same systems the binary schedules
//! (input polling, audio bridge and rendering excepted) and starts games
//! through the real orchestrator path.

#![allow(dead_code)]

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;

use emberward::components::detectors::CrystalSwitchState;
use emberward::events::audio::AudioCmd;
use emberward::events::detector::EntityMoved;
use emberward::events::input::{
    DialogKeyMessage, GameKeyMessage, HeroKeyMessage, PauseKeyMessage,
};
use emberward::game;
use emberward::resources::animations::{
    Animation, AnimationSet, AnimationStore, DirectionFrames, Frame,
};
use emberward::resources::controls::{Controls, GameKey, InputEvent};
use emberward::resources::dialogbox::{DialogBox, PendingDialogs, PendingShopPurchase};
use emberward::resources::dialogs::DialogStore;
use emberward::resources::equipment::{ItemDefinition, ItemRegistry, TreasureQueue};
use emberward::resources::gameclock::{GameClock, GameSuspension};
use emberward::resources::gamestate::{GameState, NextGameState};
use emberward::resources::hud::Hud;
use emberward::resources::keyseffect::KeysEffect;
use emberward::resources::map::PendingMapChange;
use emberward::resources::mapdata::{EntityData, MapData, MapStore};
use emberward::resources::obstacles::ObstacleIndex;
use emberward::resources::pause::PauseMenu;
use emberward::resources::savegame::{Savegame, strings};
use emberward::resources::script::{MapScript, ScriptEventQueue};
use emberward::resources::tileset::{TilePattern, Tileset, TilesetData, TilesetStore};
use emberward::resources::transition::CurrentTransition;
use emberward::resources::map::Obstacle;
use emberward::systems;

/// One logical tick is 16 ms.
pub const TICK: u32 = 16;

/// Animations every hero state may select, two frames each.
const HERO_ANIMATIONS: &[&str] = &[
    "stopped",
    "walking",
    "sword",
    "sword_loading_stopped",
    "sword_loading_walking",
    "sword_tapping",
    "spin_attack",
    "grabbing",
    "pulling",
    "pushing",
    "lifting",
    "carrying_stopped",
    "carrying_walking",
    "brandish",
    "jumping",
    "hurt",
    "plunging",
    "swimming_stopped",
    "swimming_walking",
    "falling",
    "running",
    "victory",
    "bow",
    "boomerang",
    "dying",
];

fn hero_animation_set() -> AnimationSet {
    let mut animations = FxHashMap::default();
    for name in HERO_ANIMATIONS {
        // the sword swing lasts 400 ms so it outlives a 300 ms press
        let frames: i32 = if *name == "sword" { 4 } else { 2 };
        let directions = (0..4)
            .map(|_| DirectionFrames {
                frames: (0..frames).map(|i| Frame { x: i * 16, y: 0 }).collect(),
                masks: Vec::new(),
            })
            .collect();
        animations.insert(
            name.to_string(),
            Animation {
                frame_width: 16,
                frame_height: 24,
                origin_x: 8,
                origin_y: 21,
                frame_delay: 100,
                loop_on_frame: None,
                directions,
            },
        );
    }
    AnimationSet {
        id: "hero_tunic".to_string(),
        animations,
        default_animation: "stopped".to_string(),
    }
}

/// Pattern ids of the test tileset.
pub const PATTERN_GROUND: u32 = 1;
pub const PATTERN_WALL: u32 = 2;
pub const PATTERN_HOLE: u32 = 3;
pub const PATTERN_WATER: u32 = 4;

fn test_tileset() -> Tileset {
    let pattern = |id, obstacle| TilePattern {
        id,
        obstacle,
        x: 0,
        y: 0,
        width: 8,
        height: 8,
        animation: Default::default(),
    };
    Tileset::from_data(TilesetData {
        id: "test".to_string(),
        patterns: vec![
            pattern(PATTERN_GROUND, Obstacle::None),
            pattern(PATTERN_WALL, Obstacle::Full),
            pattern(PATTERN_HOLE, Obstacle::Hole),
            pattern(PATTERN_WATER, Obstacle::DeepWater),
        ],
    })
    .unwrap()
}

/// A map covered with walkable ground plus the given entities.
pub fn ground_map(id: &str, width: i32, height: i32, mut entities: Vec<EntityData>) -> MapData {
    let mut all = vec![EntityData::Tile {
        layer: 0,
        x: 0,
        y: 0,
        width,
        height,
        pattern: PATTERN_GROUND,
    }];
    all.append(&mut entities);
    MapData {
        id: id.to_string(),
        width,
        height,
        world: 0,
        floor: None,
        small_keys_variable: None,
        tileset: "test".to_string(),
        music: String::new(),
        entities: all,
    }
}

pub fn destination(name: &str, x: i32, y: i32) -> EntityData {
    EntityData::Destination {
        name: name.to_string(),
        layer: 0,
        x,
        y,
        direction: -1,
    }
}

/// Build the world with every resource the engine systems expect.
pub fn base_world() -> World {
    let mut world = World::new();
    world.insert_resource(GameClock::default());
    world.insert_resource(GameSuspension::default());
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
    world.insert_resource(Messages::<AudioCmd>::default());

    let mut animations = AnimationStore::new();
    animations.insert(hero_animation_set());
    world.insert_resource(animations);

    let mut tilesets = TilesetStore::new();
    tilesets.insert(test_tileset());
    world.insert_resource(tilesets);

    world.insert_resource(DialogStore::new());

    let mut items = ItemRegistry::default();
    items.insert(ItemDefinition {
        name: "flippers".into(),
        nb_variants: 1,
        savegame_variable: 300,
        counter: None,
        attributable: false,
        dungeon_only: false,
    });
    items.insert(ItemDefinition {
        name: "fairy".into(),
        nb_variants: 1,
        savegame_variable: 301,
        counter: None,
        attributable: false,
        dungeon_only: false,
    });
    items.insert(ItemDefinition {
        name: "sword".into(),
        nb_variants: 4,
        savegame_variable: 302,
        counter: None,
        attributable: false,
        dungeon_only: false,
    });
    world.insert_resource(items);

    let mut savegame = Savegame::in_memory();
    let controls = Controls::load(&mut savegame);
    world.insert_resource(savegame);
    world.insert_resource(controls);
    world.insert_resource(MapStore::new());

    world.insert_non_send_resource(MapScript::new().unwrap());
    world.spawn(Observer::new(systems::collision::detector_hit_observer));
    world.flush();
    world
}

/// The update schedule the binary runs, minus polling, audio and render.
pub fn build_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(systems::time::advance_clock);
    update.add_systems(
        (
            systems::input::update_game_key_messages,
            game::route_keys,
            systems::hero::update_hero_key_messages,
            systems::dialog::update_dialog_key_messages,
            systems::pause::update_pause_key_messages,
        )
            .chain(),
    );
    update.add_systems(
        (
            game::update_suspension,
            systems::time::apply_suspension,
            systems::movement::update_moved_messages,
            systems::collision::build_obstacle_index,
            systems::hero::hero_update,
            systems::movement::movement,
            systems::collision::detector_check,
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
            .chain()
            .after(systems::hero::sword_attack),
    );
    update.add_systems(
        (
            systems::script::npc_movement_notify,
            systems::script::script_update,
            game::treasure_update,
            game::gameover_check,
            systems::dialog::dialog_update,
            systems::pause::pause_update,
            systems::hud::hud_update,
            systems::camera::camera_update,
            systems::sprite::sprite_update,
            systems::entities::dynamictile::dynamic_tile_update,
            game::removal_guard,
            systems::sweep::post_update_sweep,
        )
            .chain()
            .after(systems::entities::carried::explosion_update),
    );
    update
}

/// Register the maps and start the game on `map_id`.
pub fn start_on(world: &mut World, maps: Vec<MapData>, scripts: Vec<(&str, &str)>, map_id: &str) {
    {
        let mut store = world.resource_mut::<MapStore>();
        for map in maps {
            store.insert_map(map);
        }
        for (id, source) in scripts {
            store.insert_script(id, source);
        }
    }
    {
        let mut savegame = world.resource_mut::<Savegame>();
        savegame.set_reserved_string(strings::STARTING_MAP, map_id);
        savegame.set_reserved_string(strings::STARTING_POINT, "start");
    }
    game::start_game(world).unwrap();
}

/// Run `n` logical ticks through the schedule and the orchestrator.
pub fn run_ticks(world: &mut World, schedule: &mut Schedule, n: u32) {
    for _ in 0..n {
        schedule.run(world);
        world.clear_trackers();
        game::process_map_change(world).unwrap();
        if let Some(next) = world.resource_mut::<NextGameState>().take() {
            world.resource_mut::<GameState>().set(next);
        }
    }
}

/// Simulate a low-level key press of a logical key.
pub fn press(world: &mut World, key: GameKey) {
    feed(world, key, true);
}

pub fn release(world: &mut World, key: GameKey) {
    feed(world, key, false);
}

fn feed(world: &mut World, key: GameKey, pressed: bool) {
    let code = world
        .resource::<Controls>()
        .keyboard_code(key)
        .expect("key not bound");
    let event = if pressed {
        InputEvent::KeyPressed { code }
    } else {
        InputEvent::KeyReleased { code }
    };
    let routed = world.resource_scope(|world, mut controls: Mut<Controls>| {
        let mut savegame = world.resource_mut::<Savegame>();
        controls.handle_event(&event, &mut savegame)
    });
    if let Some((key, pressed)) = routed {
        world
            .resource_mut::<Messages<GameKeyMessage>>()
            .write(GameKeyMessage { key, pressed });
    }
}

/// Drain every queued audio command.
pub fn drain_sounds(world: &mut World) -> Vec<String> {
    world
        .resource_mut::<Messages<AudioCmd>>()
        .drain()
        .filter_map(|cmd| match cmd {
            AudioCmd::PlaySound { id } => Some(id),
            _ => None,
        })
        .collect()
}
