//! Hero state machine scenarios: spin attack and hole recovery.

mod common;

use common::*;
use emberward::components::entity::BoundingBox;
use emberward::components::hero::{Hero, HeroState};
use emberward::components::sprite::SpriteSet;
use emberward::resources::controls::GameKey;
use emberward::resources::equipment::{Equipment, ItemRegistry};
use emberward::resources::mapdata::EntityData;
use emberward::resources::mapentities::MapEntities;
use emberward::resources::savegame::{Savegame, ints};

fn hero_state(world: &mut bevy_ecs::prelude::World) -> HeroState {
    let hero = world.resource::<MapEntities>().hero();
    world.get::<Hero>(hero).unwrap().state.clone()
}

#[test]
fn sword_press_swings_and_holding_loads_a_spin_attack() {
    let mut world = base_world();
    let mut schedule = build_schedule();
    start_on(
        &mut world,
        vec![ground_map("a", 320, 240, vec![destination("start", 100, 100)])],
        vec![],
        "a",
    );
    run_ticks(&mut world, &mut schedule, 25);
    world
        .resource_mut::<Savegame>()
        .set_reserved_integer(ints::SWORD, 2);
    drain_sounds(&mut world);

    // a short press swings and comes back to free
    press(&mut world, GameKey::Sword);
    run_ticks(&mut world, &mut schedule, 2);
    assert!(matches!(hero_state(&mut world), HeroState::SwordSwinging));
    run_ticks(&mut world, &mut schedule, 17); // ~300 ms after the press
    release(&mut world, GameKey::Sword);
    run_ticks(&mut world, &mut schedule, 12); // past the animation end
    assert!(matches!(hero_state(&mut world), HeroState::Free));

    // holding through the swing loads the sword after 1000 ms
    press(&mut world, GameKey::Sword);
    run_ticks(&mut world, &mut schedule, 30); // swing ends, loading starts
    assert!(matches!(
        hero_state(&mut world),
        HeroState::SwordLoading { loaded: false, .. }
    ));
    run_ticks(&mut world, &mut schedule, 66); // > 1000 ms of loading
    assert!(matches!(
        hero_state(&mut world),
        HeroState::SwordLoading { loaded: true, .. }
    ));
    let sounds = drain_sounds(&mut world);
    assert_eq!(
        sounds.iter().filter(|id| *id == "sword_loading").count(),
        1
    );

    // releasing a loaded sword spins, with doubled damage
    release(&mut world, GameKey::Sword);
    run_ticks(&mut world, &mut schedule, 2);
    let state = hero_state(&mut world);
    assert!(matches!(state, HeroState::SpinAttack));
    assert_eq!(state.get_sword_damage_factor(), 2);
    run_ticks(&mut world, &mut schedule, 15);
    assert!(matches!(hero_state(&mut world), HeroState::Free));
}

#[test]
fn hole_fall_returns_to_solid_ground_and_costs_two_quarters() {
    let mut world = base_world();
    let mut schedule = build_schedule();
    let mut map = ground_map("a", 320, 240, vec![destination("start", 50, 42)]);
    // a hole region below the spawn point
    map.entities.push(EntityData::Tile {
        layer: 0,
        x: 40,
        y: 48,
        width: 24,
        height: 16,
        pattern: PATTERN_HOLE,
    });
    start_on(&mut world, vec![map], vec![], "a");
    run_ticks(&mut world, &mut schedule, 30);

    let hero = world.resource::<MapEntities>().hero();
    {
        let hero_data = world.get::<Hero>(hero).unwrap();
        assert_eq!(
            hero_data.last_solid_ground.map(|(p, _)| (p.x, p.y)),
            Some((50, 42))
        );
    }
    let life_before = {
        let mut savegame = world.resource_mut::<Savegame>();
        savegame.set_reserved_integer(ints::TUNIC, 1);
        savegame.get_reserved_integer(ints::CURRENT_LIFE)
    };

    // drop the hero onto the hole, 8 px below the last solid ground
    world
        .get_mut::<BoundingBox>(hero)
        .unwrap()
        .set_origin_position(50, 50);
    run_ticks(&mut world, &mut schedule, 3);
    assert!(matches!(hero_state(&mut world), HeroState::Falling));

    // falling animation, then the slow walk back
    run_ticks(&mut world, &mut schedule, 80);
    assert!(matches!(hero_state(&mut world), HeroState::Free));
    let origin = world.get::<BoundingBox>(hero).unwrap().origin_point();
    assert_eq!((origin.x, origin.y), (50, 42));

    let life_after = world.resource_scope(|_, mut savegame: bevy_ecs::prelude::Mut<Savegame>| {
        let registry = ItemRegistry::default();
        Equipment::new(&mut savegame, &registry).get_life()
    });
    assert_eq!(life_after, life_before - 2);

    // the recovery leaves the hero blinking
    let sprites = world.get::<SpriteSet>(hero).unwrap();
    assert!(sprites.main().unwrap().is_blinking());
}
