//! Pushing a block: delay, 16-pixel move, move budget.

mod common;

use common::*;
use emberward::components::block::Block;
use emberward::components::entity::BoundingBox;
use emberward::components::hero::{Hero, HeroState};
use emberward::resources::controls::GameKey;
use emberward::resources::mapdata::EntityData;
use emberward::resources::mapentities::MapEntities;

#[test]
fn block_moves_16_pixels_once_then_refuses() {
    let mut world = base_world();
    let mut schedule = build_schedule();

    // hero spawns at origin (100, 100): box (92, 87); the block sits
    // flush against its right edge
    let map = ground_map(
        "a",
        320,
        240,
        vec![
            destination("start", 100, 100),
            EntityData::Block {
                name: "crate".to_string(),
                layer: 0,
                x: 108,
                y: 87,
                direction: -1,
                subtype: "normal".to_string(),
                maximum_moves: 1,
            },
        ],
    );
    start_on(&mut world, vec![map], vec![], "a");
    run_ticks(&mut world, &mut schedule, 25);

    let block = world.resource::<MapEntities>().get_entity("crate");
    let block_x_before = world.get::<BoundingBox>(block).unwrap().rect.x;

    // walk right into the block; the pushing animation starts at 800 ms
    press(&mut world, GameKey::Right);
    run_ticks(&mut world, &mut schedule, 30); // ~480 ms
    {
        let hero = world.resource::<MapEntities>().hero();
        let state = world.get::<Hero>(hero).unwrap().state.clone();
        assert!(matches!(state, HeroState::Free), "not pushing yet: {state:?}");
    }
    run_ticks(&mut world, &mut schedule, 25); // past 800 ms
    {
        let hero = world.resource::<MapEntities>().hero();
        let state = world.get::<Hero>(hero).unwrap().state.clone();
        assert!(matches!(state, HeroState::Pushing { .. }), "state: {state:?}");
    }

    // the 16-pixel move completes and consumes the only budget
    run_ticks(&mut world, &mut schedule, 40);
    let block_x_after = world.get::<BoundingBox>(block).unwrap().rect.x;
    assert_eq!(block_x_after, block_x_before + 16);
    assert_eq!(world.get::<Block>(block).unwrap().moves_remaining, Some(0));

    // two more seconds of pushing move nothing
    run_ticks(&mut world, &mut schedule, 130);
    release(&mut world, GameKey::Right);
    assert_eq!(
        world.get::<BoundingBox>(block).unwrap().rect.x,
        block_x_before + 16
    );
}
