//! Script bridge: timers, savegame space, entity operations.

mod common;

use common::*;
use emberward::components::tiles::DynamicTile;
use emberward::resources::mapdata::EntityData;
use emberward::resources::mapentities::MapEntities;
use emberward::resources::script::MapScript;

#[test]
fn timers_fire_once_and_commands_mutate_the_world() {
    let mut world = base_world();
    let mut schedule = build_schedule();

    let map = ground_map(
        "a",
        320,
        240,
        vec![
            destination("start", 100, 100),
            EntityData::DynamicTile {
                name: "bridge".to_string(),
                layer: 0,
                x: 64,
                y: 64,
                width: 16,
                height: 16,
                pattern: PATTERN_WALL,
                enabled: true,
            },
        ],
    );
    let script = r#"
        fired = 0
        function event_map_started(destination)
            sol.game.set_integer(12, 34)
            sol.timer.start("on_delay", 500, false)
        end
        function on_delay()
            fired = fired + 1
            sol.map.tile_set_enabled("bridge", false)
        end
    "#;
    start_on(&mut world, vec![map], vec![("a", script)], "a");

    // the timer starts suspended-free after the opening transition
    run_ticks(&mut world, &mut schedule, 25);
    {
        let script = world.non_send_resource::<MapScript>();
        let fired: i32 = script.lua().globals().get("fired").unwrap();
        assert_eq!(fired, 0);
        assert_eq!(script.timers.len(), 1);
    }

    run_ticks(&mut world, &mut schedule, 40);
    {
        let script = world.non_send_resource::<MapScript>();
        let fired: i32 = script.lua().globals().get("fired").unwrap();
        assert_eq!(fired, 1);
        assert!(script.timers.is_empty());
    }

    // the timer's command toggled the dynamic tile
    let bridge = world.resource::<MapEntities>().get_entity("bridge");
    assert!(!world.get::<DynamicTile>(bridge).unwrap().enabled);

    // the integer written through the command surface reads back in Lua
    run_ticks(&mut world, &mut schedule, 1);
    let script = world.non_send_resource::<MapScript>();
    let value: u32 = script
        .lua()
        .load("return sol.game.get_integer(12)")
        .eval()
        .unwrap();
    assert_eq!(value, 34);
}
