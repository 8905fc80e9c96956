//! Walking onto a teletransporter carries the hero to the target map.

mod common;

use common::*;
use emberward::components::entity::{BoundingBox, Facing, Layer};
use emberward::resources::controls::GameKey;
use emberward::resources::map::Map;
use emberward::resources::mapdata::EntityData;
use emberward::resources::mapentities::MapEntities;
use emberward::resources::script::MapScript;

#[test]
fn teletransporter_changes_map_and_keeps_facing() {
    let mut world = base_world();
    let mut schedule = build_schedule();

    let map_a = ground_map(
        "a",
        320,
        240,
        vec![
            destination("start", 100, 100),
            EntityData::Teletransporter {
                name: "warp".to_string(),
                layer: 0,
                x: 104,
                y: 100,
                width: 16,
                height: 16,
                subtype: "invisible".to_string(),
                transition: "immediate".to_string(),
                destination_map: "b".to_string(),
                destination_point: "spawn".to_string(),
            },
        ],
    );
    let mut map_b = ground_map("b", 320, 240, vec![]);
    map_b.entities.push(EntityData::Tile {
        layer: 2,
        x: 0,
        y: 0,
        width: 320,
        height: 240,
        pattern: PATTERN_GROUND,
    });
    map_b.entities.push(EntityData::Destination {
        name: "spawn".to_string(),
        layer: 2,
        x: 32,
        y: 48,
        direction: -1,
    });

    let script_b = r#"
        started_count = 0
        function event_map_started(destination)
            started_count = started_count + 1
            started_destination = destination
        end
    "#;

    start_on(&mut world, vec![map_a, map_b], vec![("b", script_b)], "a");
    run_ticks(&mut world, &mut schedule, 25);

    {
        let entities = world.resource::<MapEntities>();
        let hero = entities.hero();
        let origin = world.get::<BoundingBox>(hero).unwrap().origin_point();
        assert_eq!((origin.x, origin.y), (100, 100));
    }

    press(&mut world, GameKey::Right);
    run_ticks(&mut world, &mut schedule, 20);
    release(&mut world, GameKey::Right);
    run_ticks(&mut world, &mut schedule, 10);

    assert_eq!(world.resource::<Map>().id, "b");
    let hero = world.resource::<MapEntities>().hero();
    let origin = world.get::<BoundingBox>(hero).unwrap().origin_point();
    assert_eq!((origin.x, origin.y), (32, 48));
    assert_eq!(*world.get::<Layer>(hero).unwrap(), Layer::High);
    // the facing direction survives the teleport
    assert_eq!(world.get::<Facing>(hero).unwrap().direction, 0);

    let script = world.non_send_resource::<MapScript>();
    let count: i32 = script.lua().globals().get("started_count").unwrap();
    let destination: String = script.lua().globals().get("started_destination").unwrap();
    assert_eq!(count, 1);
    assert_eq!(destination, "spawn");
}
