//! Opening a whole door batch from a script: one sound, saved flags.

mod common;

use common::*;
use emberward::components::door::Door;
use emberward::resources::mapdata::EntityData;
use emberward::resources::mapentities::MapEntities;
use emberward::resources::savegame::Savegame;

#[test]
fn door_open_by_prefix_opens_all_with_one_sound() {
    let mut world = base_world();
    let mut schedule = build_schedule();

    let door = |name: &str, x: i32, variable: usize| EntityData::Door {
        name: name.to_string(),
        layer: 0,
        x,
        y: 0,
        direction: 1,
        subtype: "closed".to_string(),
        savegame_variable: Some(variable),
    };
    let map = ground_map(
        "a",
        320,
        240,
        vec![
            destination("start", 100, 100),
            door("d1", 80, 70),
            door("d2", 96, 71),
            door("d3", 112, 72),
        ],
    );
    let script = r#"
        function event_map_started(destination)
            sol.map.door_open("d")
        end
    "#;
    start_on(&mut world, vec![map], vec![("a", script)], "a");
    run_ticks(&mut world, &mut schedule, 30);

    let entities_names = ["d1", "d2", "d3"];
    for name in entities_names {
        let entity = world.resource::<MapEntities>().get_entity(name);
        assert!(
            world.get::<Door>(entity).unwrap().is_open(),
            "door {name} is not open"
        );
    }
    for variable in [70, 71, 72] {
        assert!(
            world.resource::<Savegame>().get_boolean(variable),
            "variable {variable} not saved"
        );
    }

    let sounds = drain_sounds(&mut world);
    assert_eq!(
        sounds.iter().filter(|id| *id == "door_open").count(),
        1,
        "expected exactly one door sound in {sounds:?}"
    );
}
