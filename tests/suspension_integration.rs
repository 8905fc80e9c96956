//! Suspension: the pause menu freezes movements, sprites and timers.

mod common;

use common::*;
use emberward::components::entity::BoundingBox;
use emberward::components::sprite::SpriteSet;
use emberward::resources::controls::GameKey;
use emberward::resources::gameclock::GameSuspension;
use emberward::resources::mapdata::EntityData;
use emberward::resources::mapentities::MapEntities;
use emberward::resources::pause::PauseMenu;
use emberward::resources::script::MapScript;

#[test]
fn pausing_freezes_the_world_and_resume_shifts_dates() {
    let mut world = base_world();
    let mut schedule = build_schedule();

    let map = ground_map(
        "a",
        320,
        240,
        vec![
            destination("start", 100, 100),
            EntityData::Npc {
                name: "walker".to_string(),
                layer: 0,
                x: 200,
                y: 100,
                direction: 0,
                subtype: "custom".to_string(),
                sprite: None,
                message: None,
            },
        ],
    );
    let script = r#"
        function event_map_started(destination)
            sol.map.npc_walk("walker", "00000000", false, false)
            sol.timer.start("on_timer", 2000, false)
        end
        function on_timer()
            timer_fired = true
        end
    "#;
    start_on(&mut world, vec![map], vec![("a", script)], "a");
    run_ticks(&mut world, &mut schedule, 30);

    let walker = world.resource::<MapEntities>().get_entity("walker");
    let x_moving = world.get::<BoundingBox>(walker).unwrap().rect.x;

    // pause: nothing advances while the menu is open
    press(&mut world, GameKey::Pause);
    run_ticks(&mut world, &mut schedule, 2);
    assert!(world.resource::<PauseMenu>().open);
    assert!(world.resource::<GameSuspension>().suspended);

    let x_paused = world.get::<BoundingBox>(walker).unwrap().rect.x;
    let frame_paused = {
        let hero = world.resource::<MapEntities>().hero();
        world.get::<SpriteSet>(hero).unwrap().main().unwrap().frame
    };
    run_ticks(&mut world, &mut schedule, 60);
    assert_eq!(world.get::<BoundingBox>(walker).unwrap().rect.x, x_paused);
    {
        let hero = world.resource::<MapEntities>().hero();
        let sprites = world.get::<SpriteSet>(hero).unwrap();
        assert_eq!(sprites.main().unwrap().frame, frame_paused);
    }
    {
        let script = world.non_send_resource::<MapScript>();
        assert!(script.timers[0].suspended);
    }

    // closing the menu resumes everything where it stopped
    press(&mut world, GameKey::Pause);
    run_ticks(&mut world, &mut schedule, 10);
    assert!(!world.resource::<PauseMenu>().open);
    assert!(
        world.get::<BoundingBox>(walker).unwrap().rect.x > x_paused || x_paused > x_moving,
        "the walker never moved at all"
    );
}
