//! Dialog reveal, variable substitution and close notification.

mod common;

use common::*;
use emberward::resources::controls::GameKey;
use emberward::resources::dialogbox::{DialogBox, PendingDialogs};
use emberward::resources::dialogs::DialogStore;
use emberward::resources::gameclock::GameSuspension;
use emberward::resources::mapdata::DialogRecord;
use emberward::resources::script::MapScript;

#[test]
fn dialog_reveals_variable_and_notifies_script_on_close() {
    let mut world = base_world();
    let mut schedule = build_schedule();

    let script = r#"
        function event_dialog_finished(dialog_id, last_answer)
            finished_id = dialog_id
            finished_answer = last_answer
        end
    "#;
    start_on(
        &mut world,
        vec![ground_map("a", 320, 240, vec![destination("start", 100, 100)])],
        vec![("a", script)],
        "a",
    );
    run_ticks(&mut world, &mut schedule, 25);

    world.resource_mut::<DialogStore>().insert(
        "intro",
        DialogRecord {
            line1: "$3Hello $v!".to_string(),
            ..Default::default()
        },
    );
    world
        .resource_mut::<DialogBox>()
        .set_variable("intro", "world");
    world
        .resource_mut::<PendingDialogs>()
        .0
        .push("intro".to_string());

    // a showing dialog suspends the game
    run_ticks(&mut world, &mut schedule, 2);
    assert!(world.resource::<GameSuspension>().suspended);

    run_ticks(&mut world, &mut schedule, 40);
    {
        let dialog_box = world.resource::<DialogBox>();
        assert_eq!(dialog_box.lines()[0], "Hello world!");
        assert!(dialog_box.is_message_finished());
    }

    press(&mut world, GameKey::Action);
    run_ticks(&mut world, &mut schedule, 3);
    release(&mut world, GameKey::Action);

    assert!(!world.resource::<DialogBox>().is_enabled());
    assert!(!world.resource::<GameSuspension>().suspended);

    let script = world.non_send_resource::<MapScript>();
    let id: String = script.lua().globals().get("finished_id").unwrap();
    let answer: i32 = script.lua().globals().get("finished_answer").unwrap();
    assert_eq!(id, "intro");
    assert_eq!(answer, -1);
}
