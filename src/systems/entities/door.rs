//! Doors: opening and closing animations, saved open state.

use bevy_ecs::prelude::*;

use crate::components::door::{Door, DoorState};
use crate::components::sprite::SpriteSet;
use crate::resources::gameclock::GameSuspension;
use crate::resources::savegame::Savegame;

/// Settle opening/closing doors when their animation finished, and record
/// opened doors in the savegame.
pub fn door_update(
    suspension: Res<GameSuspension>,
    mut savegame: ResMut<Savegame>,
    mut query: Query<(&mut Door, Option<&SpriteSet>)>,
) {
    if suspension.suspended {
        return;
    }
    for (mut door, sprites) in query.iter_mut() {
        // a door settles when its opening/closing animation finished;
        // doors without one settle immediately
        let animation_done = sprites
            .and_then(|s| s.main())
            .map(|sprite| {
                sprite.finished || (sprite.animation != "opening" && sprite.animation != "closing")
            })
            .unwrap_or(true);
        match door.state {
            DoorState::Opening if animation_done => {
                door.state = DoorState::Open;
                if let Some(variable) = door.savegame_variable {
                    savegame.set_boolean(variable, true);
                }
            }
            DoorState::Closing if animation_done => {
                door.state = DoorState::Closed;
                if let Some(variable) = door.savegame_variable {
                    savegame.set_boolean(variable, false);
                }
            }
            _ => {}
        }
    }
}
