//! Clock advance and suspension bookkeeping.

use bevy_ecs::prelude::*;

use crate::components::entity::Suspended;
use crate::components::movement::Movement;
use crate::components::sprite::SpriteSet;
use crate::resources::gameclock::{GameClock, GameSuspension};

/// Advance the logical clock by one tick. Runs first in the schedule.
pub fn advance_clock(mut clock: ResMut<GameClock>) {
    clock.advance();
}

/// Propagate the game-wide suspension flag to every entity: freeze or
/// resume movements, and shift sprite frame clocks by the suspension
/// duration on resume.
pub fn apply_suspension(
    clock: Res<GameClock>,
    suspension: Res<GameSuspension>,
    mut query: Query<(&mut Suspended, Option<&mut Movement>, Option<&mut SpriteSet>)>,
) {
    let now = clock.now;
    for (mut suspended, movement, sprites) in query.iter_mut() {
        if suspended.suspended == suspension.suspended {
            continue;
        }
        suspended.suspended = suspension.suspended;
        if suspension.suspended {
            suspended.since = now;
        }
        if let Some(mut movement) = movement {
            movement.set_suspended(suspension.suspended, now);
        }
        if let Some(mut sprites) = sprites {
            if !suspension.suspended {
                let offset = now - suspended.since;
                for sprite in &mut sprites.sprites {
                    if !sprite.ignore_suspend {
                        sprite.shift_dates(offset);
                    }
                }
            }
        }
    }
}
