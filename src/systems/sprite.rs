//! Sprite frame clock system.

use bevy_ecs::prelude::*;

use crate::components::entity::Suspended;
use crate::components::sprite::SpriteSet;
use crate::resources::animations::AnimationStore;
use crate::resources::gameclock::GameClock;

/// Advance every sprite's frame clock, honoring per-entity suspension.
pub fn sprite_update(
    clock: Res<GameClock>,
    animations: Res<AnimationStore>,
    mut query: Query<(&mut SpriteSet, Option<&Suspended>)>,
) {
    let now = clock.now;
    for (mut sprites, suspended) in query.iter_mut() {
        let entity_suspended = suspended.is_some_and(|s| s.suspended);
        for sprite in &mut sprites.sprites {
            if entity_suspended && !sprite.ignore_suspend {
                continue;
            }
            let Some(set) = animations.find(&sprite.animation_set_id) else {
                continue;
            };
            sprite.update(now, set);
        }
    }
}
