//! State transitions of the hero.
//!
//! [`set_state`] is the single door: it runs the old state's stop effects,
//! installs the new state and runs its start effects, in that order. The
//! `start_*` helpers wrap the transitions that other systems trigger (walk-
//! on detectors, scripts, the orchestrator) so every caller applies the
//! same rules.

use bevy_ecs::prelude::{Commands, Entity};

use crate::components::entity::Layer;
use crate::components::hero::{GameOverPhase, Hero, HeroState};
use crate::components::movement::Movement;
use crate::components::sprite::SpriteSet;
use crate::events::audio::AudioCmd;
use crate::geometry::Point;
use crate::resources::animations::AnimationStore;
use crate::resources::mapdata::TreasureData;

/// Install `next` as the hero's state: the old state's stop effects run
/// strictly before the new state's start effects.
pub fn set_state(
    hero: &mut Hero,
    next: HeroState,
    hero_entity: Entity,
    sprites: &mut SpriteSet,
    animations: &AnimationStore,
    commands: &mut Commands,
    now: u32,
) {
    // stop effects of the old state
    match &hero.state {
        HeroState::Pushing {
            moving_block: Some(block),
            ..
        } => {
            // the block keeps its movement; it finishes on its own
            let _ = block;
        }
        HeroState::Carrying | HeroState::Lifting { .. } => {
            // the carried item is handed over or dropped by the caller
        }
        HeroState::Jumping { .. }
        | HeroState::Hurt { .. }
        | HeroState::ReturningToSolidGround { .. }
        | HeroState::ConveyorBelt { .. } => {
            // these states installed a forced movement; restore the
            // player movement
            commands
                .entity(hero_entity)
                .insert(Movement::player(hero.normal_walking_speed, now));
        }
        _ => {}
    }

    hero.state = next;

    // start effects of the new state
    let animation = hero.state.animation();
    for sprite in &mut sprites.sprites {
        let Some(set) = animations.find(&sprite.animation_set_id) else {
            continue;
        };
        if set.has_animation(animation) {
            sprite.set_animation(animation, now, set);
        }
    }
}

/// Start a jump along an 8-direction. Used by jump sensors and scripts.
pub fn start_jumping(
    hero: &mut Hero,
    hero_entity: Entity,
    layer_after: Layer,
    direction8: i32,
    length: i32,
    ignore_obstacles: bool,
    sprites: &mut SpriteSet,
    animations: &AnimationStore,
    commands: &mut Commands,
    audio_cmds: &mut bevy_ecs::prelude::MessageWriter<AudioCmd>,
    now: u32,
) {
    set_state(
        hero,
        HeroState::Jumping {
            layer_after,
            with_water: true,
        },
        hero_entity,
        sprites,
        animations,
        commands,
        now,
    );
    commands.entity(hero_entity).insert(Movement::jump(
        direction8,
        length,
        160.0,
        ignore_obstacles,
        now,
    ));
    audio_cmds.write(AudioCmd::PlaySound { id: "jump".into() });
}

/// Hurt the hero: knock-back opposite the attacker for 200 ms, blink,
/// and start the invincibility window. The life loss (already divided by
/// the tunic) is applied by the caller.
pub fn start_hurt(
    hero: &mut Hero,
    hero_entity: Entity,
    attacker_origin: Point,
    hero_origin: Point,
    sprites: &mut SpriteSet,
    animations: &AnimationStore,
    commands: &mut Commands,
    audio_cmds: &mut bevy_ecs::prelude::MessageWriter<AudioCmd>,
    now: u32,
) {
    let end_date = now + super::HURT_DURATION;
    set_state(
        hero,
        HeroState::Hurt { end_date },
        hero_entity,
        sprites,
        animations,
        commands,
        now,
    );
    // straight push away from the attacker
    let dx = (hero_origin.x - attacker_origin.x) as f32;
    let dy = (hero_origin.y - attacker_origin.y) as f32;
    let norm = (dx * dx + dy * dy).sqrt().max(1.0);
    let speed = 120.0;
    commands.entity(hero_entity).insert(Movement::straight(
        speed * dx / norm,
        speed * dy / norm,
        24,
        now,
    ));
    hero.invincible_until = now + super::HURT_INVINCIBILITY;
    for sprite in &mut sprites.sprites {
        sprite.set_blinking(50, now);
    }
    audio_cmds.write(AudioCmd::PlaySound { id: "hero_hurt".into() });
}

/// Force a conveyor-belt displacement of one grid cell.
pub fn start_conveyor(
    hero: &mut Hero,
    hero_entity: Entity,
    direction8: i32,
    sprites: &mut SpriteSet,
    animations: &AnimationStore,
    commands: &mut Commands,
    now: u32,
) {
    set_state(
        hero,
        HeroState::ConveyorBelt { direction8 },
        hero_entity,
        sprites,
        animations,
        commands,
        now,
    );
    let path: String = char::from(b'0' + direction8 as u8).to_string();
    let mut movement = Movement::path(&path, 120.0, false, false, now);
    movement.ignore_obstacles = false;
    commands.entity(hero_entity).insert(movement);
}

/// Begin brandishing a treasure: input is locked and the game suspends
/// until the treasure dialog closes.
pub fn start_treasure(
    hero: &mut Hero,
    hero_entity: Entity,
    treasure: TreasureData,
    sprites: &mut SpriteSet,
    animations: &AnimationStore,
    commands: &mut Commands,
    audio_cmds: &mut bevy_ecs::prelude::MessageWriter<AudioCmd>,
    now: u32,
) {
    assert!(
        !matches!(hero.state, HeroState::BrandishingTreasure { .. }),
        "already brandishing a treasure"
    );
    set_state(
        hero,
        HeroState::BrandishingTreasure { treasure },
        hero_entity,
        sprites,
        animations,
        commands,
        now,
    );
    audio_cmds.write(AudioCmd::PlaySound {
        id: "treasure".into(),
    });
}

/// Begin the game-over sequence.
pub fn start_gameover(
    hero: &mut Hero,
    hero_entity: Entity,
    sprites: &mut SpriteSet,
    animations: &AnimationStore,
    commands: &mut Commands,
    now: u32,
) {
    set_state(
        hero,
        HeroState::GameOver {
            phase: GameOverPhase::Dying,
        },
        hero_entity,
        sprites,
        animations,
        commands,
        now,
    );
}

/// Script-driven freeze: the hero stops and ignores keys until unfrozen.
pub fn freeze(
    hero: &mut Hero,
    hero_entity: Entity,
    sprites: &mut SpriteSet,
    animations: &AnimationStore,
    commands: &mut Commands,
    now: u32,
) {
    set_state(
        hero,
        HeroState::Freezed,
        hero_entity,
        sprites,
        animations,
        commands,
        now,
    );
}

pub fn unfreeze(
    hero: &mut Hero,
    hero_entity: Entity,
    sprites: &mut SpriteSet,
    animations: &AnimationStore,
    commands: &mut Commands,
    now: u32,
) {
    set_state(
        hero,
        HeroState::Free,
        hero_entity,
        sprites,
        animations,
        commands,
        now,
    );
}
