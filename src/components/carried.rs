//! Entities the hero creates while fighting or carrying.

use bevy_ecs::prelude::Component;

/// A destructible lifted above the hero's head, then thrown.
#[derive(Debug, Clone, Component)]
pub struct CarriedItem {
    /// Sound and damage applied when the thrown item breaks.
    pub destruction_sound: String,
    pub damage_on_enemies: u32,
    /// False while above the hero's head, true once thrown.
    pub thrown: bool,
    /// Height above the shadow while flying.
    pub item_height: i32,
    /// Date the item breaks even without hitting anything.
    pub break_date: u32,
}

impl CarriedItem {
    pub fn new(destruction_sound: impl Into<String>) -> Self {
        CarriedItem {
            destruction_sound: destruction_sound.into(),
            damage_on_enemies: 2,
            thrown: false,
            item_height: 18,
            break_date: 0,
        }
    }
}

/// The hero's boomerang in flight.
#[derive(Debug, Clone, Component)]
pub struct Boomerang {
    pub direction8: i32,
    pub speed: f32,
    /// Flying back towards the hero.
    pub going_back: bool,
    /// Maximum distance before it turns around.
    pub max_distance: i32,
    pub distance_covered: i32,
}

impl Boomerang {
    pub fn new(direction8: i32) -> Self {
        Boomerang {
            direction8,
            speed: 160.0,
            going_back: false,
            max_distance: 120,
            distance_covered: 0,
        }
    }
}

/// A bomb waiting to explode.
#[derive(Debug, Clone, Component)]
pub struct Bomb {
    pub explosion_date: u32,
}

impl Bomb {
    /// Bombs blow 6 seconds after being dropped.
    pub fn new(now: u32) -> Self {
        Bomb {
            explosion_date: now + 6000,
        }
    }
}

/// An explosion hurting enemies and the hero, opening weak doors.
#[derive(Debug, Clone, Component)]
pub struct Explosion {
    pub end_date: u32,
}

impl Explosion {
    pub fn new(now: u32) -> Self {
        Explosion {
            end_date: now + 500,
        }
    }
}
