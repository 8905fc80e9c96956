//! The hero entity and its state sum type.
//!
//! The hero is a map entity whose behavior is one of ~25 exclusive states.
//! The state data lives here; the per-state behavior (start/stop/update and
//! the key handlers) is in `systems::hero`. The query hooks below are the
//! capability table of the machine: each state answers a fixed set of
//! questions with a default, and the collision, ground and damage code asks
//! the current state instead of testing state names.

use bevy_ecs::prelude::{Component, Entity};

use crate::components::entity::Layer;
use crate::geometry::Point;
use crate::resources::map::Ground;
use crate::resources::mapdata::TreasureData;

/// Phase of the game-over sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverPhase {
    /// The hero spins and collapses.
    Dying,
    /// A fairy from a bottle is reviving the hero.
    Resurrecting,
    /// Waiting for the save/continue menu outcome.
    Menu,
}

/// The exclusive states of the hero.
#[derive(Debug, Clone)]
pub enum HeroState {
    Free,
    Carrying,
    SwordSwinging,
    SwordLoading {
        /// Date the loading started; the sword is loaded after 1000 ms.
        since: u32,
        loaded: bool,
    },
    SwordTapping {
        next_sound_date: u32,
    },
    SpinAttack,
    Grabbing,
    Pulling,
    Pushing {
        /// Date the push against the obstacle started.
        since: u32,
        /// Block currently being moved, while a movement is attached to it.
        moving_block: Option<Entity>,
    },
    Lifting {
        lifted: Entity,
    },
    BrandishingTreasure {
        treasure: TreasureData,
    },
    Jumping {
        /// Layer committed when landing.
        layer_after: Layer,
        /// Whether water at the landing point triggers plunging.
        with_water: bool,
    },
    Hurt {
        end_date: u32,
    },
    Plunging,
    Swimming,
    Falling,
    ReturningToSolidGround {
        target: Point,
        target_layer: Layer,
    },
    UsingInventoryItem {
        item: String,
    },
    Freezed,
    ConveyorBelt {
        direction8: i32,
    },
    Running {
        since: u32,
    },
    Victory,
    Bow,
    Boomerang,
    GameOver {
        phase: GameOverPhase,
    },
}

impl HeroState {
    /// Name of the tunic animation this state plays while idle in it.
    pub fn animation(&self) -> &'static str {
        match self {
            HeroState::Free => "stopped",
            HeroState::Carrying => "carrying_stopped",
            HeroState::SwordSwinging => "sword",
            HeroState::SwordLoading { .. } => "sword_loading_stopped",
            HeroState::SwordTapping { .. } => "sword_tapping",
            HeroState::SpinAttack => "spin_attack",
            HeroState::Grabbing => "grabbing",
            HeroState::Pulling => "pulling",
            HeroState::Pushing { .. } => "pushing",
            HeroState::Lifting { .. } => "lifting",
            HeroState::BrandishingTreasure { .. } => "brandish",
            HeroState::Jumping { .. } => "jumping",
            HeroState::Hurt { .. } => "hurt",
            HeroState::Plunging => "plunging",
            HeroState::Swimming => "swimming_stopped",
            HeroState::Falling => "falling",
            HeroState::ReturningToSolidGround { .. } => "walking",
            HeroState::UsingInventoryItem { .. } => "stopped",
            HeroState::Freezed => "stopped",
            HeroState::ConveyorBelt { .. } => "walking",
            HeroState::Running { .. } => "running",
            HeroState::Victory => "victory",
            HeroState::Bow => "bow",
            HeroState::Boomerang => "boomerang",
            HeroState::GameOver { .. } => "dying",
        }
    }

    /// Whether reaching 0 life in this state triggers the game-over
    /// sequence. The bad-ground states finish their job first.
    pub fn can_start_gameover_sequence(&self) -> bool {
        !matches!(
            self,
            HeroState::Hurt { .. }
                | HeroState::Plunging
                | HeroState::Falling
                | HeroState::ReturningToSolidGround { .. }
        )
    }

    /// Whether the hero touches the ground; airborne states ignore most
    /// ground effects.
    pub fn is_touching_ground(&self) -> bool {
        !matches!(
            self,
            HeroState::Jumping { .. }
                | HeroState::Hurt { .. }
                | HeroState::Falling
                | HeroState::ReturningToSolidGround { .. }
        )
    }

    pub fn can_avoid_deep_water(&self) -> bool {
        !self.is_touching_ground() || matches!(self, HeroState::Plunging | HeroState::Swimming)
    }

    pub fn can_avoid_hole(&self) -> bool {
        !self.is_touching_ground() || matches!(self, HeroState::Falling)
    }

    pub fn can_avoid_teletransporter(&self) -> bool {
        matches!(
            self,
            HeroState::Jumping { .. } | HeroState::Falling | HeroState::Hurt { .. }
        )
    }

    pub fn can_avoid_conveyor_belt(&self) -> bool {
        !matches!(
            self,
            HeroState::Free | HeroState::Carrying | HeroState::Running { .. }
        )
    }

    /// Whether sensors block this state instead of firing.
    pub fn is_sensor_obstacle(&self) -> bool {
        // a jumping hero must not land inside a change-layer sensor
        matches!(self, HeroState::Jumping { .. })
    }

    pub fn can_avoid_sensor(&self) -> bool {
        matches!(self, HeroState::GameOver { .. })
    }

    pub fn can_be_hurt(&self) -> bool {
        matches!(
            self,
            HeroState::Free
                | HeroState::Carrying
                | HeroState::SwordSwinging
                | HeroState::SwordLoading { .. }
                | HeroState::SwordTapping { .. }
                | HeroState::SpinAttack
                | HeroState::Grabbing
                | HeroState::Pulling
                | HeroState::Pushing { .. }
                | HeroState::Running { .. }
                | HeroState::Swimming
                | HeroState::ConveyorBelt { .. }
                | HeroState::UsingInventoryItem { .. }
                | HeroState::Bow
                | HeroState::Boomerang
        )
    }

    /// States that keep the sprite direction fixed while moving.
    pub fn is_direction_locked(&self) -> bool {
        matches!(
            self,
            HeroState::SwordLoading { .. }
                | HeroState::SwordTapping { .. }
                | HeroState::Grabbing
                | HeroState::Pulling
                | HeroState::Pushing { .. }
                | HeroState::Running { .. }
        )
    }

    pub fn is_grabbing_or_pulling(&self) -> bool {
        matches!(self, HeroState::Grabbing | HeroState::Pulling)
    }

    pub fn is_moving_grabbed_entity(&self) -> bool {
        matches!(
            self,
            HeroState::Pushing {
                moving_block: Some(_),
                ..
            }
        ) || matches!(self, HeroState::Pulling)
    }

    pub fn can_start_sword(&self) -> bool {
        matches!(
            self,
            HeroState::Free | HeroState::SwordSwinging | HeroState::Carrying
        )
    }

    pub fn can_start_item(&self) -> bool {
        matches!(self, HeroState::Free)
    }

    pub fn can_sword_hit_crystal_switch(&self) -> bool {
        matches!(
            self,
            HeroState::SwordSwinging | HeroState::SpinAttack | HeroState::SwordTapping { .. }
        )
    }

    /// Damage multiplier of the sword in this state.
    pub fn get_sword_damage_factor(&self) -> u32 {
        match self {
            HeroState::SpinAttack => 2,
            _ => 1,
        }
    }

    pub fn is_hero_visible(&self) -> bool {
        !matches!(
            self,
            HeroState::GameOver {
                phase: GameOverPhase::Menu
            }
        )
    }

    /// Whether the player movement reads the directional keys.
    pub fn is_free_to_move(&self) -> bool {
        matches!(
            self,
            HeroState::Free | HeroState::Carrying | HeroState::Swimming
        )
    }
}

/// The hero component.
#[derive(Debug, Clone, Component)]
pub struct Hero {
    pub state: HeroState,
    /// Ground kind currently under the feet.
    pub ground: Ground,
    /// Last position where the ground was safe, for fall recovery.
    pub last_solid_ground: Option<(Point, Layer)>,
    /// Forced recovery point set by a return-from-bad-ground sensor.
    pub target_solid_ground: Option<(Point, Layer)>,
    /// Detector currently in front of the hero, if any.
    pub facing_entity: Option<Entity>,
    /// Entity being grabbed, pushed or pulled.
    pub grabbed_entity: Option<Entity>,
    /// Carried item entity while lifting/carrying.
    pub lifted_item: Option<Entity>,
    /// Carried item entity while it flies.
    pub thrown_item: Option<Entity>,
    /// Walking speed in px/s before modifiers.
    pub normal_walking_speed: f32,
    /// Teletransporter queued while a bad-ground recovery is running.
    pub delayed_teletransporter: Option<Entity>,
    /// Date blinking invincibility ends, 0 when vulnerable.
    pub invincible_until: u32,
    /// Date the hero started walking into an obstacle, for the pushing
    /// animation delay.
    pub pushing_since: Option<u32>,
}

impl Hero {
    /// Hero box is 16×16 with the origin at the feet.
    pub const SIZE: i32 = 16;
    pub const ORIGIN_X: i32 = 8;
    pub const ORIGIN_Y: i32 = 13;
    pub const WALKING_SPEED: f32 = 88.0;

    pub fn new() -> Self {
        Hero {
            state: HeroState::Free,
            ground: Ground::Normal,
            last_solid_ground: None,
            target_solid_ground: None,
            facing_entity: None,
            grabbed_entity: None,
            lifted_item: None,
            thrown_item: None,
            normal_walking_speed: Self::WALKING_SPEED,
            delayed_teletransporter: None,
            invincible_until: 0,
            pushing_since: None,
        }
    }
}

impl Default for Hero {
    fn default() -> Self {
        Self::new()
    }
}
