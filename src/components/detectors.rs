//! Detector components.
//!
//! A detector runs a collision callback when another entity overlaps it
//! according to its collision modes. The dispatch itself lives in
//! `systems::collision`; these components carry the per-kind data.

use bevy_ecs::prelude::Component;

use crate::resources::transition::TransitionStyle;

/// Overlap predicates a detector can subscribe to, as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollisionModes(u8);

impl CollisionModes {
    pub const RECTANGLE: CollisionModes = CollisionModes(0x01);
    pub const ORIGIN_POINT: CollisionModes = CollisionModes(0x02);
    pub const FACING_POINT: CollisionModes = CollisionModes(0x04);
    pub const SPRITE: CollisionModes = CollisionModes(0x08);
    pub const CONTAINING: CollisionModes = CollisionModes(0x10);
    pub const CENTER: CollisionModes = CollisionModes(0x20);
    pub const CUSTOM: CollisionModes = CollisionModes(0x40);

    pub const fn union(self, other: CollisionModes) -> CollisionModes {
        CollisionModes(self.0 | other.0)
    }

    pub fn contains(self, other: CollisionModes) -> bool {
        self.0 & other.0 != 0
    }
}

/// One mode of the mask, reported to the collision callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionMode {
    Rectangle,
    OriginPoint,
    FacingPoint,
    Sprite,
    Containing,
    Center,
    Custom,
}

impl CollisionMode {
    pub const ALL: [CollisionMode; 7] = [
        CollisionMode::Rectangle,
        CollisionMode::OriginPoint,
        CollisionMode::FacingPoint,
        CollisionMode::Sprite,
        CollisionMode::Containing,
        CollisionMode::Center,
        CollisionMode::Custom,
    ];

    pub fn flag(self) -> CollisionModes {
        match self {
            CollisionMode::Rectangle => CollisionModes::RECTANGLE,
            CollisionMode::OriginPoint => CollisionModes::ORIGIN_POINT,
            CollisionMode::FacingPoint => CollisionModes::FACING_POINT,
            CollisionMode::Sprite => CollisionModes::SPRITE,
            CollisionMode::Containing => CollisionModes::CONTAINING,
            CollisionMode::Center => CollisionModes::CENTER,
            CollisionMode::Custom => CollisionModes::CUSTOM,
        }
    }
}

/// Collision subscription of a detecting entity.
#[derive(Debug, Clone, Copy, Component)]
pub struct Detector {
    pub modes: CollisionModes,
    /// Test entities of every layer, not only the detector's.
    pub layer_ignored: bool,
}

impl Detector {
    pub fn new(modes: CollisionModes) -> Self {
        Detector {
            modes,
            layer_ignored: false,
        }
    }
}

/// A named spawn anchor.
#[derive(Debug, Clone, Component)]
pub struct Destination {
    /// Direction the hero takes on arrival, -1 to keep the current one.
    pub direction: i32,
}

/// Triggers a map transition to a (map, destination point) pair.
#[derive(Debug, Clone, Component)]
pub struct Teletransporter {
    pub visible: bool,
    pub transition: TransitionStyle,
    pub destination_map: String,
    pub destination_point: String,
    /// Sound played when taken; empty for none.
    pub sound: String,
}

/// Sensor behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorSubtype {
    /// Notifies the map script.
    Custom,
    /// Moves the overlapping hero one layer up or down.
    ChangeLayer,
    /// Records a recovery point used when falling in a hole.
    ReturnFromBadGround,
}

/// An invisible area reacting to the hero walking on it.
#[derive(Debug, Clone, Component)]
pub struct Sensor {
    pub subtype: SensorSubtype,
    /// Whether the hero is currently inside, to fire activation once.
    pub activated: bool,
}

/// Makes the hero jump in a fixed direction when crossed.
#[derive(Debug, Clone, Component)]
pub struct JumpSensor {
    pub direction8: i32,
    pub jump_length: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StairsSubtype {
    SpiralUpstairs,
    SpiralDownstairs,
    StraightUpstairs,
    StraightDownstairs,
    /// Stairs inside a single floor, changing layer only.
    InsideFloor,
}

impl StairsSubtype {
    pub fn parse(name: &str) -> Self {
        match name {
            "spiral_upstairs" => StairsSubtype::SpiralUpstairs,
            "spiral_downstairs" => StairsSubtype::SpiralDownstairs,
            "straight_upstairs" => StairsSubtype::StraightUpstairs,
            "straight_downstairs" => StairsSubtype::StraightDownstairs,
            "inside_floor" => StairsSubtype::InsideFloor,
            other => panic!("unknown stairs subtype '{other}'"),
        }
    }

    pub fn goes_up(self) -> bool {
        matches!(
            self,
            StairsSubtype::SpiralUpstairs | StairsSubtype::StraightUpstairs
        )
    }
}

/// Stairs force a short path movement and commit a layer change.
#[derive(Debug, Clone, Component)]
pub struct Stairs {
    pub subtype: StairsSubtype,
    pub direction: i32,
}

/// A switch the hero (or a block) can activate.
#[derive(Debug, Clone, Component)]
pub struct Switch {
    pub visible: bool,
    /// Only a block can press it.
    pub needs_block: bool,
    /// Deactivates when the presser leaves.
    pub disabled_when_leaving: bool,
    pub enabled: bool,
    /// A locked switch keeps its state whatever happens.
    pub locked: bool,
}

/// Inverts the raised crystal-switch-block color when hit.
#[derive(Debug, Clone, Component)]
pub struct CrystalSwitch {
    /// Cooldown so one sword swing toggles it once.
    pub next_toggle_date: u32,
}

/// One of the two colors of raisable blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrystalSwitchBlockColor {
    Orange,
    Blue,
}

/// A block raised or lowered by the map-wide crystal switch state.
#[derive(Debug, Clone, Component)]
pub struct CrystalSwitchBlock {
    pub color: CrystalSwitchBlockColor,
}

/// Pushes the hero along its direction on contact.
#[derive(Debug, Clone, Component)]
pub struct ConveyorBelt {
    pub direction8: i32,
}

/// Blocks a configurable subset of entity kinds.
#[derive(Debug, Clone, Component)]
pub struct CustomObstacle {
    pub stops_hero: bool,
    pub stops_enemies: bool,
    pub stops_npcs: bool,
    pub stops_blocks: bool,
}

/// Map-wide crystal switch state: which block color is raised.
#[derive(bevy_ecs::prelude::Resource, Debug, Clone, Copy)]
pub struct CrystalSwitchState {
    pub orange_raised: bool,
}

impl Default for CrystalSwitchState {
    fn default() -> Self {
        // blue blocks start raised
        CrystalSwitchState {
            orange_raised: false,
        }
    }
}

impl CrystalSwitchState {
    pub fn is_raised(&self, color: CrystalSwitchBlockColor) -> bool {
        match color {
            CrystalSwitchBlockColor::Orange => self.orange_raised,
            CrystalSwitchBlockColor::Blue => !self.orange_raised,
        }
    }

    pub fn toggle(&mut self) {
        self.orange_raised = !self.orange_raised;
    }
}
