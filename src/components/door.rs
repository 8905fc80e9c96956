//! Doors.

use bevy_ecs::prelude::Component;

/// What it takes to open a door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorSubtype {
    /// Only scripts open it.
    Closed,
    SmallKey,
    SmallKeyBlock,
    BigKey,
    BossKey,
    /// Blown by an explosion.
    Weak,
    VeryWeak,
    WeakBlock,
}

impl DoorSubtype {
    pub fn parse(name: &str) -> Self {
        match name {
            "closed" => DoorSubtype::Closed,
            "small_key" => DoorSubtype::SmallKey,
            "small_key_block" => DoorSubtype::SmallKeyBlock,
            "big_key" => DoorSubtype::BigKey,
            "boss_key" => DoorSubtype::BossKey,
            "weak" => DoorSubtype::Weak,
            "very_weak" => DoorSubtype::VeryWeak,
            "weak_block" => DoorSubtype::WeakBlock,
            other => panic!("unknown door subtype '{other}'"),
        }
    }

    pub fn needs_key(self) -> bool {
        matches!(
            self,
            DoorSubtype::SmallKey
                | DoorSubtype::SmallKeyBlock
                | DoorSubtype::BigKey
                | DoorSubtype::BossKey
        )
    }

    pub fn needs_explosion(self) -> bool {
        matches!(
            self,
            DoorSubtype::Weak | DoorSubtype::VeryWeak | DoorSubtype::WeakBlock
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Closed,
    Opening,
    Open,
    Closing,
}

/// A door blocking a passage until opened.
#[derive(Debug, Clone, Component)]
pub struct Door {
    pub subtype: DoorSubtype,
    pub direction: i32,
    /// Custom boolean remembering an opened door across visits.
    pub savegame_variable: Option<usize>,
    pub state: DoorState,
}

impl Door {
    pub fn new(subtype: DoorSubtype, direction: i32, savegame_variable: Option<usize>) -> Self {
        Door {
            subtype,
            direction,
            savegame_variable,
            state: DoorState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == DoorState::Open
    }

    /// Whether the door currently blocks movement. A door stops blocking
    /// as soon as it starts opening.
    pub fn is_obstacle(&self) -> bool {
        matches!(self.state, DoorState::Closed | DoorState::Closing)
    }
}
