//! Non-playing characters and other interactive entities.

use bevy_ecs::prelude::Component;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcSubtype {
    /// Fires `event_npc_dialog` or shows its message on action.
    Custom,
    /// Turns towards the hero and speaks.
    GeneralizedNpc,
}

impl NpcSubtype {
    pub fn parse(name: &str) -> Self {
        match name {
            "custom" => NpcSubtype::Custom,
            "generalized_npc" => NpcSubtype::GeneralizedNpc,
            other => panic!("unknown npc subtype '{other}'"),
        }
    }
}

/// An entity the hero can talk to or examine.
#[derive(Debug, Clone, Component)]
pub struct Npc {
    pub subtype: NpcSubtype,
    /// Dialog started on action; `None` asks the script instead.
    pub message: Option<String>,
}

impl Npc {
    pub fn new(subtype: NpcSubtype, message: Option<String>) -> Self {
        Npc { subtype, message }
    }
}
