//! Detector collision events.
//!
//! After a successful position update, the collision system walks the
//! detectors and triggers one [`DetectorHit`] per (detector, entity, mode)
//! whose overlap predicate holds. The observer in `systems::collision`
//! dispatches to the detector kind's behavior.

use bevy_ecs::message::Message;
use bevy_ecs::prelude::{Entity, Event};

use crate::components::detectors::CollisionMode;

/// An entity changed position this tick; the detector check runs on it.
#[derive(Message, Debug, Clone, Copy)]
pub struct EntityMoved {
    pub entity: Entity,
}

/// An entity satisfied one collision mode of a detector.
#[derive(Event, Debug, Clone, Copy)]
pub struct DetectorHit {
    pub detector: Entity,
    pub other: Entity,
    pub mode: CollisionMode,
}
