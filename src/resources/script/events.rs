//! Events the engine delivers to the map script.
//!
//! Systems push events into the [`ScriptEventQueue`] where they originate;
//! the script system delivers them in order within the same tick, calling
//! the matching `event_*` Lua function.

use bevy_ecs::prelude::Resource;

/// One engine-to-script notification.
#[derive(Debug, Clone)]
pub enum ScriptEvent {
    MapStarted { destination: String },
    MapOpeningTransitionFinished,
    MessageStarted { dialog_id: String },
    DialogStarted { dialog_id: String },
    DialogFinished { dialog_id: String, last_answer: i32 },
    EntityOnDetector { detector: String, entity: String },
    NpcDialog { name: String },
    NpcMovementFinished { name: String },
    CameraReachedTarget,
    /// Item scripts share the map script space.
    ItemObtained { item: String, variant: u32 },
    ItemUsed { item: String },
}

/// Pending engine-to-script events, drained by `systems::script`.
#[derive(Resource, Debug, Clone, Default)]
pub struct ScriptEventQueue(pub Vec<ScriptEvent>);

impl ScriptEventQueue {
    pub fn push(&mut self, event: ScriptEvent) {
        self.0.push(event);
    }
}
