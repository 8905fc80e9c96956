//! Dynamic tiles.
//!
//! Static tiles are plain data inside
//! [`MapEntities`](crate::resources::mapentities::MapEntities); a dynamic
//! tile is a real entity whose obstacle footprint and visibility can be
//! toggled at runtime, by scripts or by switches.

use bevy_ecs::prelude::Component;

/// A tile whose pattern can be enabled and disabled at runtime.
#[derive(Debug, Clone, Component)]
pub struct DynamicTile {
    pub pattern_id: u32,
    pub enabled: bool,
    /// Raised when `enabled` changed and the grid must be rewritten
    /// between frames.
    pub dirty: bool,
}

impl DynamicTile {
    pub fn new(pattern_id: u32, enabled: bool) -> Self {
        DynamicTile {
            pattern_id,
            enabled,
            dirty: enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.dirty = true;
        }
    }
}
