//! Logical screen size.
//!
//! The fixed 320×240 resolution every map, HUD and overlay coordinate is
//! expressed in.

use bevy_ecs::prelude::Resource;

/// Logical render size in pixels.
#[derive(Resource, Clone, Copy)]
pub struct ScreenSize {
    pub w: i32,
    pub h: i32,
}

impl Default for ScreenSize {
    fn default() -> Self {
        ScreenSize { w: 320, h: 240 }
    }
}
