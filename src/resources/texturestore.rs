//! Loaded texture store.
//!
//! Sprite sheets and tileset images keyed by the logical id of the
//! animation set or tileset that samples them. Loaded during setup, read by
//! the render system.

use bevy_ecs::prelude::Resource;
use raylib::prelude::Texture2D;
use rustc_hash::FxHashMap;

/// Map of texture ids to loaded textures.
#[derive(Resource, Default)]
pub struct TextureStore {
    map: FxHashMap<String, Texture2D>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: impl AsRef<str>) -> Option<&Texture2D> {
        self.map.get(id.as_ref())
    }

    pub fn insert(&mut self, id: impl Into<String>, texture: Texture2D) {
        self.map.insert(id.into(), texture);
    }
}
