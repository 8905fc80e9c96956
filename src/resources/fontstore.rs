//! Font store.
//!
//! NonSend resource holding the loaded fonts by id: raylib fonts are GPU
//! handles and must stay on the main thread. The dialog box and the HUD
//! counters reference fonts by id.

use raylib::prelude::Font;
use rustc_hash::FxHashMap;

/// Map of font ids to loaded fonts.
pub struct FontStore {
    fonts: FxHashMap<String, Font>,
}

impl FontStore {
    pub fn new() -> Self {
        FontStore {
            fonts: FxHashMap::default(),
        }
    }

    pub fn add(&mut self, id: impl Into<String>, font: Font) {
        self.fonts.insert(id.into(), font);
    }

    pub fn get(&self, id: impl AsRef<str>) -> Option<&Font> {
        self.fonts.get(id.as_ref())
    }
}

impl Default for FontStore {
    fn default() -> Self {
        Self::new()
    }
}
