//! Dialog store.
//!
//! Dialogs are chains of message records keyed by id, loaded once per
//! language from `dialogs/*.json`. The records are pre-resolved strings; no
//! localization work happens at runtime.

use anyhow::{Context, Result};
use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;

use crate::resources::mapdata::DialogRecord;

/// Every dialog record of the current language.
#[derive(Resource, Default)]
pub struct DialogStore {
    records: FxHashMap<String, DialogRecord>,
}

impl DialogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, record: DialogRecord) {
        self.records.insert(id.into(), record);
    }

    /// Fetch a record; a missing dialog id is fatal on first reference.
    pub fn get(&self, id: &str) -> &DialogRecord {
        self.records
            .get(id)
            .unwrap_or_else(|| panic!("no dialog with id '{id}'"))
    }

    pub fn has(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let records: FxHashMap<String, DialogRecord> =
            serde_json::from_str(json).context("failed to parse dialogs file")?;
        self.records.extend(records);
        Ok(())
    }
}
