//! Tileset data: the patterns static and dynamic tiles reference.
//!
//! A pattern describes one drawable block of the tileset sheet: its source
//! rectangle, its obstacle kind and its animation style. Pattern sizes are
//! multiples of 8 so their footprint maps exactly onto the obstacle grid.

use anyhow::{Context, Result, ensure};
use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::geometry::Rectangle;
use crate::resources::map::Obstacle;

/// How a pattern animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternAnimation {
    /// A plain static block.
    #[default]
    None,
    /// Three frames played 1-2-3-2 like water and flowers.
    Sequence3,
    /// Drawn shifted against the camera.
    Parallax,
    /// Texture scrolls inside the block.
    SelfScrolling,
}

/// One pattern of a tileset.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TilePattern {
    pub id: u32,
    pub obstacle: Obstacle,
    /// Source position in the tileset sheet.
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub animation: PatternAnimation,
}

impl TilePattern {
    /// Source rectangle of the frame to draw at clock date `now`.
    pub fn frame_rect(&self, now: u32) -> Rectangle {
        let frame = match self.animation {
            PatternAnimation::Sequence3 => [0, 1, 2, 1][(now / 250 % 4) as usize],
            _ => 0,
        };
        Rectangle::new(self.x + frame * self.width, self.y, self.width, self.height)
    }
}

/// A named tileset: its sheet id and its patterns.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TilesetData {
    pub id: String,
    pub patterns: Vec<TilePattern>,
}

/// Loaded tileset with patterns indexed by id.
#[derive(Debug, Clone)]
pub struct Tileset {
    pub id: String,
    patterns: FxHashMap<u32, TilePattern>,
}

impl Tileset {
    pub fn from_data(data: TilesetData) -> Result<Self> {
        let mut patterns = FxHashMap::default();
        for pattern in data.patterns {
            ensure!(
                pattern.width % 8 == 0 && pattern.height % 8 == 0,
                "pattern {} of tileset '{}' is not a multiple of 8",
                pattern.id,
                data.id
            );
            patterns.insert(pattern.id, pattern);
        }
        Ok(Tileset {
            id: data.id,
            patterns,
        })
    }

    /// Fetch a pattern; referencing a missing pattern is fatal.
    pub fn pattern(&self, id: u32) -> &TilePattern {
        self.patterns
            .get(&id)
            .unwrap_or_else(|| panic!("no pattern {id} in tileset '{}'", self.id))
    }
}

/// Registry of loaded tilesets keyed by id.
#[derive(Resource, Default)]
pub struct TilesetStore {
    map: FxHashMap<String, Tileset>,
}

impl TilesetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tileset: Tileset) {
        self.map.insert(tileset.id.clone(), tileset);
    }

    pub fn get(&self, id: &str) -> &Tileset {
        self.map
            .get(id)
            .unwrap_or_else(|| panic!("tileset '{id}' is not loaded"))
    }

    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let data: TilesetData = serde_json::from_str(json).context("failed to parse tileset")?;
        self.insert(Tileset::from_data(data)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence3_plays_1_2_3_2() {
        let pattern = TilePattern {
            id: 1,
            obstacle: Obstacle::None,
            x: 0,
            y: 0,
            width: 16,
            height: 16,
            animation: PatternAnimation::Sequence3,
        };
        assert_eq!(pattern.frame_rect(0).x, 0);
        assert_eq!(pattern.frame_rect(250).x, 16);
        assert_eq!(pattern.frame_rect(500).x, 32);
        assert_eq!(pattern.frame_rect(750).x, 16);
        assert_eq!(pattern.frame_rect(1000).x, 0);
    }

    #[test]
    fn non_multiple_of_8_is_rejected() {
        let data = TilesetData {
            id: "bad".into(),
            patterns: vec![TilePattern {
                id: 1,
                obstacle: Obstacle::None,
                x: 0,
                y: 0,
                width: 12,
                height: 16,
                animation: PatternAnimation::None,
            }],
        };
        assert!(Tileset::from_data(data).is_err());
    }
}
