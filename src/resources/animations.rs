//! Animation set registry.
//!
//! Animation sets are immutable, shared data loaded once from
//! `animations/*.json` and looked up by string id. Per-instance state lives
//! in [`Sprite`](crate::components::sprite::Sprite); what is stored here is
//! the frame geometry, the frame delay, the loop point and the optional
//! pixel masks used by pixel-precise collision.

use std::sync::Arc;

use anyhow::{Context, Result};
use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rectangle};

/// One frame of an animation: where to sample the sheet.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Frame {
    pub x: i32,
    pub y: i32,
}

/// Per-direction frame list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectionFrames {
    pub frames: Vec<Frame>,
    /// Optional pixel mask per frame, one bit row string per pixel row
    /// ('1' = opaque). Present only for sprites taking part in pixel
    /// collision.
    #[serde(default)]
    pub masks: Vec<Vec<String>>,
}

/// A named animation: frame geometry shared by all directions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Animation {
    pub frame_width: i32,
    pub frame_height: i32,
    /// Origin point of each frame, from the frame's top-left.
    pub origin_x: i32,
    pub origin_y: i32,
    /// Delay between two frames in ms; 0 means a still image.
    #[serde(default)]
    pub frame_delay: u32,
    /// Frame to come back to after the last one; absent = stop there.
    #[serde(default)]
    pub loop_on_frame: Option<i32>,
    pub directions: Vec<DirectionFrames>,
}

impl Animation {
    pub fn frame_count(&self, direction: i32) -> i32 {
        self.directions[direction as usize].frames.len() as i32
    }

    /// Source rectangle of a frame in the sheet.
    pub fn frame_rect(&self, direction: i32, frame: i32) -> Rectangle {
        let f = self.directions[direction as usize].frames[frame as usize];
        Rectangle::new(f.x, f.y, self.frame_width, self.frame_height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.origin_x, self.origin_y)
    }

    /// Whether the pixel at (x, y) inside the given frame is opaque.
    /// Frames without a mask are treated as fully opaque.
    pub fn pixel(&self, direction: i32, frame: i32, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.frame_width || y >= self.frame_height {
            return false;
        }
        let dir = &self.directions[direction as usize];
        match dir.masks.get(frame as usize) {
            Some(rows) => rows
                .get(y as usize)
                .and_then(|row| row.as_bytes().get(x as usize))
                .map(|b| *b == b'1')
                .unwrap_or(false),
            None => true,
        }
    }

    pub fn has_masks(&self, direction: i32) -> bool {
        !self.directions[direction as usize].masks.is_empty()
    }
}

/// A full animation set: the animations of one sheet.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnimationSet {
    pub id: String,
    pub animations: FxHashMap<String, Animation>,
    /// Animation selected when a sprite is created on this set.
    pub default_animation: String,
}

impl AnimationSet {
    /// Fetch an animation by name. A missing animation is a data bug.
    pub fn animation(&self, name: &str) -> &Animation {
        self.animations
            .get(name)
            .unwrap_or_else(|| panic!("no animation '{name}' in set '{}'", self.id))
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }
}

/// Central registry of animation sets keyed by id.
#[derive(Resource, Default)]
pub struct AnimationStore {
    sets: FxHashMap<String, Arc<AnimationSet>>,
}

impl AnimationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, set: AnimationSet) {
        self.sets.insert(set.id.clone(), Arc::new(set));
    }

    /// Fetch a set by id; a missing set is fatal on first reference.
    pub fn get(&self, id: &str) -> &AnimationSet {
        self.sets
            .get(id)
            .unwrap_or_else(|| panic!("animation set '{id}' is not loaded"))
    }

    pub fn find(&self, id: &str) -> Option<&AnimationSet> {
        self.sets.get(id).map(|a| a.as_ref())
    }

    /// Parse and register one animation set JSON document.
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let set: AnimationSet =
            serde_json::from_str(json).context("failed to parse animation set")?;
        self.insert(set);
        Ok(())
    }
}
