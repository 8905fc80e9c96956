//! The current map: metadata, camera and the tile obstacle grid.
//!
//! The grid holds one [`Obstacle`] per 8×8 cell and per layer, populated at
//! map load from the static tiles and toggled by dynamic tiles between
//! frames. Collision queries walk the cells overlapped by a candidate box;
//! ground kinds (water, holes, ladders) are returned as [`Ground`] instead
//! of hard obstacles and it is the hero state that decides their effect.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::geometry::Rectangle;

/// Obstacle kind of one 8×8 grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Obstacle {
    #[default]
    None,
    Full,
    TopRight,
    TopLeft,
    BottomLeft,
    BottomRight,
    TopRightWater,
    TopLeftWater,
    BottomLeftWater,
    BottomRightWater,
    ShallowWater,
    DeepWater,
    Hole,
    Ladder,
    Empty,
}

/// What the hero (or another ground-sensitive entity) is standing on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ground {
    #[default]
    Normal,
    ShallowWater,
    DeepWater,
    Hole,
    Ladder,
    /// Nothing below: falls through to the lower layer.
    Empty,
}

impl Obstacle {
    /// Ground kind carried by this cell, if it is a ground rather than a
    /// wall.
    pub fn ground(self) -> Option<Ground> {
        match self {
            Obstacle::ShallowWater => Some(Ground::ShallowWater),
            Obstacle::DeepWater
            | Obstacle::TopRightWater
            | Obstacle::TopLeftWater
            | Obstacle::BottomLeftWater
            | Obstacle::BottomRightWater => Some(Ground::DeepWater),
            Obstacle::Hole => Some(Ground::Hole),
            Obstacle::Ladder => Some(Ground::Ladder),
            Obstacle::Empty => Some(Ground::Empty),
            _ => None,
        }
    }
}

/// A camera rectangle the size of the visible area, clamped to map bounds.
#[derive(Debug, Clone)]
pub struct Camera {
    pub rect: Rectangle,
    /// Script-driven movement target, when the camera left the hero.
    pub moving_to: Option<(i32, i32)>,
    pub speed: i32,
    /// Whether the camera is flying back to the hero.
    pub restoring: bool,
}

impl Camera {
    pub const WIDTH: i32 = 320;
    pub const HEIGHT: i32 = 240;

    pub fn new() -> Self {
        Camera {
            rect: Rectangle::new(0, 0, Self::WIDTH, Self::HEIGHT),
            moving_to: None,
            speed: 0,
            restoring: false,
        }
    }

    pub fn is_fixed_on_hero(&self) -> bool {
        self.moving_to.is_none() && !self.restoring
    }
}

/// A requested map change, honored by the orchestrator between ticks.
#[derive(Debug, Clone)]
pub struct MapChangeRequest {
    pub map_id: String,
    pub destination: String,
    pub style: crate::resources::transition::TransitionStyle,
}

/// The pending map change, if any. Set by teletransporters and scripts.
#[derive(Resource, Debug, Clone, Default)]
pub struct PendingMapChange(pub Option<MapChangeRequest>);

/// The map currently driven by the game loop.
#[derive(Resource, Debug, Clone)]
pub struct Map {
    pub id: String,
    /// Size in pixels; both are multiples of 8.
    pub width: i32,
    pub height: i32,
    pub world: i32,
    pub floor: Option<i32>,
    pub tileset_id: String,
    pub music_id: String,
    pub small_keys_variable: Option<usize>,
    /// 0 is pitch dark, 1 is fully lit.
    pub light: i32,
    pub camera: Camera,
    /// Name of the destination point the hero arrived on.
    pub destination_name: String,
    /// One obstacle per 8×8 cell, per layer.
    grid: Vec<Vec<Obstacle>>,
    grid_width: i32,
    grid_height: i32,
}

impl Map {
    pub fn new(id: impl Into<String>, width: i32, height: i32) -> Self {
        assert!(
            width % 8 == 0 && height % 8 == 0,
            "map size must be a multiple of 8"
        );
        let grid_width = width / 8;
        let grid_height = height / 8;
        Map {
            id: id.into(),
            width,
            height,
            world: 0,
            floor: None,
            tileset_id: String::new(),
            music_id: String::new(),
            small_keys_variable: None,
            light: 1,
            camera: Camera::new(),
            destination_name: String::new(),
            grid: vec![vec![Obstacle::None; (grid_width * grid_height) as usize]; 3],
            grid_width,
            grid_height,
        }
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(0, 0, self.width, self.height)
    }

    fn cell_index(&self, cx: i32, cy: i32) -> usize {
        (cy * self.grid_width + cx) as usize
    }

    pub fn obstacle_at_cell(&self, layer: usize, cx: i32, cy: i32) -> Obstacle {
        self.grid[layer][self.cell_index(cx, cy)]
    }

    /// Merge an obstacle kind into one cell. A `Full` cell is never
    /// weakened; `None` never overwrites anything.
    pub fn merge_obstacle(&mut self, layer: usize, cx: i32, cy: i32, obstacle: Obstacle) {
        let index = self.cell_index(cx, cy);
        let current = self.grid[layer][index];
        if current == Obstacle::Full || obstacle == Obstacle::None {
            return;
        }
        self.grid[layer][index] = obstacle;
    }

    /// Overwrite the cells of a rectangle, used by dynamic tiles toggling
    /// their footprint between frames.
    pub fn set_obstacle_rect(&mut self, layer: usize, rect: &Rectangle, obstacle: Obstacle) {
        for cy in rect.y / 8..(rect.y + rect.height) / 8 {
            for cx in rect.x / 8..(rect.x + rect.width) / 8 {
                let index = self.cell_index(cx, cy);
                self.grid[layer][index] = obstacle;
            }
        }
    }

    /// Merge a pattern footprint at map load.
    pub fn merge_obstacle_rect(&mut self, layer: usize, rect: &Rectangle, obstacle: Obstacle) {
        for cy in rect.y / 8..(rect.y + rect.height) / 8 {
            for cx in rect.x / 8..(rect.x + rect.width) / 8 {
                self.merge_obstacle(layer, cx, cy, obstacle);
            }
        }
    }

    /// Whether a candidate box collides with the tile grid of a layer.
    /// Ground cells never block here; a box beyond the map border does.
    pub fn test_collision_with_tiles(&self, layer: usize, rect: &Rectangle) -> bool {
        if !self.bounds().contains_rectangle(rect) {
            return true;
        }
        let x_max = rect.x + rect.width - 1;
        let y_max = rect.y + rect.height - 1;
        for cy in rect.y / 8..=y_max / 8 {
            for cx in rect.x / 8..=x_max / 8 {
                let obstacle = self.obstacle_at_cell(layer, cx, cy);
                if self.cell_blocks(obstacle, cx, cy, rect, x_max, y_max) {
                    return true;
                }
            }
        }
        false
    }

    fn cell_blocks(
        &self,
        obstacle: Obstacle,
        cx: i32,
        cy: i32,
        rect: &Rectangle,
        x_max: i32,
        y_max: i32,
    ) -> bool {
        // coordinates of the intersection corners, relative to the cell
        let rel = |x: i32, y: i32| {
            (
                (x.clamp(cx * 8, cx * 8 + 7)) - cx * 8,
                (y.clamp(cy * 8, cy * 8 + 7)) - cy * 8,
            )
        };
        match obstacle {
            Obstacle::Full => true,
            Obstacle::TopRight | Obstacle::TopRightWater => {
                let (x, y) = rel(x_max, rect.y);
                x >= y
            }
            Obstacle::TopLeft | Obstacle::TopLeftWater => {
                let (x, y) = rel(rect.x, rect.y);
                x + y < 8
            }
            Obstacle::BottomLeft | Obstacle::BottomLeftWater => {
                let (x, y) = rel(rect.x, y_max);
                x <= y
            }
            Obstacle::BottomRight | Obstacle::BottomRightWater => {
                let (x, y) = rel(x_max, y_max);
                x + y >= 8
            }
            _ => false,
        }
    }

    /// Ground kind under a point, usually an entity's origin.
    pub fn get_ground(&self, layer: usize, x: i32, y: i32) -> Ground {
        if !self.bounds().contains(x, y) {
            return Ground::Empty;
        }
        let obstacle = self.obstacle_at_cell(layer, x / 8, y / 8);
        match obstacle {
            Obstacle::TopRightWater
            | Obstacle::TopLeftWater
            | Obstacle::BottomLeftWater
            | Obstacle::BottomRightWater => {
                // the solid half is a wall, the rest is deep water
                let point = Rectangle::new(x, y, 1, 1);
                if self.cell_blocks(obstacle, x / 8, y / 8, &point, x, y) {
                    Ground::Normal
                } else {
                    Ground::DeepWater
                }
            }
            other => other.ground().unwrap_or(Ground::Normal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cells_block_and_are_never_weakened() {
        let mut map = Map::new("test", 64, 64);
        map.merge_obstacle_rect(0, &Rectangle::new(8, 8, 16, 16), Obstacle::Full);
        map.merge_obstacle_rect(0, &Rectangle::new(8, 8, 8, 8), Obstacle::DeepWater);
        assert_eq!(map.obstacle_at_cell(0, 1, 1), Obstacle::Full);
        assert!(map.test_collision_with_tiles(0, &Rectangle::new(12, 12, 16, 16)));
        assert!(!map.test_collision_with_tiles(0, &Rectangle::new(32, 32, 16, 16)));
    }

    #[test]
    fn map_border_blocks() {
        let map = Map::new("test", 64, 64);
        assert!(map.test_collision_with_tiles(0, &Rectangle::new(-1, 0, 16, 16)));
        assert!(map.test_collision_with_tiles(0, &Rectangle::new(56, 0, 16, 16)));
        assert!(!map.test_collision_with_tiles(0, &Rectangle::new(0, 0, 16, 16)));
    }

    #[test]
    fn diagonal_cells_block_only_their_half() {
        let mut map = Map::new("test", 64, 64);
        map.merge_obstacle_rect(0, &Rectangle::new(8, 8, 8, 8), Obstacle::TopRight);
        // a box hugging the bottom-left corner of the cell stays clear
        assert!(!map.test_collision_with_tiles(0, &Rectangle::new(8, 14, 2, 2)));
        // a box in the top-right half collides
        assert!(map.test_collision_with_tiles(0, &Rectangle::new(14, 8, 2, 2)));
    }

    #[test]
    fn grounds_are_reported_not_blocked() {
        let mut map = Map::new("test", 64, 64);
        map.merge_obstacle_rect(0, &Rectangle::new(16, 16, 8, 8), Obstacle::Hole);
        map.merge_obstacle_rect(0, &Rectangle::new(24, 16, 8, 8), Obstacle::DeepWater);
        assert!(!map.test_collision_with_tiles(0, &Rectangle::new(16, 16, 16, 8)));
        assert_eq!(map.get_ground(0, 20, 20), Ground::Hole);
        assert_eq!(map.get_ground(0, 28, 20), Ground::DeepWater);
        assert_eq!(map.get_ground(0, 4, 4), Ground::Normal);
    }
}
