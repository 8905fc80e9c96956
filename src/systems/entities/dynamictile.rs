//! Dynamic tiles: rewriting the obstacle grid between frames.

use bevy_ecs::prelude::*;

use crate::components::entity::{BoundingBox, Layer};
use crate::components::tiles::DynamicTile;
use crate::geometry::Rectangle;
use crate::resources::map::{Map, Obstacle};
use crate::resources::mapentities::MapEntities;
use crate::resources::tileset::TilesetStore;

/// Apply pending dynamic tile toggles to the obstacle grid.
///
/// A toggled footprint is recomputed from scratch: static tiles first, then
/// every enabled dynamic tile overlapping the region, keeping the "no tile
/// may weaken a FULL cell" merge rule. Runs between frames only, never
/// inside a collision query.
pub fn dynamic_tile_update(
    mut map: ResMut<Map>,
    entities: Res<MapEntities>,
    tilesets: Res<TilesetStore>,
    mut query: Query<(&mut DynamicTile, &BoundingBox, &Layer)>,
) {
    let dirty: Vec<(Rectangle, Layer)> = query
        .iter()
        .filter(|(tile, _, _)| tile.dirty)
        .map(|(_, bounding_box, layer)| (bounding_box.rect, *layer))
        .collect();
    if dirty.is_empty() {
        return;
    }

    for (region, layer) in &dirty {
        // start from a clean region
        map.set_obstacle_rect(layer.index(), region, Obstacle::None);

        // static tiles of that layer contribute first
        for tile in &entities.tiles[layer.index()] {
            if tile.rect.overlaps(region) {
                let obstacle = tilesets.get(&map.tileset_id).pattern(tile.pattern_id).obstacle;
                let overlap = intersect(&tile.rect, region);
                map.merge_obstacle_rect(layer.index(), &overlap, obstacle);
            }
        }

        // then every enabled dynamic tile overlapping the region
        for (tile, bounding_box, tile_layer) in query.iter() {
            if tile_layer == layer && tile.enabled && bounding_box.rect.overlaps(region) {
                let obstacle = tilesets.get(&map.tileset_id).pattern(tile.pattern_id).obstacle;
                let overlap = intersect(&bounding_box.rect, region);
                map.merge_obstacle_rect(layer.index(), &overlap, obstacle);
            }
        }
    }

    for (mut tile, _, _) in query.iter_mut() {
        if tile.dirty {
            tile.dirty = false;
        }
    }
}

fn intersect(a: &Rectangle, b: &Rectangle) -> Rectangle {
    let x0 = a.x.max(b.x);
    let y0 = a.y.max(b.y);
    let x1 = (a.x + a.width).min(b.x + b.width);
    let y1 = (a.y + a.height).min(b.y + b.height);
    Rectangle::new(x0, y0, (x1 - x0).max(0), (y1 - y0).max(0))
}
