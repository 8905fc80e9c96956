//! Obstacle entity index.
//!
//! The tile grid answers half of every collision query; this resource is
//! the other half: a per-tick index of the entities that may block
//! movement, with the data their `is_obstacle_for` test needs. It is
//! rebuilt at the start of each tick and patched in place whenever an
//! entity moves, so entities updated later in the same tick observe fresh
//! positions.

use bevy_ecs::prelude::{Entity, Resource};
use rustc_hash::FxHashMap;

use crate::components::entity::{EntityKind, Layer};
use crate::geometry::Rectangle;
use crate::resources::map::Map;

/// Why (or when) an indexed entity blocks.
#[derive(Debug, Clone, Copy)]
pub enum BlockingRule {
    Always,
    /// Doors stop blocking while opening.
    DoorClosed(bool),
    /// A block being moved by the hero must not collide with that hero.
    Block { moving: bool },
    /// Raised crystal-switch blocks; a hero already standing on one may
    /// leave it.
    CrystalBlock { raised: bool },
    Custom {
        stops_hero: bool,
        stops_enemies: bool,
        stops_npcs: bool,
        stops_blocks: bool,
    },
    /// Sensors block only states that must not land inside them.
    Sensor,
    /// Jump sensors are walls for everything but the hero.
    JumpSensor,
    /// The hero blocks blocks and NPCs.
    Hero,
}

/// One obstacle entity.
#[derive(Debug, Clone)]
pub struct ObstacleEntry {
    pub entity: Entity,
    pub kind: EntityKind,
    pub layer: Layer,
    pub rect: Rectangle,
    pub rule: BlockingRule,
}

/// Everything a moving candidate needs to know about itself for the
/// per-entity obstacle tests.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub entity: Entity,
    pub kind: EntityKind,
    pub layer: Layer,
    /// Box before the move, for "already overlapping" exemptions.
    pub current_rect: Rectangle,
    /// Whether sensors block this candidate (hero state dependent).
    pub blocked_by_sensors: bool,
}

/// The per-tick index of obstacle entities.
#[derive(Resource, Debug, Default)]
pub struct ObstacleIndex {
    entries: Vec<ObstacleEntry>,
    by_entity: FxHashMap<Entity, usize>,
}

impl ObstacleIndex {
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_entity.clear();
    }

    pub fn push(&mut self, entry: ObstacleEntry) {
        self.by_entity.insert(entry.entity, self.entries.len());
        self.entries.push(entry);
    }

    /// Patch the indexed position of a moved entity.
    pub fn update_position(&mut self, entity: Entity, rect: Rectangle) {
        if let Some(index) = self.by_entity.get(&entity) {
            self.entries[*index].rect = rect;
        }
    }

    /// Patch the blocking rule of an entity (door opening, block grabbed).
    pub fn update_rule(&mut self, entity: Entity, rule: BlockingRule) {
        if let Some(index) = self.by_entity.get(&entity) {
            self.entries[*index].rule = rule;
        }
    }

    fn entry_blocks(entry: &ObstacleEntry, candidate: &Candidate) -> bool {
        match entry.rule {
            BlockingRule::Always => true,
            BlockingRule::DoorClosed(closed) => closed,
            BlockingRule::Block { moving } => {
                // while the hero moves the block, the pair ignores itself
                !(moving && candidate.kind == EntityKind::Hero)
            }
            BlockingRule::CrystalBlock { raised } => {
                raised && !entry.rect.overlaps(&candidate.current_rect)
            }
            BlockingRule::Custom {
                stops_hero,
                stops_enemies,
                stops_npcs,
                stops_blocks,
            } => match candidate.kind {
                EntityKind::Hero => stops_hero,
                EntityKind::Enemy => stops_enemies,
                EntityKind::Npc => stops_npcs,
                EntityKind::Block => stops_blocks,
                _ => false,
            },
            BlockingRule::Sensor => candidate.blocked_by_sensors,
            BlockingRule::JumpSensor => candidate.kind != EntityKind::Hero,
            BlockingRule::Hero => {
                matches!(candidate.kind, EntityKind::Block | EntityKind::Npc)
            }
        }
    }

    /// Whether some obstacle entity of the candidate's layer blocks the
    /// candidate box.
    pub fn test(&self, candidate_rect: &Rectangle, candidate: &Candidate) -> bool {
        self.entries.iter().any(|entry| {
            entry.entity != candidate.entity
                && entry.layer == candidate.layer
                && entry.rect.overlaps(candidate_rect)
                && Self::entry_blocks(entry, candidate)
        })
    }
}

/// The full obstacle test: map border, tile grid, then obstacle entities.
pub fn test_obstacles(
    map: &Map,
    index: &ObstacleIndex,
    candidate_rect: &Rectangle,
    candidate: &Candidate,
) -> bool {
    map.test_collision_with_tiles(candidate.layer.index(), candidate_rect)
        || index.test(candidate_rect, candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::World;

    fn candidate(entity: Entity, kind: EntityKind) -> Candidate {
        Candidate {
            entity,
            kind,
            layer: Layer::Low,
            current_rect: Rectangle::new(0, 0, 16, 16),
            blocked_by_sensors: false,
        }
    }

    #[test]
    fn moving_block_ignores_the_hero() {
        let mut world = World::new();
        let hero = world.spawn_empty().id();
        let block = world.spawn_empty().id();

        let mut index = ObstacleIndex::default();
        index.push(ObstacleEntry {
            entity: block,
            kind: EntityKind::Block,
            layer: Layer::Low,
            rect: Rectangle::new(16, 0, 16, 16),
            rule: BlockingRule::Block { moving: false },
        });

        let hero_candidate = candidate(hero, EntityKind::Hero);
        let push_rect = Rectangle::new(8, 0, 16, 16);
        assert!(index.test(&push_rect, &hero_candidate));

        index.update_rule(block, BlockingRule::Block { moving: true });
        assert!(!index.test(&push_rect, &hero_candidate));
    }

    #[test]
    fn raised_crystal_block_lets_a_standing_hero_leave() {
        let mut world = World::new();
        let hero = world.spawn_empty().id();
        let crystal = world.spawn_empty().id();

        let mut index = ObstacleIndex::default();
        index.push(ObstacleEntry {
            entity: crystal,
            kind: EntityKind::CrystalSwitchBlock,
            layer: Layer::Low,
            rect: Rectangle::new(0, 0, 16, 16),
            rule: BlockingRule::CrystalBlock { raised: true },
        });

        // hero standing on the block is exempt
        let mut on_top = candidate(hero, EntityKind::Hero);
        on_top.current_rect = Rectangle::new(4, 0, 16, 16);
        assert!(!index.test(&Rectangle::new(5, 0, 16, 16), &on_top));

        // hero outside cannot enter
        let mut outside = candidate(hero, EntityKind::Hero);
        outside.current_rect = Rectangle::new(32, 0, 16, 16);
        assert!(index.test(&Rectangle::new(10, 0, 16, 16), &outside));
    }

    #[test]
    fn custom_obstacle_filters_by_kind() {
        let mut world = World::new();
        let hero = world.spawn_empty().id();
        let enemy = world.spawn_empty().id();
        let wall = world.spawn_empty().id();

        let mut index = ObstacleIndex::default();
        index.push(ObstacleEntry {
            entity: wall,
            kind: EntityKind::CustomObstacle,
            layer: Layer::Low,
            rect: Rectangle::new(0, 0, 16, 16),
            rule: BlockingRule::Custom {
                stops_hero: true,
                stops_enemies: false,
                stops_npcs: true,
                stops_blocks: true,
            },
        });

        let rect = Rectangle::new(8, 8, 16, 16);
        assert!(index.test(&rect, &candidate(hero, EntityKind::Hero)));
        assert!(!index.test(&rect, &candidate(enemy, EntityKind::Enemy)));
    }
}
