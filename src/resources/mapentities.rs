//! The entity containers of the current map.
//!
//! [`MapEntities`] owns the per-layer static tiles and every list the engine
//! iterates: the display lists (plain order and Y-sorted), the detectors,
//! the per-layer obstacle entities, the name index and the removal queue.
//! Entities themselves live in the ECS world; the lists store their
//! generational ids, so a stale handle can never resurrect a removed entity.

use bevy_ecs::prelude::{Entity, Resource};
use rustc_hash::FxHashMap;

use crate::components::entity::{EntityKind, Layer};
use crate::geometry::Rectangle;

/// One static tile placed on the map.
#[derive(Debug, Clone, Copy)]
pub struct TileInstance {
    pub pattern_id: u32,
    pub rect: Rectangle,
}

/// Per-map entity bookkeeping.
#[derive(Resource, Debug, Default)]
pub struct MapEntities {
    /// Static tiles per layer, in map-file order.
    pub tiles: [Vec<TileInstance>; Layer::COUNT],
    /// Every dynamic entity, in insertion order (lifecycle iteration).
    pub all: Vec<Entity>,
    /// Entities displayed below the Y-sorted ones, per layer.
    pub displayed_first: [Vec<Entity>; Layer::COUNT],
    /// Entities interleaved with the hero by Y coordinate, per layer.
    pub displayed_y_order: [Vec<Entity>; Layer::COUNT],
    /// Entities with collision callbacks, in insertion order.
    pub detectors: Vec<Entity>,
    /// Entities that may block movement, per layer.
    pub obstacle_entities: [Vec<Entity>; Layer::COUNT],
    named: FxHashMap<String, Entity>,
    /// Entities marked for removal, dropped by the post-update sweep.
    pub to_remove: Vec<Entity>,
    /// The hero, tracked separately but also present in the lists.
    pub hero: Option<Entity>,
    /// The enemy currently fought as a boss or miniboss, while the battle
    /// bracket is open.
    pub boss: Option<Entity>,
    pub miniboss: Option<Entity>,
}

impl MapEntities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity in every list its features call for.
    pub fn add_entity(
        &mut self,
        entity: Entity,
        kind: EntityKind,
        layer: Layer,
        name: Option<&str>,
    ) {
        let features = kind.features();
        self.all.push(entity);
        if features.can_be_displayed {
            if features.displayed_in_y_order {
                self.displayed_y_order[layer.index()].push(entity);
            } else {
                self.displayed_first[layer.index()].push(entity);
            }
        }
        if features.can_detect {
            self.detectors.push(entity);
        }
        if features.can_be_obstacle {
            self.obstacle_entities[layer.index()].push(entity);
        }
        if let Some(name) = name {
            let previous = self.named.insert(name.to_string(), entity);
            assert!(
                previous.is_none(),
                "duplicate entity name '{name}' on this map"
            );
        }
        if kind == EntityKind::Hero {
            self.hero = Some(entity);
        }
    }

    /// Mark an entity for removal. It stays in the lists until the
    /// post-update sweep calls [`sweep_entity`](Self::sweep_entity).
    pub fn schedule_removal(&mut self, entity: Entity) {
        if !self.to_remove.contains(&entity) {
            self.to_remove.push(entity);
        }
    }

    /// Physically drop an entity from every list. Called by the sweep,
    /// after which no spatial query returns it.
    pub fn sweep_entity(&mut self, entity: Entity) {
        self.all.retain(|e| *e != entity);
        for layer in 0..Layer::COUNT {
            self.displayed_first[layer].retain(|e| *e != entity);
            self.displayed_y_order[layer].retain(|e| *e != entity);
            self.obstacle_entities[layer].retain(|e| *e != entity);
        }
        self.detectors.retain(|e| *e != entity);
        self.named.retain(|_, e| *e != entity);
        if self.boss == Some(entity) {
            self.boss = None;
        }
        if self.miniboss == Some(entity) {
            self.miniboss = None;
        }
    }

    /// The hero entity. Always present once the map has started.
    pub fn hero(&self) -> Entity {
        self.hero.expect("the hero has not been placed yet")
    }

    /// Look up a named entity; missing names are a script bug.
    pub fn get_entity(&self, name: &str) -> Entity {
        self.find_entity(name)
            .unwrap_or_else(|| panic!("no entity named '{name}' on this map"))
    }

    /// Look up a named entity without failing.
    pub fn find_entity(&self, name: &str) -> Option<Entity> {
        self.named.get(name).copied()
    }

    /// All entities whose name starts with `prefix`, in name order so
    /// batch operations are deterministic.
    pub fn entities_with_prefix(&self, prefix: &str) -> Vec<Entity> {
        let mut found: Vec<(&String, Entity)> = self
            .named
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, entity)| (name, *entity))
            .collect();
        found.sort_by(|a, b| a.0.cmp(b.0));
        found.into_iter().map(|(_, entity)| entity).collect()
    }

    pub fn name_of(&self, entity: Entity) -> Option<&str> {
        self.named
            .iter()
            .find(|(_, e)| **e == entity)
            .map(|(name, _)| name.as_str())
    }

    /// Move an entity to the end of its display list.
    pub fn bring_to_front(&mut self, entity: Entity) {
        for layer in 0..Layer::COUNT {
            for list in [
                &mut self.displayed_first[layer],
                &mut self.displayed_y_order[layer],
            ] {
                if let Some(position) = list.iter().position(|e| *e == entity) {
                    list.remove(position);
                    list.push(entity);
                    return;
                }
            }
        }
    }

    /// Move an entity between layers, keeping it in the same lists.
    pub fn set_entity_layer(&mut self, entity: Entity, old_layer: Layer, new_layer: Layer) {
        if old_layer == new_layer {
            return;
        }
        for lists in [&mut self.displayed_first, &mut self.displayed_y_order] {
            if let Some(position) = lists[old_layer.index()].iter().position(|e| *e == entity) {
                lists[old_layer.index()].remove(position);
                lists[new_layer.index()].push(entity);
            }
        }
        if let Some(position) = self.obstacle_entities[old_layer.index()]
            .iter()
            .position(|e| *e == entity)
        {
            self.obstacle_entities[old_layer.index()].remove(position);
            self.obstacle_entities[new_layer.index()].push(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::World;

    #[test]
    fn lists_follow_the_feature_table() {
        let mut world = World::new();
        let chest = world.spawn_empty().id();
        let sensor = world.spawn_empty().id();
        let enemy = world.spawn_empty().id();

        let mut entities = MapEntities::new();
        entities.add_entity(chest, EntityKind::Chest, Layer::Low, Some("chest_1"));
        entities.add_entity(sensor, EntityKind::Sensor, Layer::Low, None);
        entities.add_entity(enemy, EntityKind::Enemy, Layer::Intermediate, None);

        assert!(entities.displayed_first[0].contains(&chest));
        assert!(!entities.displayed_first[0].contains(&sensor));
        assert!(entities.displayed_y_order[1].contains(&enemy));
        assert_eq!(entities.detectors.len(), 3);
        assert_eq!(entities.obstacle_entities[0].len(), 2);
        assert_eq!(entities.get_entity("chest_1"), chest);
    }

    #[test]
    fn sweep_clears_every_list() {
        let mut world = World::new();
        let enemy = world.spawn_empty().id();
        let mut entities = MapEntities::new();
        entities.add_entity(enemy, EntityKind::Enemy, Layer::Low, Some("boss"));
        entities.boss = Some(enemy);

        entities.schedule_removal(enemy);
        entities.schedule_removal(enemy);
        assert_eq!(entities.to_remove.len(), 1);

        entities.sweep_entity(enemy);
        assert!(entities.all.is_empty());
        assert!(entities.detectors.is_empty());
        assert!(entities.find_entity("boss").is_none());
        assert!(entities.boss.is_none());
    }

    #[test]
    fn prefix_query_is_sorted() {
        let mut world = World::new();
        let mut entities = MapEntities::new();
        let d2 = world.spawn_empty().id();
        let d1 = world.spawn_empty().id();
        let other = world.spawn_empty().id();
        entities.add_entity(d2, EntityKind::Door, Layer::Low, Some("door_2"));
        entities.add_entity(d1, EntityKind::Door, Layer::Low, Some("door_1"));
        entities.add_entity(other, EntityKind::Switch, Layer::Low, Some("lever"));

        assert_eq!(entities.entities_with_prefix("door_"), vec![d1, d2]);
    }
}
