//! Base components shared by every map entity.
//!
//! An entity on the map is an ECS entity carrying at least [`EntityKind`],
//! [`Layer`] and [`BoundingBox`]. The kind tag resolves to a static
//! [`EntityFeatures`] tuple that tells the containers whether the entity can
//! block movement, detect collisions, be displayed, and whether it sorts in
//! Y order with the hero.

use bevy_ecs::prelude::Component;

use crate::geometry::{Point, Rectangle};

/// The three tile/entity planes of a map, from the ground up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Component)]
pub enum Layer {
    Low,
    Intermediate,
    High,
}

impl Layer {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            Layer::Low => 0,
            Layer::Intermediate => 1,
            Layer::High => 2,
        }
    }

    pub fn from_index(index: usize) -> Layer {
        match index {
            0 => Layer::Low,
            1 => Layer::Intermediate,
            2 => Layer::High,
            _ => panic!("no such layer: {index}"),
        }
    }
}

/// Type tag of a map entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Component)]
pub enum EntityKind {
    Tile,
    DynamicTile,
    Destination,
    Teletransporter,
    Pickable,
    Destructible,
    Chest,
    JumpSensor,
    Enemy,
    Npc,
    Block,
    Switch,
    CustomObstacle,
    Sensor,
    CrystalSwitch,
    CrystalSwitchBlock,
    ShopItem,
    ConveyorBelt,
    Door,
    Boomerang,
    Explosion,
    CarriedItem,
    Bomb,
    Stairs,
    Hero,
}

/// Static capability tuple of an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityFeatures {
    /// May appear in the per-layer obstacle list.
    pub can_be_obstacle: bool,
    /// Runs collision callbacks when other entities overlap it.
    pub can_detect: bool,
    /// Appears in a display list.
    pub can_be_displayed: bool,
    /// Sorted with the hero by Y coordinate when displayed.
    pub displayed_in_y_order: bool,
}

const fn features(
    can_be_obstacle: bool,
    can_detect: bool,
    can_be_displayed: bool,
    displayed_in_y_order: bool,
) -> EntityFeatures {
    EntityFeatures {
        can_be_obstacle,
        can_detect,
        can_be_displayed,
        displayed_in_y_order,
    }
}

impl EntityKind {
    /// The per-kind capability table.
    pub fn features(self) -> EntityFeatures {
        match self {
            EntityKind::Tile => features(true, false, false, false),
            EntityKind::DynamicTile => features(true, false, true, false),
            EntityKind::Destination => features(false, false, false, false),
            EntityKind::Teletransporter => features(true, true, true, false),
            EntityKind::Pickable => features(false, true, true, false),
            EntityKind::Destructible => features(true, true, true, false),
            EntityKind::Chest => features(true, true, true, false),
            EntityKind::JumpSensor => features(true, true, false, false),
            EntityKind::Enemy => features(true, true, true, true),
            EntityKind::Npc => features(true, true, true, true),
            EntityKind::Block => features(true, true, true, false),
            EntityKind::Switch => features(true, true, true, false),
            EntityKind::CustomObstacle => features(true, false, false, false),
            EntityKind::Sensor => features(true, true, false, false),
            EntityKind::CrystalSwitch => features(true, true, true, false),
            EntityKind::CrystalSwitchBlock => features(true, false, true, false),
            EntityKind::ShopItem => features(true, true, true, false),
            EntityKind::ConveyorBelt => features(true, true, true, false),
            EntityKind::Door => features(true, true, true, false),
            EntityKind::Boomerang => features(false, true, true, false),
            EntityKind::Explosion => features(false, true, true, true),
            EntityKind::CarriedItem => features(false, false, true, true),
            EntityKind::Bomb => features(false, true, true, true),
            EntityKind::Stairs => features(true, true, false, false),
            EntityKind::Hero => features(true, false, true, true),
        }
    }
}

/// Position and size of an entity, with the origin offset used to anchor the
/// sprite and the facing/origin point tests.
#[derive(Debug, Clone, Copy, Component)]
pub struct BoundingBox {
    pub rect: Rectangle,
    /// Offset of the origin point from the box top-left corner.
    pub origin: Point,
}

impl BoundingBox {
    pub fn new(rect: Rectangle, origin: Point) -> Self {
        BoundingBox { rect, origin }
    }

    /// Origin point in map coordinates.
    pub fn origin_point(&self) -> Point {
        Point::new(self.rect.x + self.origin.x, self.rect.y + self.origin.y)
    }

    /// Move the box so that its origin point lands on (x, y).
    pub fn set_origin_position(&mut self, x: i32, y: i32) {
        self.rect.x = x - self.origin.x;
        self.rect.y = y - self.origin.y;
    }

    /// The point 1 pixel beyond the box border in the given 4-direction,
    /// aligned with the origin on the other axis. Used by action/grab tests.
    pub fn facing_point(&self, direction4: i32) -> Point {
        let origin = self.origin_point();
        match direction4 {
            0 => Point::new(self.rect.x + self.rect.width, origin.y),
            1 => Point::new(origin.x, self.rect.y - 1),
            2 => Point::new(self.rect.x - 1, origin.y),
            3 => Point::new(origin.x, self.rect.y + self.rect.height),
            _ => panic!("bad direction4: {direction4}"),
        }
    }
}

/// Optional unique-per-map name, used by scripts and the name index.
#[derive(Debug, Clone, Component)]
pub struct EntityName(pub String);

/// Current 4- or 8-way direction of an entity.
#[derive(Debug, Clone, Copy, Component)]
pub struct Facing {
    pub direction: i32,
}

impl Facing {
    pub fn new(direction: i32) -> Self {
        Facing { direction }
    }
}

/// Marker set by `MapEntities::remove_entity`; the entity stays queryable
/// until the post-update sweep despawns it.
#[derive(Debug, Clone, Copy, Default, Component)]
pub struct BeingRemoved;

/// Suspension state. While suspended, neither the sprite frame clock nor the
/// movement advances; `since` records the suspension instant so that resume
/// can shift pending dates.
#[derive(Debug, Clone, Copy, Default, Component)]
pub struct Suspended {
    pub suspended: bool,
    /// Clock value when the entity was last suspended, in ms.
    pub since: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_point_sits_outside_the_box() {
        let b = BoundingBox::new(Rectangle::new(100, 100, 16, 16), Point::new(8, 13));
        assert_eq!(b.facing_point(0), Point::new(116, 113));
        assert_eq!(b.facing_point(1), Point::new(108, 99));
        assert_eq!(b.facing_point(2), Point::new(99, 113));
        assert_eq!(b.facing_point(3), Point::new(108, 116));
        for d in 0..4 {
            let p = b.facing_point(d);
            assert!(!b.rect.contains(p.x, p.y));
        }
    }

    #[test]
    fn tile_features_match_their_role() {
        let tile = EntityKind::Tile.features();
        assert!(tile.can_be_obstacle && !tile.can_detect && !tile.can_be_displayed);
        let hero = EntityKind::Hero.features();
        assert!(hero.displayed_in_y_order);
        let sensor = EntityKind::Sensor.features();
        assert!(sensor.can_detect && !sensor.can_be_displayed);
    }
}
