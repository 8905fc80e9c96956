//! Building a live map from its data file.
//!
//! Turns a parsed [`MapData`] into the [`Map`] resource (with its populated
//! obstacle grid), the [`MapEntities`] lists and the spawned ECS entities.
//! Entities with a satisfied savegame flag (opened doors, taken pickables,
//! killed unique enemies) spawn in their settled state or not at all.

use anyhow::{Context, Result, anyhow};
use bevy_ecs::prelude::*;

use crate::components::block::{Block, BlockSubtype};
use crate::components::chest::Chest;
use crate::components::detectors::{
    CollisionModes, ConveyorBelt, CrystalSwitch, CrystalSwitchBlock, CrystalSwitchBlockColor,
    CustomObstacle, Destination, Detector, JumpSensor, Sensor, SensorSubtype, Stairs,
    StairsSubtype, Switch, Teletransporter,
};
use crate::components::door::{Door, DoorState, DoorSubtype};
use crate::components::enemy::{Enemy, EnemyRank};
use crate::components::entity::{BoundingBox, EntityKind, EntityName, Facing, Layer, Suspended};
use crate::components::hero::Hero;
use crate::components::movement::Movement;
use crate::components::npc::{Npc, NpcSubtype};
use crate::components::pickable::{Destructible, DestructibleSubtype, Pickable, PickableSubtype};
use crate::components::shopitem::ShopItem;
use crate::components::sprite::{Sprite, SpriteSet};
use crate::components::tiles::DynamicTile;
use crate::geometry::{Point, Rectangle};
use crate::resources::dungeon::Dungeon;
use crate::resources::map::{Map, PendingMapChange};
use crate::resources::mapdata::{EntityData, MapData};
use crate::resources::mapentities::{MapEntities, TileInstance};
use crate::resources::obstacles::ObstacleIndex;
use crate::resources::savegame::Savegame;
use crate::resources::tileset::TilesetStore;
use crate::resources::transition::TransitionStyle;

/// Load `data` as the current map and place the hero on `destination`.
pub fn load_map(world: &mut World, data: &MapData, destination: &str) -> Result<()> {
    let mut map = Map::new(data.id.clone(), data.width, data.height);
    map.world = data.world;
    map.floor = data.floor;
    map.tileset_id = data.tileset.clone();
    map.music_id = data.music.clone();
    map.small_keys_variable = data.small_keys_variable;
    map.destination_name = destination.to_string();

    let mut entities = MapEntities::new();

    // static tiles populate the grid and the per-layer tile lists
    {
        let tilesets = world.resource::<TilesetStore>();
        let tileset = tilesets.get(&data.tileset);
        for record in &data.entities {
            if let EntityData::Tile {
                layer,
                x,
                y,
                width,
                height,
                pattern,
            } = record
            {
                let rect = Rectangle::new(*x, *y, *width, *height);
                let obstacle = tileset.pattern(*pattern).obstacle;
                let layer = Layer::from_index(*layer as usize);
                map.merge_obstacle_rect(layer.index(), &rect, obstacle);
                entities.tiles[layer.index()].push(TileInstance {
                    pattern_id: *pattern,
                    rect,
                });
            }
        }
    }

    // dynamic entities
    let mut named_destination: Option<(Point, Layer, i32)> = None;
    let mut first_destination: Option<(Point, Layer, i32)> = None;
    for record in &data.entities {
        spawn_entity(
            world,
            &mut entities,
            record,
            destination,
            &mut named_destination,
            &mut first_destination,
        )?;
    }

    let (spawn, spawn_layer, spawn_direction) = if destination.is_empty() {
        first_destination.unwrap_or((Point::new(data.width / 2, data.height / 2), Layer::Low, 3))
    } else {
        named_destination.ok_or_else(|| {
            anyhow!(
                "bad destination: no point named '{destination}' on map '{}'",
                data.id
            )
        })?
    };

    place_hero(world, &mut entities, spawn, spawn_layer, spawn_direction);

    if let Some(small_keys_variable) = data.small_keys_variable {
        world.insert_resource(Dungeon {
            number: data.world.unsigned_abs().max(1),
            small_keys_variable: Some(small_keys_variable),
        });
    } else {
        world.remove_resource::<Dungeon>();
    }

    world.insert_resource(map);
    world.insert_resource(entities);
    world.insert_resource(ObstacleIndex::default());
    world.insert_resource(PendingMapChange::default());

    if !data.music.is_empty() {
        world
            .resource_mut::<Messages<crate::events::audio::AudioCmd>>()
            .write(crate::events::audio::AudioCmd::PlayMusic {
                id: data.music.clone(),
                looped: true,
            });
    }
    Ok(())
}

/// Spawn one entity record, capturing the destination points on the way.
fn spawn_entity(
    world: &mut World,
    entities: &mut MapEntities,
    record: &EntityData,
    wanted: &str,
    named_destination: &mut Option<(Point, Layer, i32)>,
    first_destination: &mut Option<(Point, Layer, i32)>,
) -> Result<()> {
    match record {
        EntityData::Tile { .. } => {}
        EntityData::Destination {
            name,
            layer,
            x,
            y,
            direction,
        } => {
            let layer = Layer::from_index(*layer as usize);
            if name == wanted {
                *named_destination = Some((Point::new(*x, *y), layer, *direction));
            }
            if first_destination.is_none() {
                *first_destination = Some((Point::new(*x, *y), layer, *direction));
            }
            let entity = world
                .spawn((
                    EntityKind::Destination,
                    layer,
                    BoundingBox::new(Rectangle::new(x - 8, y - 13, 16, 16), Point::new(8, 13)),
                    Facing::new((*direction).max(0)),
                    Suspended::default(),
                    Destination {
                        direction: *direction,
                    },
                ))
                .id();
            entities.add_entity(entity, EntityKind::Destination, layer, Some(name));
        }
        EntityData::DynamicTile {
            name,
            layer,
            x,
            y,
            width,
            height,
            pattern,
            enabled,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let entity = world
                .spawn((
                    EntityKind::DynamicTile,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, *width, *height), Point::new(0, 0)),
                    Suspended::default(),
                    DynamicTile::new(*pattern, *enabled),
                ))
                .id();
            entities.add_entity(entity, EntityKind::DynamicTile, layer, Some(name));
        }
        EntityData::Teletransporter {
            name,
            layer,
            x,
            y,
            width,
            height,
            subtype,
            transition,
            destination_map,
            destination_point: target_point,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let entity = world
                .spawn((
                    EntityKind::Teletransporter,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, *width, *height), Point::new(0, 0)),
                    Facing::new(0),
                    Suspended::default(),
                    Detector::new(CollisionModes::ORIGIN_POINT),
                    Teletransporter {
                        visible: subtype == "yellow",
                        transition: TransitionStyle::parse(transition),
                        destination_map: destination_map.clone(),
                        destination_point: target_point.clone(),
                        sound: "warp".to_string(),
                    },
                ))
                .id();
            entities.add_entity(entity, EntityKind::Teletransporter, layer, Some(name));
        }
        EntityData::Pickable {
            layer,
            x,
            y,
            subtype,
            savegame_variable,
        } => {
            if let Some(variable) = savegame_variable {
                if world.resource::<Savegame>().get_boolean(*variable) {
                    return Ok(());
                }
            }
            let layer = Layer::from_index(*layer as usize);
            let entity = world
                .spawn((
                    EntityKind::Pickable,
                    layer,
                    BoundingBox::new(Rectangle::new(x - 8, y - 13, 16, 16), Point::new(8, 13)),
                    Facing::new(0),
                    Suspended::default(),
                    Detector::new(CollisionModes::RECTANGLE),
                    Pickable::placed(PickableSubtype::parse(subtype), *savegame_variable),
                    SpriteSet::single(Sprite::new("pickables", subtype.as_str())),
                ))
                .id();
            entities.add_entity(entity, EntityKind::Pickable, layer, None);
        }
        EntityData::Destructible {
            layer,
            x,
            y,
            subtype,
            treasure,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let subtype = DestructibleSubtype::parse(subtype);
            let entity = world
                .spawn((
                    EntityKind::Destructible,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, 16, 16), Point::new(8, 13)),
                    Facing::new(0),
                    Suspended::default(),
                    Detector::new(CollisionModes::FACING_POINT),
                    Destructible::new(subtype, treasure.clone()),
                    SpriteSet::single(Sprite::new("destructibles", "stopped")),
                ))
                .id();
            entities.add_entity(entity, EntityKind::Destructible, layer, None);
        }
        EntityData::Chest {
            name,
            layer,
            x,
            y,
            big,
            treasure,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let mut chest = Chest::new(*big, treasure.clone());
            // a chest whose saved flag is set spawns already open and empty
            if let Some(variable) = treasure.as_ref().and_then(|t| t.savegame_variable) {
                if world.resource::<Savegame>().get_boolean(variable) {
                    chest.open = true;
                    chest.treasure = None;
                }
            }
            let entity = world
                .spawn((
                    EntityKind::Chest,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, 16, 16), Point::new(8, 13)),
                    Facing::new(0),
                    Suspended::default(),
                    Detector::new(CollisionModes::FACING_POINT),
                    chest,
                    SpriteSet::single(Sprite::new(
                        if *big { "big_chest" } else { "chest" },
                        "closed",
                    )),
                ))
                .id();
            entities.add_entity(entity, EntityKind::Chest, layer, Some(name));
        }
        EntityData::JumpSensor {
            name,
            layer,
            x,
            y,
            width,
            height,
            direction,
            jump_length,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let entity = world
                .spawn((
                    EntityKind::JumpSensor,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, *width, *height), Point::new(0, 0)),
                    Facing::new(0),
                    Suspended::default(),
                    Detector::new(CollisionModes::CUSTOM),
                    JumpSensor {
                        direction8: *direction,
                        jump_length: *jump_length,
                    },
                ))
                .id();
            entities.add_entity(entity, EntityKind::JumpSensor, layer, Some(name));
        }
        EntityData::Enemy {
            name,
            layer,
            x,
            y,
            breed,
            rank,
            savegame_variable,
            treasure,
        } => {
            if let Some(variable) = savegame_variable {
                if world.resource::<Savegame>().get_boolean(*variable) {
                    return Ok(());
                }
            }
            let layer = Layer::from_index(*layer as usize);
            let rank = EnemyRank::parse(rank);
            let mut enemy = Enemy::new(breed.clone(), rank);
            enemy.savegame_variable = *savegame_variable;
            enemy.treasure = treasure.clone();
            enemy.enabled = rank == EnemyRank::Normal;
            let entity = world
                .spawn((
                    EntityKind::Enemy,
                    layer,
                    BoundingBox::new(Rectangle::new(x - 8, y - 13, 16, 16), Point::new(8, 13)),
                    Facing::new(3),
                    Suspended::default(),
                    Detector::new(CollisionModes::RECTANGLE.union(CollisionModes::SPRITE)),
                    enemy,
                    Movement::random_walk(32.0, 0),
                    SpriteSet::single(Sprite::new(format!("enemies/{breed}"), "walking")),
                ))
                .id();
            entities.add_entity(entity, EntityKind::Enemy, layer, Some(name));
        }
        EntityData::Npc {
            name,
            layer,
            x,
            y,
            direction,
            subtype,
            sprite,
            message,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let mut sprites = SpriteSet::default();
            if let Some(sprite) = sprite {
                sprites.push(Sprite::new(sprite.clone(), "stopped"));
            }
            let entity = world
                .spawn((
                    EntityKind::Npc,
                    layer,
                    BoundingBox::new(Rectangle::new(x - 8, y - 13, 16, 16), Point::new(8, 13)),
                    Facing::new(*direction),
                    Suspended::default(),
                    Detector::new(CollisionModes::FACING_POINT),
                    Npc::new(NpcSubtype::parse(subtype), message.clone()),
                    sprites,
                ))
                .id();
            entities.add_entity(entity, EntityKind::Npc, layer, Some(name));
        }
        EntityData::Block {
            name,
            layer,
            x,
            y,
            direction,
            subtype,
            maximum_moves,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let entity = world
                .spawn((
                    EntityKind::Block,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, 16, 16), Point::new(8, 13)),
                    Facing::new(0),
                    Suspended::default(),
                    Block::new(
                        BlockSubtype::parse(subtype),
                        *direction,
                        *maximum_moves,
                        Point::new(*x, *y),
                    ),
                    SpriteSet::single(Sprite::new("block", "stopped")),
                ))
                .id();
            entities.add_entity(entity, EntityKind::Block, layer, Some(name));
        }
        EntityData::Switch {
            name,
            layer,
            x,
            y,
            subtype,
            needs_block,
            disabled_when_leaving,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let visible = subtype == "normal";
            let mut sprites = SpriteSet::default();
            if visible {
                sprites.push(Sprite::new("switch", "inactivated"));
            }
            let entity = world
                .spawn((
                    EntityKind::Switch,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, 16, 16), Point::new(0, 0)),
                    Facing::new(0),
                    Suspended::default(),
                    Detector::new(CollisionModes::CONTAINING.union(CollisionModes::CENTER)),
                    Switch {
                        visible,
                        needs_block: *needs_block,
                        disabled_when_leaving: *disabled_when_leaving,
                        enabled: false,
                        locked: false,
                    },
                    sprites,
                ))
                .id();
            entities.add_entity(entity, EntityKind::Switch, layer, Some(name));
        }
        EntityData::CustomObstacle {
            name,
            layer,
            x,
            y,
            width,
            height,
            stops_hero,
            stops_enemies,
            stops_npcs,
            stops_blocks,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let entity = world
                .spawn((
                    EntityKind::CustomObstacle,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, *width, *height), Point::new(0, 0)),
                    Suspended::default(),
                    CustomObstacle {
                        stops_hero: *stops_hero,
                        stops_enemies: *stops_enemies,
                        stops_npcs: *stops_npcs,
                        stops_blocks: *stops_blocks,
                    },
                ))
                .id();
            entities.add_entity(entity, EntityKind::CustomObstacle, layer, Some(name));
        }
        EntityData::Sensor {
            name,
            layer,
            x,
            y,
            width,
            height,
            subtype,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let subtype = match subtype.as_str() {
                "custom" => SensorSubtype::Custom,
                "change_layer" => SensorSubtype::ChangeLayer,
                "return_from_bad_ground" => SensorSubtype::ReturnFromBadGround,
                other => return Err(anyhow!("unknown sensor subtype '{other}'")),
            };
            let entity = world
                .spawn((
                    EntityKind::Sensor,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, *width, *height), Point::new(0, 0)),
                    Facing::new(0),
                    Suspended::default(),
                    Detector::new(CollisionModes::ORIGIN_POINT),
                    Sensor {
                        subtype,
                        activated: false,
                    },
                ))
                .id();
            entities.add_entity(entity, EntityKind::Sensor, layer, Some(name));
        }
        EntityData::CrystalSwitch { layer, x, y } => {
            let layer = Layer::from_index(*layer as usize);
            let entity = world
                .spawn((
                    EntityKind::CrystalSwitch,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, 16, 16), Point::new(8, 13)),
                    Facing::new(0),
                    Suspended::default(),
                    Detector::new(CollisionModes::SPRITE),
                    CrystalSwitch {
                        next_toggle_date: 0,
                    },
                    SpriteSet::single(Sprite::new("crystal_switch", "blue_lowered")),
                ))
                .id();
            entities.add_entity(entity, EntityKind::CrystalSwitch, layer, None);
        }
        EntityData::CrystalSwitchBlock {
            layer,
            x,
            y,
            width,
            height,
            subtype,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let color = match subtype.as_str() {
                "orange" => CrystalSwitchBlockColor::Orange,
                "blue" => CrystalSwitchBlockColor::Blue,
                other => return Err(anyhow!("unknown crystal block color '{other}'")),
            };
            let entity = world
                .spawn((
                    EntityKind::CrystalSwitchBlock,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, *width, *height), Point::new(0, 0)),
                    Suspended::default(),
                    CrystalSwitchBlock { color },
                    SpriteSet::single(Sprite::new("crystal_switch_block", "lowered")),
                ))
                .id();
            entities.add_entity(entity, EntityKind::CrystalSwitchBlock, layer, None);
        }
        EntityData::ShopItem {
            name,
            layer,
            x,
            y,
            treasure,
            price,
            message,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let entity = world
                .spawn((
                    EntityKind::ShopItem,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, 16, 16), Point::new(8, 13)),
                    Facing::new(0),
                    Suspended::default(),
                    Detector::new(CollisionModes::FACING_POINT),
                    ShopItem::new(treasure.clone(), *price, message.clone()),
                    SpriteSet::default(),
                ))
                .id();
            entities.add_entity(entity, EntityKind::ShopItem, layer, Some(name));
        }
        EntityData::ConveyorBelt {
            layer,
            x,
            y,
            direction,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let entity = world
                .spawn((
                    EntityKind::ConveyorBelt,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, 16, 16), Point::new(0, 0)),
                    Facing::new(0),
                    Suspended::default(),
                    Detector::new(CollisionModes::CENTER),
                    ConveyorBelt {
                        direction8: *direction,
                    },
                    SpriteSet::single(Sprite::new("conveyor_belt", "running")),
                ))
                .id();
            entities.add_entity(entity, EntityKind::ConveyorBelt, layer, None);
        }
        EntityData::Door {
            name,
            layer,
            x,
            y,
            direction,
            subtype,
            savegame_variable,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let mut door = Door::new(
                DoorSubtype::parse(subtype),
                *direction,
                *savegame_variable,
            );
            if let Some(variable) = savegame_variable {
                if world.resource::<Savegame>().get_boolean(*variable) {
                    door.state = DoorState::Open;
                }
            }
            let entity = world
                .spawn((
                    EntityKind::Door,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, 16, 16), Point::new(0, 0)),
                    Facing::new(*direction),
                    Suspended::default(),
                    Detector::new(CollisionModes::FACING_POINT),
                    door,
                    SpriteSet::single(Sprite::new("door", "closed")),
                ))
                .id();
            entities.add_entity(entity, EntityKind::Door, layer, Some(name));
        }
        EntityData::Stairs {
            name,
            layer,
            x,
            y,
            direction,
            subtype,
        } => {
            let layer = Layer::from_index(*layer as usize);
            let entity = world
                .spawn((
                    EntityKind::Stairs,
                    layer,
                    BoundingBox::new(Rectangle::new(*x, *y, 16, 16), Point::new(0, 0)),
                    Facing::new(*direction),
                    Suspended::default(),
                    Detector::new(CollisionModes::ORIGIN_POINT),
                    Stairs {
                        subtype: StairsSubtype::parse(subtype),
                        direction: *direction,
                    },
                ))
                .id();
            entities.add_entity(entity, EntityKind::Stairs, layer, Some(name));
        }
    }
    Ok(())
}

/// Spawn the hero (or move the surviving one) at the spawn point.
fn place_hero(
    world: &mut World,
    entities: &mut MapEntities,
    spawn: Point,
    layer: Layer,
    direction: i32,
) {
    let existing = {
        let mut query = world.query_filtered::<Entity, With<Hero>>();
        query.iter(world).next()
    };

    let mut bounding_box = BoundingBox::new(
        Rectangle::new(0, 0, Hero::SIZE, Hero::SIZE),
        Point::new(Hero::ORIGIN_X, Hero::ORIGIN_Y),
    );
    bounding_box.set_origin_position(spawn.x, spawn.y);

    let hero_entity = match existing {
        Some(entity) => {
            let mut entry = world.entity_mut(entity);
            *entry.get_mut::<BoundingBox>().unwrap() = bounding_box;
            *entry.get_mut::<Layer>().unwrap() = layer;
            if direction >= 0 {
                entry.get_mut::<Facing>().unwrap().direction = direction;
            }
            entity
        }
        None => {
            let mut sprites = SpriteSet::default();
            sprites.push(Sprite::new("hero_tunic", "stopped"));
            sprites.push(Sprite::new("hero_sword", "stopped"));
            sprites.push(Sprite::new("hero_shield", "stopped"));
            world
                .spawn((
                    EntityKind::Hero,
                    layer,
                    bounding_box,
                    Facing::new(if direction >= 0 { direction } else { 3 }),
                    Suspended::default(),
                    Hero::new(),
                    Movement::player(Hero::WALKING_SPEED, 0),
                    sprites,
                ))
                .id()
        }
    };
    entities.add_entity(hero_entity, EntityKind::Hero, layer, None);
}

/// Parse and load a map from JSON text.
pub fn load_map_json(world: &mut World, json: &str, destination: &str) -> Result<()> {
    let data = MapData::load_json(json).context("map file")?;
    load_map(world, &data, destination)
}
