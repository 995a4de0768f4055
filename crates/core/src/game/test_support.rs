//! Shared fixtures for the `game` submodule test suites.
//! Hand-built maps keep the scenarios independent of floor generation.

use crate::config::SimConfig;
use crate::content::{content, make_enemy, make_item, make_trap};
use crate::entity::TrapKind;
use crate::map::{Map, Room};
use crate::types::{EntityId, Pos, TileKind};
use crate::world::World;

/// Floor everywhere inside a one-tile wall border.
pub(crate) fn open_map(width: usize, height: usize) -> Map {
    let mut map = Map::new(width, height);
    for pos in map.positions() {
        if !map.is_border(pos) {
            map.set_tile(pos, TileKind::Floor);
        }
    }
    map
}

/// A 5x5 room sealed by a wall ring, sitting inside a larger open map.
pub(crate) fn walled_room_map() -> (Map, Room) {
    let mut map = open_map(20, 20);
    let room = Room::new(6, 6, 5, 5);
    for pos in room.ring() {
        map.set_tile(pos, TileKind::Wall);
    }
    (map, room)
}

/// A world on a 20x15 open arena with the player at `player`.
pub(crate) fn arena_world(config: &SimConfig, player: Pos) -> World {
    let mut world = World::new(42, config);
    world.floor = 1;
    world.map = open_map(20, 15);
    world.map.rooms.push(Room::new(1, 1, 18, 13));
    if let Some(entity) = world.player_mut() {
        entity.pos = player;
    }
    world
}

pub(crate) fn spawn_enemy(world: &mut World, config: &SimConfig, name: &str, pos: Pos) -> EntityId {
    let template = content().enemy(name).expect("enemy template exists");
    let id = world.alloc_id();
    let enemy = make_enemy(template, id, pos, world.floor, config);
    world.spawn(enemy)
}

pub(crate) fn place_item(world: &mut World, name: &str, pos: Pos) -> EntityId {
    let template = content().item(name).expect("item template exists");
    let id = world.alloc_id();
    world.spawn(make_item(template, id, pos))
}

/// Puts an item straight into the player's pack and returns its inventory index.
pub(crate) fn give_item(world: &mut World, name: &str) -> usize {
    let template = content().item(name).expect("item template exists");
    let id = world.alloc_id();
    let item = make_item(template, id, Pos { y: 0, x: 0 });
    let inventory =
        world.player_mut().and_then(|player| player.inventory.as_mut()).expect("player inventory");
    inventory.items.push(item);
    inventory.items.len() - 1
}

pub(crate) fn place_trap(world: &mut World, kind: TrapKind, pos: Pos) -> EntityId {
    let id = world.alloc_id();
    world.spawn(make_trap(id, pos, kind))
}
