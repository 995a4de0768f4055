//! Carving and connectivity primitives shared by the layout algorithms.

use std::cmp::Reverse;
use std::collections::VecDeque;

use crate::map::{Map, Room};
use crate::types::{Direction, Pos, TileKind};

/// Opens every tile of `room` that is not on the map border.
pub(super) fn carve_room(map: &mut Map, room: &Room) {
    for pos in room.tiles() {
        if map.in_bounds(pos) && !map.is_border(pos) {
            map.set_tile(pos, TileKind::Floor);
        }
    }
}

pub(super) fn carve_l_corridor(map: &mut Map, start: Pos, end: Pos, horizontal_first: bool) {
    if horizontal_first {
        carve_horizontal(map, start.y, start.x, end.x);
        carve_vertical(map, end.x, start.y, end.y);
    } else {
        carve_vertical(map, start.x, start.y, end.y);
        carve_horizontal(map, end.y, start.x, end.x);
    }
}

fn carve_horizontal(map: &mut Map, y: i32, from_x: i32, to_x: i32) {
    for x in from_x.min(to_x)..=from_x.max(to_x) {
        open_tile(map, Pos { y, x });
    }
}

fn carve_vertical(map: &mut Map, x: i32, from_y: i32, to_y: i32) {
    for y in from_y.min(to_y)..=from_y.max(to_y) {
        open_tile(map, Pos { y, x });
    }
}

fn open_tile(map: &mut Map, pos: Pos) {
    if map.in_bounds(pos) && !map.is_border(pos) && map.tile(pos) == TileKind::Wall {
        map.set_tile(pos, TileKind::Floor);
    }
}

/// Walkable tiles reachable from `start` over 8 neighbours, in visit order.
pub(super) fn walkable_reach(map: &Map, start: Pos) -> Vec<Pos> {
    flood(map, start, &Direction::ALL, |tile| tile.is_walkable())
}

/// Number of 8-connected components formed by walkable tiles.
pub(super) fn walkable_component_count(map: &Map) -> usize {
    let mut seen = vec![false; map.width * map.height];
    let mut components = 0;
    for pos in map.positions() {
        let index = (pos.y as usize) * map.width + (pos.x as usize);
        if seen.get(index).copied().unwrap_or(true) || !map.is_walkable(pos) {
            continue;
        }
        components += 1;
        for reached in walkable_reach(map, pos) {
            if let Some(flag) = seen.get_mut((reached.y as usize) * map.width + (reached.x as usize))
            {
                *flag = true;
            }
        }
    }
    components
}

const ORTHOGONAL: [Direction; 4] =
    [Direction::North, Direction::East, Direction::South, Direction::West];

/// Floor tiles 4-connected to `start`, in visit order.
pub(super) fn floor_region(map: &Map, start: Pos) -> Vec<Pos> {
    flood(map, start, &ORTHOGONAL, |tile| tile == TileKind::Floor)
}

/// Every 4-connected floor region, largest first; equal sizes keep scan order.
pub(super) fn floor_regions(map: &Map) -> Vec<Vec<Pos>> {
    let mut seen = vec![false; map.width * map.height];
    let mut regions = Vec::new();
    for pos in map.positions() {
        let index = (pos.y as usize) * map.width + (pos.x as usize);
        if seen.get(index).copied().unwrap_or(true) || map.tile(pos) != TileKind::Floor {
            continue;
        }
        let region = floor_region(map, pos);
        for reached in &region {
            if let Some(flag) = seen.get_mut((reached.y as usize) * map.width + (reached.x as usize))
            {
                *flag = true;
            }
        }
        regions.push(region);
    }
    regions.sort_by_key(|region| Reverse(region.len()));
    regions
}

fn flood(
    map: &Map,
    start: Pos,
    directions: &[Direction],
    passable: impl Fn(TileKind) -> bool,
) -> Vec<Pos> {
    if !map.in_bounds(start) || !passable(map.tile(start)) {
        return Vec::new();
    }
    let mut seen = vec![false; map.width * map.height];
    let index = |pos: Pos| (pos.y as usize) * map.width + (pos.x as usize);
    let mut queue = VecDeque::from([start]);
    let mut visited = Vec::new();
    if let Some(flag) = seen.get_mut(index(start)) {
        *flag = true;
    }
    while let Some(pos) = queue.pop_front() {
        visited.push(pos);
        for &direction in directions {
            let next = pos.step(direction);
            if !map.in_bounds(next) || !passable(map.tile(next)) {
                continue;
            }
            if let Some(flag) = seen.get_mut(index(next))
                && !*flag
            {
                *flag = true;
                queue.push_back(next);
            }
        }
    }
    visited
}

/// Nearest plain floor tile to `target` by ring search, preferring lower y then x.
pub(super) fn nearest_floor(map: &Map, target: Pos) -> Option<Pos> {
    if map.tile(target) == TileKind::Floor {
        return Some(target);
    }
    let max_radius = map.width.max(map.height) as i32;
    for radius in 1..=max_radius {
        let mut ring = (target.y - radius..=target.y + radius).flat_map(|y| {
            (target.x - radius..=target.x + radius)
                .map(move |x| Pos { y, x })
                .filter(move |pos| pos.chebyshev(target) == radius as u32)
        });
        if let Some(found) = ring.find(|&pos| map.tile(pos) == TileKind::Floor) {
            return Some(found);
        }
    }
    None
}
