//! Cave layouts from a smoothed random fill, trimmed to the largest open region.

use std::collections::{BTreeSet, VecDeque};

use crate::config::SimConfig;
use crate::map::{Map, Room};
use crate::rng::SimRng;
use crate::types::{Direction, Pos, TileKind};

use super::grid::floor_regions;

/// Fewer chunk rooms than this falls back to a grid over the cave's bounding box.
const MIN_CHUNK_ROOMS: usize = 3;

pub(super) fn generate(map: &mut Map, rng: &mut SimRng, config: &SimConfig) {
    for pos in map.positions() {
        let tile = if map.is_border(pos) || rng.chance(config.cave_wall_chance) {
            TileKind::Wall
        } else {
            TileKind::Floor
        };
        map.set_tile(pos, tile);
    }

    for _ in 0..config.cave_smoothing_passes {
        smooth(map, config);
    }

    let regions = floor_regions(map);
    let Some(largest) = regions.first() else {
        return;
    };
    let keep: BTreeSet<Pos> = largest.iter().copied().collect();
    for region in regions.iter().skip(1) {
        for &pos in region {
            map.set_tile(pos, TileKind::Wall);
        }
    }

    let mut rooms = chunk_rooms(&keep, config);
    if rooms.len() < MIN_CHUNK_ROOMS {
        rooms = grid_rooms(&keep);
    }
    map.rooms = rooms;
}

fn wall_neighbours(map: &Map, pos: Pos) -> usize {
    pos.neighbors().into_iter().filter(|&next| map.tile(next) == TileKind::Wall).count()
}

fn smooth(map: &mut Map, config: &SimConfig) {
    let snapshot = map.clone();
    for pos in snapshot.positions() {
        if snapshot.is_border(pos) {
            continue;
        }
        let walls = wall_neighbours(&snapshot, pos);
        if walls >= config.cave_wall_threshold {
            map.set_tile(pos, TileKind::Wall);
        } else if walls <= config.cave_floor_threshold {
            map.set_tile(pos, TileKind::Floor);
        }
    }
}

/// Carves the region into bounded flood-fill chunks and keeps the big ones as rooms.
fn chunk_rooms(region: &BTreeSet<Pos>, config: &SimConfig) -> Vec<Room> {
    const ORTHOGONAL: [Direction; 4] =
        [Direction::North, Direction::East, Direction::South, Direction::West];

    let mut assigned = BTreeSet::new();
    let mut rooms = Vec::new();
    for &seed in region {
        if assigned.contains(&seed) {
            continue;
        }
        let mut chunk = vec![seed];
        let mut queue = VecDeque::from([seed]);
        assigned.insert(seed);
        while let Some(pos) = queue.pop_front() {
            for direction in ORTHOGONAL {
                if chunk.len() >= config.cave_max_region_tiles {
                    break;
                }
                let next = pos.step(direction);
                if region.contains(&next) && assigned.insert(next) {
                    chunk.push(next);
                    queue.push_back(next);
                }
            }
        }
        if chunk.len() >= config.cave_min_region_tiles
            && let Some(room) = bounding_room(&chunk)
        {
            rooms.push(room);
        }
    }
    rooms
}

fn bounding_room(tiles: &[Pos]) -> Option<Room> {
    let min_x = tiles.iter().map(|pos| pos.x).min()?;
    let max_x = tiles.iter().map(|pos| pos.x).max()?;
    let min_y = tiles.iter().map(|pos| pos.y).min()?;
    let max_y = tiles.iter().map(|pos| pos.y).max()?;
    Some(Room::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// 3x3 grid over the region's bounding box, keeping cells that contain floor.
fn grid_rooms(region: &BTreeSet<Pos>) -> Vec<Room> {
    let tiles: Vec<Pos> = region.iter().copied().collect();
    let Some(bounds) = bounding_room(&tiles) else {
        return Vec::new();
    };
    let mut rooms = Vec::new();
    for row in 0..3 {
        for column in 0..3 {
            let x = bounds.x + bounds.width * column / 3;
            let y = bounds.y + bounds.height * row / 3;
            let right = bounds.x + bounds.width * (column + 1) / 3;
            let bottom = bounds.y + bounds.height * (row + 1) / 3;
            let cell = Room::new(x, y, right - x, bottom - y);
            if cell.width > 0 && cell.height > 0 && cell.tiles().any(|pos| region.contains(&pos)) {
                rooms.push(cell);
            }
        }
    }
    rooms
}
