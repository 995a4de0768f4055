//! Recursive space partitioning: split the interior into leaves, drop a room in each,
//! then join sibling subtrees with L-shaped corridors.

use crate::config::SimConfig;
use crate::map::{Map, Room};
use crate::rng::SimRng;

use super::grid::{carve_l_corridor, carve_room};

struct Node {
    bounds: Room,
    room: Option<Room>,
    children: Option<Box<(Node, Node)>>,
}

impl Node {
    /// First room found in this subtree, left to right.
    fn representative(&self) -> Option<Room> {
        if let Some(room) = self.room {
            return Some(room);
        }
        let (left, right) = self.children.as_deref()?;
        left.representative().or_else(|| right.representative())
    }

    fn collect_rooms(&self, rooms: &mut Vec<Room>) {
        if let Some(room) = self.room {
            rooms.push(room);
        }
        if let Some((left, right)) = self.children.as_deref() {
            left.collect_rooms(rooms);
            right.collect_rooms(rooms);
        }
    }
}

pub(super) fn generate(map: &mut Map, rng: &mut SimRng, config: &SimConfig) {
    let interior = Room::new(1, 1, map.width as i32 - 2, map.height as i32 - 2);
    let mut root = split(interior, 0, rng, config);
    place_rooms(&mut root, rng, config);

    let mut rooms = Vec::new();
    root.collect_rooms(&mut rooms);
    for room in &rooms {
        carve_room(map, room);
    }
    connect(&root, map, rng);
    map.rooms = rooms;
}

fn split(bounds: Room, depth: u32, rng: &mut SimRng, config: &SimConfig) -> Node {
    let leaf = Node { bounds, room: None, children: None };
    if depth >= config.partition_max_depth {
        return leaf;
    }

    let min_width = config.partition_min_leaf_width as i32;
    let min_height = config.partition_min_leaf_height as i32;
    let (width, height) = (f64::from(bounds.width), f64::from(bounds.height));
    let split_rows = if width < height * 0.8 {
        true
    } else if height < width * 0.8 {
        false
    } else {
        rng.chance(0.5)
    };

    let ratio = 0.3 + rng.unit() * 0.4;
    let children = if split_rows {
        let top = (f64::from(bounds.height) * ratio) as i32;
        let bottom = bounds.height - top;
        if top < min_height || bottom < min_height {
            return leaf;
        }
        (
            Room::new(bounds.x, bounds.y, bounds.width, top),
            Room::new(bounds.x, bounds.y + top, bounds.width, bottom),
        )
    } else {
        let left = (f64::from(bounds.width) * ratio) as i32;
        let right = bounds.width - left;
        if left < min_width || right < min_width {
            return leaf;
        }
        (
            Room::new(bounds.x, bounds.y, left, bounds.height),
            Room::new(bounds.x + left, bounds.y, right, bounds.height),
        )
    };

    let first = split(children.0, depth + 1, rng, config);
    let second = split(children.1, depth + 1, rng, config);
    Node { bounds, room: None, children: Some(Box::new((first, second))) }
}

fn place_rooms(node: &mut Node, rng: &mut SimRng, config: &SimConfig) {
    if let Some(children) = node.children.as_deref_mut() {
        place_rooms(&mut children.0, rng, config);
        place_rooms(&mut children.1, rng, config);
        return;
    }

    // One tile of margin on every side of the leaf.
    let usable_width = node.bounds.width - 2;
    let usable_height = node.bounds.height - 2;
    let min_width = config.partition_room_min_width as i32;
    let min_height = config.partition_room_min_height as i32;
    if usable_width < min_width || usable_height < min_height {
        return;
    }
    let width = rng.range_i32(min_width, usable_width.min(config.partition_room_max_width as i32));
    let height =
        rng.range_i32(min_height, usable_height.min(config.partition_room_max_height as i32));
    let x = node.bounds.x + 1 + rng.range_i32(0, usable_width - width);
    let y = node.bounds.y + 1 + rng.range_i32(0, usable_height - height);
    node.room = Some(Room::new(x, y, width, height));
}

fn connect(node: &Node, map: &mut Map, rng: &mut SimRng) {
    let Some((left, right)) = node.children.as_deref() else {
        return;
    };
    connect(left, map, rng);
    connect(right, map, rng);
    if let (Some(a), Some(b)) = (left.representative(), right.representative()) {
        let horizontal_first = rng.chance(0.5);
        carve_l_corridor(map, a.center(), b.center(), horizontal_first);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::grid::walkable_component_count;

    #[test]
    fn rooms_respect_size_bounds_and_never_overlap() {
        let config = SimConfig::default();
        for seed in 0..20 {
            let mut map = Map::new(config.map_width, config.map_height);
            let mut rng = SimRng::seed_from_u64(seed);
            generate(&mut map, &mut rng, &config);

            assert!(map.rooms.len() >= 4, "seed {seed} produced {} rooms", map.rooms.len());
            for room in &map.rooms {
                assert!((4..=12).contains(&room.width), "{room:?}");
                assert!((4..=10).contains(&room.height), "{room:?}");
                assert!(room.x >= 2 && room.y >= 2);
            }
            for (index, room) in map.rooms.iter().enumerate() {
                for other in map.rooms.iter().skip(index + 1) {
                    assert!(!room.intersects(other), "{room:?} overlaps {other:?}");
                }
            }
        }
    }

    #[test]
    fn corridors_join_every_room_into_one_component() {
        let config = SimConfig::default();
        for seed in 0..20 {
            let mut map = Map::new(config.map_width, config.map_height);
            generate(&mut map, &mut SimRng::seed_from_u64(seed), &config);
            assert_eq!(walkable_component_count(&map), 1, "seed {seed}");
        }
    }
}
