//! Room roles and fixed floor features: start, stairs, the boss ring and its key.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::map::Map;
use crate::rng::SimRng;
use crate::types::{Direction, Pos, RoomType, TileKind};

use super::grid::nearest_floor;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(super) struct Features {
    pub(super) start: Pos,
    pub(super) stairs: Pos,
    pub(super) up_stairs: Option<Pos>,
    pub(super) locked_doors: Vec<Pos>,
    pub(super) key: Option<Pos>,
}

impl Features {
    pub(super) fn reserved(&self) -> BTreeSet<Pos> {
        let mut reserved: BTreeSet<Pos> = self.locked_doors.iter().copied().collect();
        reserved.insert(self.start);
        reserved.insert(self.stairs);
        reserved.extend(self.up_stairs);
        reserved.extend(self.key);
        reserved
    }
}

/// Start is the room nearest the map centre; the rest are ranked by distance from it.
pub(super) fn assign_room_types(map: &mut Map, rng: &mut SimRng, boss_floor: bool) {
    let centre = Pos { y: map.height as i32 / 2, x: map.width as i32 / 2 };
    let Some(start_index) = (0..map.rooms.len()).min_by_key(|&index| {
        map.rooms.get(index).map(|room| room.center().distance_squared(centre))
    }) else {
        return;
    };

    let start_centre = map.rooms.get(start_index).map(|room| room.center()).unwrap_or(centre);
    let mut by_distance: Vec<usize> = (0..map.rooms.len()).filter(|&i| i != start_index).collect();
    by_distance.sort_by_key(|&index| {
        let distance =
            map.rooms.get(index).map_or(0, |room| room.center().distance_squared(start_centre));
        (Reverse(distance), index)
    });

    let mut roles = vec![RoomType::Normal; map.rooms.len()];
    if let Some(role) = roles.get_mut(start_index) {
        *role = RoomType::Start;
    }
    let mut ranked = by_distance.into_iter();
    if let Some(role) = ranked.next().and_then(|index| roles.get_mut(index)) {
        *role = RoomType::Stairs;
    }
    if boss_floor && let Some(role) = ranked.next().and_then(|index| roles.get_mut(index)) {
        *role = RoomType::Boss;
    }
    for index in ranked {
        let roll = rng.unit();
        if let Some(role) = roles.get_mut(index) {
            *role = match roll {
                r if r < 0.25 => RoomType::Treasure,
                r if r < 0.40 => RoomType::Shrine,
                r if r < 0.50 => RoomType::Library,
                r if r < 0.60 => RoomType::Armory,
                _ => RoomType::Normal,
            };
        }
    }
    for (room, role) in map.rooms.iter_mut().zip(roles) {
        room.room_type = role;
    }
}

/// Stamps stairs, boss doors and the key. `None` when a required feature has no legal tile.
pub(super) fn place_features(map: &mut Map, rng: &mut SimRng, floor: u32) -> Option<Features> {
    let start_room = *map.room_of_type(RoomType::Start)?;
    let stairs_room = *map.room_of_type(RoomType::Stairs)?;

    let start = nearest_floor(map, start_room.center())?;
    let stairs = nearest_floor(map, stairs_room.center()).filter(|&pos| pos != start)?;
    map.set_tile(stairs, TileKind::DownStairs);

    let up_stairs = if floor > 1 {
        nearest_floor(map, start.step(Direction::East))
            .filter(|&pos| pos != start && pos.chebyshev(start) <= 2)
    } else {
        None
    };
    if let Some(pos) = up_stairs {
        map.set_tile(pos, TileKind::UpStairs);
    }

    let mut features = Features { start, stairs, up_stairs, ..Features::default() };
    let Some(boss_room) = map.room_of_type(RoomType::Boss).copied() else {
        return Some(features);
    };

    // Cave rooms are bounding boxes that may overlap; a feature on or inside the ring
    // would leave a gap the doors cannot close.
    let enclosure = boss_room.expanded(1);
    if [start, stairs].into_iter().chain(up_stairs).any(|pos| enclosure.contains(pos)) {
        return None;
    }
    for pos in boss_room.ring() {
        if map.is_walkable(pos) {
            map.set_tile(pos, TileKind::DoorClosed);
            features.locked_doors.push(pos);
        }
    }
    features.key = Some(place_key(map, rng, &features)?);
    Some(features)
}

/// A tile the player can reach from the start while every boss door is still shut.
fn place_key(map: &Map, rng: &mut SimRng, features: &Features) -> Option<Pos> {
    let reachable = reachable_without_doors(map, features.start);
    let boss_room = map.room_of_type(RoomType::Boss);
    let usable = |pos: &Pos| {
        map.tile(*pos) == TileKind::Floor
            && *pos != features.start
            && reachable.contains(pos)
            && !boss_room.is_some_and(|room| room.contains(*pos))
    };

    let candidate_rooms: Vec<Vec<Pos>> = map
        .rooms
        .iter()
        .filter(|room| {
            !matches!(room.room_type, RoomType::Start | RoomType::Boss | RoomType::Stairs)
        })
        .map(|room| room.tiles().filter(|pos| usable(pos)).collect::<Vec<_>>())
        .filter(|tiles| !tiles.is_empty())
        .collect();
    if let Some(tiles) = rng.pick(&candidate_rooms) {
        return rng.pick(tiles).copied();
    }

    let start_room = map.room_of_type(RoomType::Start)?;
    let off_centre: Vec<Pos> = start_room.tiles().filter(|pos| usable(pos)).collect();
    if let Some(pos) = rng.pick(&off_centre) {
        return Some(*pos);
    }
    reachable.iter().copied().find(|pos| usable(pos))
}

/// Tiles reachable from `start` with every closed door treated as a wall.
pub(super) fn reachable_without_doors(map: &Map, start: Pos) -> BTreeSet<Pos> {
    let mut seen = BTreeSet::from([start]);
    let mut frontier = vec![start];
    while let Some(pos) = frontier.pop() {
        for next in pos.neighbors() {
            if map.in_bounds(next) && !map.blocks_movement(next) && seen.insert(next) {
                frontier.push(next);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Room;
    use crate::mapgen::grid::{carve_l_corridor, carve_room};

    fn three_room_map() -> Map {
        let mut map = Map::new(40, 20);
        let rooms = vec![Room::new(16, 7, 6, 5), Room::new(2, 2, 5, 5), Room::new(33, 13, 5, 5)];
        for room in &rooms {
            carve_room(&mut map, room);
        }
        carve_l_corridor(&mut map, rooms[0].center(), rooms[1].center(), true);
        carve_l_corridor(&mut map, rooms[0].center(), rooms[2].center(), true);
        map.rooms = rooms;
        map
    }

    #[test]
    fn start_is_central_and_stairs_are_farthest() {
        let mut map = three_room_map();
        assign_room_types(&mut map, &mut SimRng::seed_from_u64(1), false);
        assert_eq!(map.rooms[0].room_type, RoomType::Start);
        assert_eq!(map.rooms[2].room_type, RoomType::Stairs);

        let features = place_features(&mut map, &mut SimRng::seed_from_u64(1), 1)
            .expect("features fit");
        assert_eq!(map.tile(features.stairs), TileKind::DownStairs);
        assert!(features.locked_doors.is_empty());
        assert_eq!(features.key, None);
        assert_eq!(features.up_stairs, None);
    }

    #[test]
    fn boss_room_is_ringed_with_doors_and_key_stays_reachable() {
        let mut map = three_room_map();
        assign_room_types(&mut map, &mut SimRng::seed_from_u64(3), true);
        assert_eq!(map.rooms[1].room_type, RoomType::Boss);

        let features = place_features(&mut map, &mut SimRng::seed_from_u64(3), 3)
            .expect("features fit");
        assert!(!features.locked_doors.is_empty());
        for door in &features.locked_doors {
            assert_eq!(map.tile(*door), TileKind::DoorClosed);
        }
        let key = features.key.expect("boss floors carry a key");
        assert!(reachable_without_doors(&map, features.start).contains(&key));
        assert!(!map.rooms[1].contains(key));
        assert!(features.up_stairs.is_some());
    }

    #[test]
    fn features_touching_the_boss_ring_are_rejected() {
        let mut map = three_room_map();
        assign_room_types(&mut map, &mut SimRng::seed_from_u64(3), true);
        // Grow the boss room until its ring runs through the start room.
        let boss = map.rooms[1];
        map.rooms[1] = Room { width: 18, height: 9, ..boss };
        assert!(map.rooms[1].expanded(1).contains(map.rooms[0].center()));
        assert_eq!(place_features(&mut map, &mut SimRng::seed_from_u64(3), 3), None);
    }

    #[test]
    fn every_walkable_ring_tile_is_locked() {
        let mut map = three_room_map();
        assign_room_types(&mut map, &mut SimRng::seed_from_u64(3), true);
        // A second corridor clipping the boss room's corner.
        let boss = map.rooms[1];
        carve_l_corridor(&mut map, boss.center(), Pos { y: boss.bottom() + 3, x: 30 }, false);

        let features = place_features(&mut map, &mut SimRng::seed_from_u64(3), 3)
            .expect("features fit");
        for pos in map.rooms[1].ring() {
            assert!(!map.is_walkable(pos) || map.tile(pos) == TileKind::DoorClosed, "{pos:?}");
        }
        let reachable = reachable_without_doors(&map, features.start);
        assert!(map.rooms[1].tiles().all(|pos| !reachable.contains(&pos)));
    }
}
