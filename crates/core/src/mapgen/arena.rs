//! Fixed final-floor layout: a small central antechamber between a great hall and the way down.

use crate::map::{Map, Room};

use super::grid::{carve_l_corridor, carve_room};

pub(super) fn generate(map: &mut Map) {
    let (width, height) = (map.width as i32, map.height as i32);
    let centre_x = width / 2;
    let centre_y = height / 2;

    let start = Room::new(centre_x - 3, centre_y - 3, 7, 6);
    let hall = Room::new(width / 20, height / 4, width * 3 / 8 - width / 20, height / 2);
    let exit = Room::new(width * 3 / 4, height * 2 / 5, width * 9 / 10 - width * 3 / 4, height / 5);

    for room in [&start, &hall, &exit] {
        carve_room(map, room);
    }
    carve_l_corridor(map, start.center(), hall.center(), true);
    carve_l_corridor(map, start.center(), exit.center(), true);
    map.rooms = vec![start, hall, exit];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::grid::walkable_component_count;

    #[test]
    fn arena_has_three_connected_rooms() {
        let mut map = Map::new(80, 50);
        generate(&mut map);
        assert_eq!(map.rooms.len(), 3);
        assert_eq!(walkable_component_count(&map), 1);
        assert_eq!(map.rooms[1], Room::new(4, 12, 26, 25));
        assert_eq!(map.rooms[2], Room::new(60, 20, 12, 10));
    }
}
