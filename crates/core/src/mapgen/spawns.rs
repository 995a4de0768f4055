//! Room-driven population: enemies, loot, the boss and hidden traps.

use std::collections::BTreeSet;

use crate::config::SimConfig;
use crate::content::{boss_for_floor, content, keys};
use crate::entity::{ItemKind, TrapKind};
use crate::map::{Map, Room};
use crate::rng::SimRng;
use crate::types::{Pos, RoomType, TileKind};

use super::model::{Spawn, SpawnKind};
use super::rooms::Features;

pub(super) struct SpawnContext<'a> {
    pub(super) map: &'a Map,
    pub(super) floor: u32,
    pub(super) config: &'a SimConfig,
    pub(super) features: &'a Features,
}

struct Placer {
    occupied: BTreeSet<Pos>,
    spawns: Vec<Spawn>,
}

impl Placer {
    fn free_tiles(&self, map: &Map, room: &Room) -> Vec<Pos> {
        room.tiles()
            .filter(|&pos| map.tile(pos) == TileKind::Floor && !self.occupied.contains(&pos))
            .collect()
    }

    /// Removes a random tile from `free` and claims it.
    fn claim(&mut self, rng: &mut SimRng, free: &mut Vec<Pos>) -> Option<Pos> {
        while !free.is_empty() {
            let index = rng.below(free.len() as u64) as usize;
            let pos = free.swap_remove(index);
            if self.occupied.insert(pos) {
                return Some(pos);
            }
        }
        None
    }

    fn put(&mut self, rng: &mut SimRng, free: &mut Vec<Pos>, kind: SpawnKind) {
        if let Some(pos) = self.claim(rng, free) {
            self.spawns.push(Spawn { pos, kind });
        }
    }

    fn enemy(&mut self, rng: &mut SimRng, free: &mut Vec<Pos>, floor: u32) {
        if let Some(template) = content().pick_enemy(rng, floor) {
            self.put(rng, free, SpawnKind::Enemy(template.name.to_owned()));
        }
    }

    fn item(
        &mut self,
        rng: &mut SimRng,
        free: &mut Vec<Pos>,
        floor: u32,
        filter: impl Fn(ItemKind) -> bool,
    ) {
        if let Some(template) = content().pick_item(rng, floor, |template| filter(template.kind)) {
            self.put(rng, free, SpawnKind::Item(template.name.to_owned()));
        }
    }
}

pub(super) fn populate(context: &SpawnContext<'_>, rng: &mut SimRng) -> Vec<Spawn> {
    let SpawnContext { map, floor, config, features } = *context;
    let mut placer = Placer { occupied: features.reserved(), spawns: Vec::new() };

    placer.spawns.push(Spawn { pos: features.stairs, kind: SpawnKind::Stairs });
    for &door in &features.locked_doors {
        placer.spawns.push(Spawn { pos: door, kind: SpawnKind::LockedDoor });
    }
    if let Some(key) = features.key {
        placer.spawns.push(Spawn { pos: key, kind: SpawnKind::Item(keys::BOSS_KEY.to_owned()) });
    }

    for room in &map.rooms {
        let mut free = placer.free_tiles(map, room);
        match room.room_type {
            RoomType::Start => {
                if floor == 1 {
                    for name in [keys::HEALTH_POTION, keys::DAGGER] {
                        placer.put(rng, &mut free, SpawnKind::Item(name.to_owned()));
                    }
                }
            }
            RoomType::Normal | RoomType::Stairs => {
                let wanted = (floor / 2) as usize + rng.range_usize(1, 3);
                let count = wanted.min(free.len() / 2);
                for _ in 0..count {
                    placer.enemy(rng, &mut free, floor);
                }
                if rng.chance(0.3) {
                    placer.item(rng, &mut free, floor, |_| true);
                }
            }
            RoomType::Treasure => {
                for _ in 0..rng.range_usize(2, 3) {
                    placer.item(rng, &mut free, floor, |_| true);
                }
                placer.enemy(rng, &mut free, floor);
            }
            RoomType::Shrine => placer.item(rng, &mut free, floor, |kind| kind == ItemKind::Potion),
            RoomType::Library => {
                for _ in 0..rng.range_usize(1, 2) {
                    placer.item(rng, &mut free, floor, |kind| {
                        matches!(kind, ItemKind::Scroll | ItemKind::Wand)
                    });
                }
            }
            RoomType::Armory => {
                for _ in 0..rng.range_usize(1, 2) {
                    placer.item(rng, &mut free, floor, |kind| {
                        matches!(
                            kind,
                            ItemKind::Weapon
                                | ItemKind::Armor
                                | ItemKind::Shield
                                | ItemKind::Ring
                                | ItemKind::Amulet
                        )
                    });
                }
            }
            RoomType::Boss => {
                if let Some(name) = boss_for_floor(floor, config) {
                    // The boss takes the free tile closest to the room centre.
                    let centre = room.center();
                    free.sort_by_key(|&pos| (pos.distance_squared(centre), pos));
                    if let Some(&pos) = free.first() {
                        free.remove(0);
                        placer.occupied.insert(pos);
                        placer.spawns.push(Spawn { pos, kind: SpawnKind::Boss(name.to_owned()) });
                    }
                }
                for _ in 0..rng.range_usize(1, 2) {
                    placer.enemy(rng, &mut free, floor);
                }
            }
        }
    }

    place_traps(&mut placer, map, rng, floor);
    placer.spawns
}

fn place_traps(placer: &mut Placer, map: &Map, rng: &mut SimRng, floor: u32) {
    let start_room = map.room_of_type(RoomType::Start).copied();
    let mut free: Vec<Pos> = map
        .floor_positions()
        .into_iter()
        .filter(|&pos| !placer.occupied.contains(&pos))
        .filter(|&pos| !start_room.is_some_and(|room| room.contains(pos)))
        .collect();
    for _ in 0..rng.range_usize(1, 3) {
        let kind = match rng.below(4) {
            0 => TrapKind::Spike { damage: 5 + floor as i32 },
            1 => TrapKind::Poison { damage: 2, duration: 3 },
            2 => TrapKind::Teleport,
            _ => TrapKind::Alarm,
        };
        placer.put(rng, &mut free, SpawnKind::Trap(kind));
    }
}
