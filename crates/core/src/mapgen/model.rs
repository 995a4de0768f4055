//! Public data models for generated floors and the spawns that populate them.

use crate::entity::TrapKind;
use crate::map::Map;
use crate::types::{Pos, RoomType, TileKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Partition,
    Cellular,
    Arena,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpawnKind {
    Enemy(String),
    Boss(String),
    Item(String),
    Trap(TrapKind),
    LockedDoor,
    Stairs,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spawn {
    pub pos: Pos,
    pub kind: SpawnKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedFloor {
    pub floor: u32,
    pub algorithm: Algorithm,
    /// Zero-based attempt that passed validation.
    pub attempt: u32,
    pub map: Map,
    pub start: Pos,
    pub stairs: Pos,
    pub spawns: Vec<Spawn>,
}

impl GeneratedFloor {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(self.floor.to_le_bytes());
        bytes.push(match self.algorithm {
            Algorithm::Partition => 0,
            Algorithm::Cellular => 1,
            Algorithm::Arena => 2,
        });
        bytes.extend((self.map.width as u32).to_le_bytes());
        bytes.extend((self.map.height as u32).to_le_bytes());
        for tile in &self.map.tiles {
            bytes.push(match tile {
                TileKind::Wall => 0,
                TileKind::Floor => 1,
                TileKind::DoorClosed => 2,
                TileKind::DoorOpen => 3,
                TileKind::UpStairs => 4,
                TileKind::DownStairs => 5,
            });
        }

        bytes.extend((self.map.rooms.len() as u32).to_le_bytes());
        for room in &self.map.rooms {
            for value in [room.x, room.y, room.width, room.height] {
                bytes.extend(value.to_le_bytes());
            }
            bytes.push(room_type_code(room.room_type));
        }

        for pos in [self.start, self.stairs] {
            bytes.extend(pos.y.to_le_bytes());
            bytes.extend(pos.x.to_le_bytes());
        }

        bytes.extend((self.spawns.len() as u32).to_le_bytes());
        for spawn in &self.spawns {
            bytes.extend(spawn.pos.y.to_le_bytes());
            bytes.extend(spawn.pos.x.to_le_bytes());
            match &spawn.kind {
                SpawnKind::Enemy(name) => push_named(&mut bytes, 0, name),
                SpawnKind::Boss(name) => push_named(&mut bytes, 1, name),
                SpawnKind::Item(name) => push_named(&mut bytes, 2, name),
                SpawnKind::Trap(kind) => {
                    bytes.push(3);
                    let (code, damage, duration) = match *kind {
                        TrapKind::Spike { damage } => (0_u8, damage, 0),
                        TrapKind::Poison { damage, duration } => (1, damage, duration),
                        TrapKind::Teleport => (2, 0, 0),
                        TrapKind::Alarm => (3, 0, 0),
                    };
                    bytes.push(code);
                    bytes.extend(damage.to_le_bytes());
                    bytes.extend(duration.to_le_bytes());
                }
                SpawnKind::LockedDoor => bytes.push(4),
                SpawnKind::Stairs => bytes.push(5),
            }
        }
        bytes
    }

    pub fn spawns_of<'a>(
        &'a self,
        predicate: impl Fn(&SpawnKind) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Spawn> + 'a {
        self.spawns.iter().filter(move |spawn| predicate(&spawn.kind))
    }
}

fn push_named(bytes: &mut Vec<u8>, tag: u8, name: &str) {
    bytes.push(tag);
    bytes.extend((name.len() as u32).to_le_bytes());
    bytes.extend(name.as_bytes());
}

fn room_type_code(room_type: RoomType) -> u8 {
    match room_type {
        RoomType::Normal => 0,
        RoomType::Start => 1,
        RoomType::Stairs => 2,
        RoomType::Boss => 3,
        RoomType::Treasure => 4,
        RoomType::Shrine => 5,
        RoomType::Library => 6,
        RoomType::Armory => 7,
    }
}
