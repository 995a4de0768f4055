//! Plain value types shared by every simulation subsystem.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self { y: self.y + dy, x: self.x + dx }
    }

    pub fn chebyshev(self, other: Pos) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    pub fn manhattan(self, other: Pos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn distance_squared(self, other: Pos) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }

    pub fn is_adjacent(self, other: Pos) -> bool {
        self != other && self.chebyshev(other) == 1
    }

    /// Eight surrounding tiles in `Direction::ALL` order.
    pub fn neighbors(self) -> [Pos; 8] {
        Direction::ALL.map(|direction| self.step(direction))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// Fixed scan order; every neighbour tie-break in the crate follows it.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    pub fn between(from: Pos, to: Pos) -> Option<Direction> {
        let delta = ((to.x - from.x).signum(), (to.y - from.y).signum());
        Direction::ALL.into_iter().find(|direction| direction.delta() == delta)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Wall,
    Floor,
    DoorClosed,
    DoorOpen,
    UpStairs,
    DownStairs,
}

impl TileKind {
    /// Passable for connectivity purposes; closed doors count because they can be opened.
    pub fn is_walkable(self) -> bool {
        self != TileKind::Wall
    }

    pub fn blocks_movement(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::DoorClosed)
    }

    pub fn blocks_sight(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::DoorClosed)
    }
}

/// What the rendering collaborator is allowed to know about a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileVisibility {
    Visible,
    Explored,
    Unexplored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoomType {
    Normal,
    Start,
    Stairs,
    Boss,
    Treasure,
    Shrine,
    Library,
    Armory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    MainHand,
    OffHand,
    Head,
    Body,
    Ring,
    Amulet,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 6] = [
        EquipSlot::MainHand,
        EquipSlot::OffHand,
        EquipSlot::Head,
        EquipSlot::Body,
        EquipSlot::Ring,
        EquipSlot::Amulet,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Poison,
    Burning,
    Stunned,
    Confused,
    Weakened,
    Strengthened,
    Blinded,
    Regenerating,
    Hasted,
    Slowed,
    Shielded,
    Invisible,
}

impl StatusKind {
    pub fn is_negative(self) -> bool {
        matches!(
            self,
            StatusKind::Poison
                | StatusKind::Burning
                | StatusKind::Stunned
                | StatusKind::Confused
                | StatusKind::Weakened
                | StatusKind::Blinded
                | StatusKind::Slowed
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelUpChoice {
    MaxHp,
    Attack,
    Defense,
    Speed,
}

/// One player intent submitted to the scheduler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    Move(Direction),
    Wait,
    PickUp,
    UseStairs,
    UseItem(usize),
    DropItem(usize),
    EquipItem(usize),
    UnequipSlot(EquipSlot),
    LevelUp(LevelUpChoice),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Victory,
    Defeat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_and_between_agree_for_every_direction() {
        let origin = Pos { y: 5, x: 5 };
        for direction in Direction::ALL {
            let next = origin.step(direction);
            assert!(origin.is_adjacent(next));
            assert_eq!(Direction::between(origin, next), Some(direction));
        }
        assert_eq!(Direction::between(origin, origin), None);
    }

    #[test]
    fn distance_metrics_match_grid_geometry() {
        let a = Pos { y: 1, x: 1 };
        let b = Pos { y: 4, x: 3 };
        assert_eq!(a.chebyshev(b), 3);
        assert_eq!(a.manhattan(b), 5);
        assert_eq!(a.distance_squared(b), 13);
    }

    #[test]
    fn doors_block_only_while_closed() {
        assert!(TileKind::DoorClosed.blocks_movement());
        assert!(TileKind::DoorClosed.blocks_sight());
        assert!(!TileKind::DoorOpen.blocks_movement());
        assert!(TileKind::DoorClosed.is_walkable());
        assert!(!TileKind::Wall.is_walkable());
    }
}
