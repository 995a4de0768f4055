//! Tile grid, explored memory and the room list for the current floor.

use serde::{Deserialize, Serialize};

use crate::types::{Pos, RoomType, TileKind};

/// Axis-aligned room rectangle; `x`/`y` is the top-left floor tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub room_type: RoomType,
}

impl Room {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height, room_type: RoomType::Normal }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width - 1
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height - 1
    }

    pub fn center(&self) -> Pos {
        Pos { y: self.y + self.height / 2, x: self.x + self.width / 2 }
    }

    pub fn area(&self) -> usize {
        (self.width.max(0) * self.height.max(0)) as usize
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x >= self.x && pos.x <= self.right() && pos.y >= self.y && pos.y <= self.bottom()
    }

    pub fn expanded(&self, margin: i32) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2,
            height: self.height + margin * 2,
            room_type: self.room_type,
        }
    }

    pub fn intersects(&self, other: &Room) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    /// Row-major tiles inside the rectangle.
    pub fn tiles(&self) -> impl Iterator<Item = Pos> + use<> {
        let (x, right) = (self.x, self.right());
        (self.y..=self.bottom()).flat_map(move |y| (x..=right).map(move |x| Pos { y, x }))
    }

    /// Row-major tiles on the one-tile ring just outside the rectangle.
    pub fn ring(&self) -> impl Iterator<Item = Pos> + use<> {
        let inner = *self;
        self.expanded(1).tiles().filter(move |&pos| !inner.contains(pos))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<TileKind>,
    /// Tiles ever seen by the player; never cleared.
    pub explored: Vec<bool>,
    pub rooms: Vec<Room>,
}

impl Map {
    /// A map of solid wall.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![TileKind::Wall; width * height],
            explored: vec![false; width * height],
            rooms: Vec::new(),
        }
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// True for tiles on the outermost ring, which generation never opens.
    pub fn is_border(&self, pos: Pos) -> bool {
        pos.x == 0
            || pos.y == 0
            || pos.x as usize == self.width.saturating_sub(1)
            || pos.y as usize == self.height.saturating_sub(1)
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.in_bounds(pos).then(|| (pos.y as usize) * self.width + (pos.x as usize))
    }

    /// Out-of-bounds reads as wall.
    pub fn tile(&self, pos: Pos) -> TileKind {
        self.index(pos).and_then(|index| self.tiles.get(index).copied()).unwrap_or(TileKind::Wall)
    }

    pub fn set_tile(&mut self, pos: Pos, tile: TileKind) {
        if let Some(slot) = self.index(pos).and_then(|index| self.tiles.get_mut(index)) {
            *slot = tile;
        }
    }

    pub fn is_walkable(&self, pos: Pos) -> bool {
        self.tile(pos).is_walkable()
    }

    pub fn blocks_movement(&self, pos: Pos) -> bool {
        self.tile(pos).blocks_movement()
    }

    pub fn blocks_sight(&self, pos: Pos) -> bool {
        self.tile(pos).blocks_sight()
    }

    pub fn reveal(&mut self, pos: Pos) {
        if let Some(slot) = self.index(pos).and_then(|index| self.explored.get_mut(index)) {
            *slot = true;
        }
    }

    pub fn reveal_all(&mut self) {
        self.explored.iter_mut().for_each(|explored| *explored = true);
    }

    pub fn is_explored(&self, pos: Pos) -> bool {
        self.index(pos).and_then(|index| self.explored.get(index).copied()).unwrap_or(false)
    }

    pub fn room_at(&self, pos: Pos) -> Option<&Room> {
        self.rooms.iter().find(|room| room.contains(pos))
    }

    pub fn room_of_type(&self, room_type: RoomType) -> Option<&Room> {
        self.rooms.iter().find(|room| room.room_type == room_type)
    }

    /// Every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let (width, height) = (self.width as i32, self.height as i32);
        (0..height).flat_map(move |y| (0..width).map(move |x| Pos { y, x }))
    }

    /// Plain floor tiles, row-major.
    pub fn floor_positions(&self) -> Vec<Pos> {
        self.positions().filter(|&pos| self.tile(pos) == TileKind::Floor).collect()
    }
}
