//! Shared distance field for enemy movement plus a point-to-point A* search.
//! The field is computed once per tick from the player's tile; each enemy then
//! only inspects its eight neighbours.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::map::Map;
use crate::types::Pos;

/// Value of tiles the field never reached.
pub const UNREACHABLE: u32 = u32::MAX;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceField {
    width: usize,
    height: usize,
    values: Vec<u32>,
}

impl DistanceField {
    /// Breadth-first step counts from the nearest goal over eight neighbours.
    /// Walls, closed doors and `blocked` tiles are impassable; goals are always seeded.
    pub fn compute(map: &Map, goals: &[Pos], blocked: &BTreeSet<Pos>) -> Self {
        let mut field =
            Self { width: map.width, height: map.height, values: vec![UNREACHABLE; map.width * map.height] };
        let mut queue = VecDeque::new();
        for &goal in goals {
            if field.set(goal, 0) {
                queue.push_back(goal);
            }
        }
        while let Some(current) = queue.pop_front() {
            let next_value = field.get(current).saturating_add(1);
            for next in current.neighbors() {
                if !map.in_bounds(next) || map.blocks_movement(next) || blocked.contains(&next) {
                    continue;
                }
                if field.get(next) == UNREACHABLE && field.set(next, next_value) {
                    queue.push_back(next);
                }
            }
        }
        field
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        (pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height)
            .then(|| pos.y as usize * self.width + pos.x as usize)
    }

    fn set(&mut self, pos: Pos, value: u32) -> bool {
        match self.index(pos).and_then(|index| self.values.get_mut(index)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, pos: Pos) -> u32 {
        self.index(pos).and_then(|index| self.values.get(index).copied()).unwrap_or(UNREACHABLE)
    }

    /// The neighbour with the strictly lowest value below `from`'s own.
    /// Ties resolve to the first in `Direction::ALL` order; `occupied` tiles are skipped.
    pub fn best_neighbor(&self, from: Pos, occupied: impl Fn(Pos) -> bool) -> Option<Pos> {
        let mut best: Option<(Pos, u32)> = None;
        for next in from.neighbors() {
            let value = self.get(next);
            if value == UNREACHABLE || occupied(next) {
                continue;
            }
            if best.is_none_or(|(_, best_value)| value < best_value) {
                best = Some((next, value));
            }
        }
        best.filter(|&(_, value)| value < self.get(from)).map(|(pos, _)| pos)
    }

    /// The neighbour with the strictly highest finite value above `from`'s own.
    pub fn flee_neighbor(&self, from: Pos, occupied: impl Fn(Pos) -> bool) -> Option<Pos> {
        let current = self.get(from);
        let mut best: Option<(Pos, u32)> = None;
        for next in from.neighbors() {
            let value = self.get(next);
            if value == UNREACHABLE || occupied(next) {
                continue;
            }
            if best.is_none_or(|(_, best_value)| value > best_value) {
                best = Some((next, value));
            }
        }
        best.filter(|&(_, value)| current == UNREACHABLE || value > current).map(|(pos, _)| pos)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    y: i32,
    x: i32,
}

/// A* over eight neighbours with the Chebyshev heuristic. Returns the steps after `from`,
/// ending at `to`. `occupied` tiles are impassable except the goal itself.
pub fn astar(map: &Map, from: Pos, to: Pos, occupied: &BTreeSet<Pos>) -> Option<Vec<Pos>> {
    if !map.in_bounds(to) || map.blocks_movement(to) {
        return None;
    }
    if from == to {
        return Some(Vec::new());
    }
    let mut open_set = BTreeSet::new();
    let mut g_score: BTreeMap<Pos, u32> = BTreeMap::new();
    let mut came_from: BTreeMap<Pos, Pos> = BTreeMap::new();
    let h = from.chebyshev(to);
    open_set.insert(OpenNode { f: h, h, y: from.y, x: from.x });
    g_score.insert(from, 0);

    while let Some(node) = open_set.pop_first() {
        let current = Pos { y: node.y, x: node.x };
        if current == to {
            return reconstruct_path(&came_from, from, to);
        }
        let Some(&current_g) = g_score.get(&current) else {
            continue;
        };
        for next in current.neighbors() {
            if !map.in_bounds(next)
                || map.blocks_movement(next)
                || (next != to && occupied.contains(&next))
            {
                continue;
            }
            let tentative = current_g + 1;
            if tentative < g_score.get(&next).copied().unwrap_or(u32::MAX) {
                came_from.insert(next, current);
                g_score.insert(next, tentative);
                let h = next.chebyshev(to);
                open_set.insert(OpenNode { f: tentative + h, h, y: next.y, x: next.x });
            }
        }
    }
    None
}

fn reconstruct_path(came_from: &BTreeMap<Pos, Pos>, from: Pos, to: Pos) -> Option<Vec<Pos>> {
    let mut path = vec![to];
    let mut current = to;
    while current != from {
        current = *came_from.get(&current)?;
        path.push(current);
    }
    path.reverse();
    path.remove(0);
    Some(path)
}
