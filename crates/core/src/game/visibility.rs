//! Symmetric shadowcasting and Bresenham line-of-sight.
//! A floor tile is lit only when its centre lies inside the visible slope interval,
//! which makes sight between two floor tiles mutual.

use std::collections::BTreeSet;

use crate::map::Map;
use crate::types::Pos;

/// Slope `num / den` with a positive denominator.
#[derive(Clone, Copy, Debug)]
struct Slope {
    num: i32,
    den: i32,
}

impl Slope {
    const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// The slope through the leading edge of the tile at `(depth, col)`.
    fn of_tile(depth: i32, col: i32) -> Self {
        Self::new(2 * col - 1, 2 * depth)
    }
}

#[derive(Clone, Copy, Debug)]
struct Row {
    depth: i32,
    start: Slope,
    end: Slope,
}

impl Row {
    /// `floor(depth * start + 1/2)`
    fn min_col(&self) -> i32 {
        (2 * self.depth * self.start.num + self.start.den).div_euclid(2 * self.start.den)
    }

    /// `ceil(depth * end - 1/2)`
    fn max_col(&self) -> i32 {
        -(-(2 * self.depth * self.end.num - self.end.den)).div_euclid(2 * self.end.den)
    }

    /// Centre of the tile lies within `[start, end]`.
    fn is_symmetric(&self, col: i32) -> bool {
        col * self.start.den >= self.depth * self.start.num
            && col * self.end.den <= self.depth * self.end.num
    }

    fn next(&self) -> Self {
        Self { depth: self.depth + 1, ..*self }
    }
}

fn transform_octant(origin: Pos, depth: i32, col: i32, octant: u8) -> Pos {
    match octant {
        0 => Pos { y: origin.y - depth, x: origin.x + col },
        1 => Pos { y: origin.y - col, x: origin.x + depth },
        2 => Pos { y: origin.y + col, x: origin.x + depth },
        3 => Pos { y: origin.y + depth, x: origin.x + col },
        4 => Pos { y: origin.y + depth, x: origin.x - col },
        5 => Pos { y: origin.y + col, x: origin.x - depth },
        6 => Pos { y: origin.y - col, x: origin.x - depth },
        _ => Pos { y: origin.y - depth, x: origin.x - col },
    }
}

struct Scan<'a> {
    map: &'a Map,
    origin: Pos,
    radius: i32,
    octant: u8,
    visible: BTreeSet<Pos>,
}

impl Scan<'_> {
    fn within_radius(&self, pos: Pos) -> bool {
        pos.distance_squared(self.origin) <= i64::from(self.radius) * i64::from(self.radius)
    }

    fn scan(&mut self, mut row: Row) {
        if row.depth > self.radius {
            return;
        }
        let mut prev_wall: Option<bool> = None;
        for col in row.min_col()..=row.max_col() {
            let pos = transform_octant(self.origin, row.depth, col, self.octant);
            let wall = self.map.blocks_sight(pos);
            if (wall || row.is_symmetric(col)) && self.within_radius(pos) && self.map.in_bounds(pos)
            {
                self.visible.insert(pos);
            }
            if prev_wall == Some(true) && !wall {
                row.start = Slope::of_tile(row.depth, col);
            }
            if prev_wall == Some(false) && wall {
                let mut next = row.next();
                next.end = Slope::of_tile(row.depth, col);
                self.scan(next);
            }
            prev_wall = Some(wall);
        }
        if prev_wall == Some(false) {
            self.scan(row.next());
        }
    }
}

/// Tiles visible from `origin` within Euclidean `radius`, origin included.
pub fn compute_fov(map: &Map, origin: Pos, radius: i32) -> BTreeSet<Pos> {
    let mut visible = BTreeSet::from([origin]);
    if radius <= 0 {
        return visible;
    }
    for octant in 0..8 {
        let mut scan = Scan { map, origin, radius, octant, visible: BTreeSet::new() };
        scan.scan(Row { depth: 1, start: Slope::new(0, 1), end: Slope::new(1, 1) });
        visible.append(&mut scan.visible);
    }
    visible
}

/// Whether `to` is visible from `from` at `radius`, computed on demand.
pub fn can_see(map: &Map, from: Pos, to: Pos, radius: i32) -> bool {
    from.distance_squared(to) <= i64::from(radius) * i64::from(radius)
        && compute_fov(map, from, radius).contains(&to)
}

/// Bresenham line from `from` to `to`, both ends included.
pub fn bresenham(from: Pos, to: Pos) -> Vec<Pos> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = (to.x - from.x).signum();
    let sy = (to.y - from.y).signum();
    let mut err = dx + dy;
    let mut current = from;
    let mut line = vec![current];
    while current != to {
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            current.x += sx;
        }
        if doubled <= dx {
            err += dx;
            current.y += sy;
        }
        line.push(current);
    }
    line
}

/// No sight-blocking tile strictly between the two ends.
pub fn line_of_sight(map: &Map, from: Pos, to: Pos) -> bool {
    let line = bresenham(from, to);
    let interior = line.len().saturating_sub(1);
    line.iter().take(interior).skip(1).all(|&pos| !map.blocks_sight(pos))
}
