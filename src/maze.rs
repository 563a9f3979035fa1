//! Static maze topology: which cells are walls, where dots and pellets
//! start, and the mapping between grid cells and continuous world space.
//!
//! World space lies on the ground plane. A [`Vec2`] here carries world X in
//! `.x` and world Z in `.y`; cell `(x, z)` covers
//! `[x * cell_size, (x + 1) * cell_size) × [z * cell_size, (z + 1) * cell_size)`.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Path,
    Dot,
    Pellet,
}

/// Integer grid coordinate. Signed so out-of-bounds queries are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub z: i32,
}

impl Pos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn manhattan(self, other: Pos) -> i32 {
        (self.x - other.x).abs() + (self.z - other.z).abs()
    }

    pub fn offset(self, dir: Dir) -> Pos {
        let (dx, dz) = dir.delta();
        Pos::new(self.x + dx, self.z + dz)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    /// Enumeration order; also the deterministic tie-break order.
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }

    /// Yaw (radians, about the vertical axis) of an agent facing this way.
    pub fn yaw(self) -> f32 {
        let (dx, dz) = self.delta();
        (dx as f32).atan2(dz as f32)
    }
}

/// Immutable wall/path classification of the maze.
#[derive(Debug, Clone)]
pub struct MazeGrid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    cell_size: f32,
    safe_zone_marker: Option<Pos>,
}

impl MazeGrid {
    /// Parse a layout: `#` wall, `.` dot, `o` power pellet, ` ` path, `S`
    /// safe-zone marker (a path cell).
    ///
    /// Every border cell must be a wall, except tunnel mouths that are open on
    /// both opposite edges.
    pub fn parse<S: AsRef<str>>(rows: &[S], cell_size: f32) -> GameResult<Self> {
        let Some(first) = rows.first() else {
            return Err(GameError::EmptyLayout);
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(GameError::EmptyLayout);
        }

        let mut tiles = Vec::with_capacity(width * rows.len());
        let mut safe_zone_marker = None;
        for (z, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(GameError::RaggedRow {
                    row: z,
                    expected: width,
                    found,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let tile = match glyph {
                    '#' => Tile::Wall,
                    '.' => Tile::Dot,
                    'o' => Tile::Pellet,
                    ' ' => Tile::Path,
                    'S' => {
                        safe_zone_marker.get_or_insert(Pos::new(x as i32, z as i32));
                        Tile::Path
                    }
                    _ => return Err(GameError::UnknownGlyph { glyph, x, z }),
                };
                tiles.push(tile);
            }
        }

        let grid = Self {
            width: width as i32,
            height: rows.len() as i32,
            tiles,
            cell_size,
            safe_zone_marker,
        };
        grid.check_border()?;
        Ok(grid)
    }

    fn check_border(&self) -> GameResult<()> {
        let (w, h) = (self.width, self.height);
        for z in 0..h {
            for x in 0..w {
                let on_x_edge = x == 0 || x == w - 1;
                let on_z_edge = z == 0 || z == h - 1;
                if !(on_x_edge || on_z_edge) || self.tile(Pos::new(x, z)) == Some(Tile::Wall) {
                    continue;
                }
                let pos = Pos::new(x, z);
                // Corners have no single opposite edge.
                if on_x_edge && on_z_edge {
                    return Err(GameError::UnpairedTunnel { pos });
                }
                let partner = if on_x_edge {
                    Pos::new(w - 1 - x, z)
                } else {
                    Pos::new(x, h - 1 - z)
                };
                if !self.is_walkable(partner.x, partner.z) {
                    return Err(GameError::UnpairedTunnel { pos });
                }
            }
        }
        Ok(())
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// First `S` glyph in the layout, if any.
    pub fn safe_zone_marker(&self) -> Option<Pos> {
        self.safe_zone_marker
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.z >= 0 && pos.z < self.height
    }

    pub fn tile(&self, pos: Pos) -> Option<Tile> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.tiles[(pos.z * self.width + pos.x) as usize])
    }

    /// False for walls and for anything outside the grid.
    pub fn is_walkable(&self, x: i32, z: i32) -> bool {
        matches!(self.tile(Pos::new(x, z)), Some(t) if t != Tile::Wall)
    }

    pub fn is_walkable_pos(&self, pos: Pos) -> bool {
        self.is_walkable(pos.x, pos.z)
    }

    /// Center of a cell in world space.
    pub fn cell_to_world(&self, pos: Pos) -> Vec2 {
        Vec2::new(
            (pos.x as f32 + 0.5) * self.cell_size,
            (pos.z as f32 + 0.5) * self.cell_size,
        )
    }

    pub fn world_to_cell(&self, world: Vec2) -> Pos {
        Pos::new(
            (world.x / self.cell_size).floor() as i32,
            (world.y / self.cell_size).floor() as i32,
        )
    }

    /// Extent of the maze footprint in world units.
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.cell_size,
            self.height as f32 * self.cell_size,
        )
    }

    /// Neighbor one step away. With `wrap`, coordinates leaving the grid
    /// re-enter from the opposite edge.
    pub fn neighbor(&self, pos: Pos, dir: Dir, wrap: bool) -> Pos {
        let next = pos.offset(dir);
        if wrap {
            Pos::new(next.x.rem_euclid(self.width), next.z.rem_euclid(self.height))
        } else {
            next
        }
    }

    /// Breadth-first search over the 4-connected grid for the closest walkable
    /// cell. Visits at most `max_visits` cells; returns `start` if nothing
    /// walkable was found within that budget.
    pub fn find_nearest_walkable(&self, start: Pos, max_visits: usize) -> Pos {
        if self.is_walkable_pos(start) || !self.in_bounds(start) {
            return start;
        }
        let mut seen = vec![false; self.tiles.len()];
        let mut q = VecDeque::new();
        seen[(start.z * self.width + start.x) as usize] = true;
        q.push_back(start);
        let mut visited = 0;

        while let Some(pos) = q.pop_front() {
            if visited >= max_visits {
                break;
            }
            visited += 1;
            if self.is_walkable_pos(pos) {
                return pos;
            }
            for dir in Dir::ALL {
                let next = pos.offset(dir);
                if !self.in_bounds(next) {
                    continue;
                }
                let idx = (next.z * self.width + next.x) as usize;
                if !seen[idx] {
                    seen[idx] = true;
                    q.push_back(next);
                }
            }
        }
        start
    }

    /// Every cell with its starting tile, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (Pos, Tile)> + '_ {
        self.tiles.iter().enumerate().map(move |(i, &tile)| {
            let i = i as i32;
            (Pos::new(i % self.width, i / self.width), tile)
        })
    }
}
