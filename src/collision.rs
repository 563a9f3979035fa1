//! Circle-versus-wall-grid collision for agents moving in continuous space.
//!
//! Every query looks only at the 3×3 block of cells around the agent's
//! containing cell. Cells outside the grid count as walls, so nothing can
//! leave the maze footprint through an open tunnel mouth.

use glam::Vec2;

use crate::maze::{MazeGrid, Pos};

/// Wall cells (including off-grid cells) in the 3×3 neighborhood of `pos`.
fn nearby_walls(grid: &MazeGrid, pos: Vec2) -> impl Iterator<Item = Pos> + '_ {
    let center = grid.world_to_cell(pos);
    (-1..=1)
        .flat_map(move |dz| (-1..=1).map(move |dx| Pos::new(center.x + dx, center.z + dz)))
        .filter(move |cell| !grid.is_walkable_pos(*cell))
}

/// Closest point on a wall cell's square footprint to `p`.
fn closest_point(grid: &MazeGrid, cell: Pos, p: Vec2) -> Vec2 {
    let size = grid.cell_size();
    let min = Vec2::new(cell.x as f32 * size, cell.z as f32 * size);
    p.clamp(min, min + Vec2::splat(size))
}

/// True if a circle of `radius` at `candidate` overlaps any nearby wall.
pub fn is_blocked(grid: &MazeGrid, candidate: Vec2, radius: f32) -> bool {
    nearby_walls(grid, candidate)
        .any(|cell| candidate.distance(closest_point(grid, cell, candidate)) < radius)
}

/// Move by `delta`, resolving X and then Z independently so motion slides
/// along a wall instead of stopping dead.
pub fn slide(grid: &MazeGrid, pos: Vec2, delta: Vec2, radius: f32) -> Vec2 {
    let mut out = pos;
    let try_x = Vec2::new(out.x + delta.x, out.y);
    if !is_blocked(grid, try_x, radius) {
        out = try_x;
    }
    let try_z = Vec2::new(out.x, out.y + delta.y);
    if !is_blocked(grid, try_z, radius) {
        out = try_z;
    }
    out
}

/// Repel the circle from every wall it overlaps. Corrections from all
/// overlapping cells are summed before being applied.
pub fn push_out_of_walls(grid: &MazeGrid, pos: Vec2, radius: f32, buffer: f32) -> Vec2 {
    let size = grid.cell_size();
    let mut correction = Vec2::ZERO;

    for cell in nearby_walls(grid, pos) {
        let closest = closest_point(grid, cell, pos);
        let away = pos - closest;
        let dist = away.length();
        if dist >= radius {
            continue;
        }
        if dist > f32::EPSILON {
            correction += away / dist * (radius - dist + buffer);
            continue;
        }

        // Center inside the wall: leave through the nearest face.
        let min = Vec2::new(cell.x as f32 * size, cell.z as f32 * size);
        let max = min + Vec2::splat(size);
        let exits = [
            (pos.x - min.x, Vec2::NEG_X),
            (max.x - pos.x, Vec2::X),
            (pos.y - min.y, Vec2::NEG_Y),
            (max.y - pos.y, Vec2::Y),
        ];
        let (depth, normal) = exits
            .into_iter()
            .fold((f32::INFINITY, Vec2::X), |best, exit| if exit.0 < best.0 { exit } else { best });
        correction += normal * (depth + radius + buffer);
    }

    pos + correction
}
