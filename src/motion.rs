//! Cell-to-cell stepping shared by the hunter and the ghosts.
//!
//! Gameplay reads the integer `cell`; rendering reads the continuous
//! `position`, which glides toward the center of `target` and snaps onto it
//! on arrival so drift never accumulates across cells.

use glam::Vec2;

use crate::maze::{Dir, MazeGrid, Pos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Traveling,
    /// Snapped onto the target; the owner must pick the next target now.
    Arrived,
}

#[derive(Debug, Clone)]
pub struct GridMover {
    /// Last cell the agent fully reached.
    pub cell: Pos,
    /// Cell being approached; equal to `cell` or one step away.
    pub target: Pos,
    pub position: Vec2,
    /// Direction of the current or most recent step.
    pub direction: Option<Dir>,
}

impl GridMover {
    pub fn new(grid: &MazeGrid, cell: Pos, direction: Option<Dir>) -> Self {
        Self {
            cell,
            target: cell,
            position: grid.cell_to_world(cell),
            direction,
        }
    }

    /// Glide toward the target by `speed * dt`, never overshooting.
    pub fn advance(&mut self, grid: &MazeGrid, speed: f32, dt: f32, snap: f32) -> Step {
        let goal = grid.cell_to_world(self.target);
        let to_goal = goal - self.position;
        let dist = to_goal.length();
        if dist > snap {
            let travel = (speed * dt).min(dist);
            self.position += to_goal / dist * travel;
            if goal.distance(self.position) > snap {
                return Step::Traveling;
            }
        }
        self.position = goal;
        self.cell = self.target;
        Step::Arrived
    }

    /// Begin a one-cell step in `dir`. With `wrap`, a step off one edge lands
    /// on the opposite edge and the position is carried across so the step
    /// still covers exactly one cell.
    pub fn head(&mut self, grid: &MazeGrid, dir: Dir, wrap: bool) {
        let straight = self.cell.offset(dir);
        let target = grid.neighbor(self.cell, dir, wrap);
        if target != straight {
            let jump = Vec2::new((target.x - straight.x) as f32, (target.z - straight.z) as f32);
            self.position += jump * grid.cell_size();
        }
        self.direction = Some(dir);
        self.target = target;
    }

    /// Stay on the current cell.
    pub fn hold(&mut self) {
        self.target = self.cell;
    }

    /// Move directly onto a cell, bypassing the glide.
    pub fn place(&mut self, grid: &MazeGrid, cell: Pos) {
        self.cell = cell;
        self.target = cell;
        self.position = grid.cell_to_world(cell);
    }

    /// Facing angle about the vertical axis; 0 faces +Z.
    pub fn yaw(&self) -> f32 {
        self.direction.map_or(0.0, Dir::yaw)
    }
}
