use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::maze::{MazeGrid, Pos};
use crate::motion::{GridMover, Step};
use crate::policy::choose_direction;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum GhostKind {
    Blinky,
    Inky,
    Pinky,
    Clyde,
}

impl GhostKind {
    pub const ALL: [GhostKind; 4] = [
        GhostKind::Blinky,
        GhostKind::Inky,
        GhostKind::Pinky,
        GhostKind::Clyde,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GhostKind::Blinky => "Blinky",
            GhostKind::Inky => "Inky",
            GhostKind::Pinky => "Pinky",
            GhostKind::Clyde => "Clyde",
        }
    }

    /// 0xRRGGBB
    pub fn color(self) -> u32 {
        match self {
            GhostKind::Blinky => 0xff0000,
            GhostKind::Inky => 0x00ffff,
            GhostKind::Pinky => 0xffb8ff,
            GhostKind::Clyde => 0xffb852,
        }
    }
}

/// Active → Captured | Collected; Collected → Delivered.
/// Captured and Delivered are terminal.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum GhostState {
    Active,
    Captured,
    Collected,
    Delivered,
}

#[derive(Debug, Clone)]
pub struct Ghost {
    pub kind: GhostKind,
    pub state: GhostState,
    pub mover: GridMover,
    pub scatter_corner: Pos,
    /// Destination chosen at the last cell arrival.
    pub escape_target: Pos,
    trail_clock: f32,
}

impl Ghost {
    pub fn spawn(kind: GhostKind, grid: &MazeGrid, cell: Pos, scatter_corner: Pos) -> Self {
        Self {
            kind,
            state: GhostState::Active,
            mover: GridMover::new(grid, cell, None),
            scatter_corner,
            escape_target: scatter_corner,
            trail_clock: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == GhostState::Active
    }

    pub fn position(&self) -> Vec2 {
        self.mover.position
    }

    pub fn cell(&self) -> Pos {
        self.mover.cell
    }

    pub fn is_threatened(&self, hunter_cell: Pos, config: &GameConfig) -> bool {
        self.cell().manhattan(hunter_cell) < config.ghost_flee_threshold
    }

    /// Where to run: straight away from a nearby hunter, otherwise this
    /// ghost's own corner.
    pub fn pick_escape_target(&self, grid: &MazeGrid, hunter_cell: Pos, config: &GameConfig) -> Pos {
        if !self.is_threatened(hunter_cell, config) {
            return self.scatter_corner;
        }
        let cell = self.cell();
        let away = Pos::new(2 * cell.x - hunter_cell.x, 2 * cell.z - hunter_cell.z);
        Pos::new(
            away.x.clamp(1, (grid.width() - 2).max(1)),
            away.z.clamp(1, (grid.height() - 2).max(1)),
        )
    }

    /// Advance one frame. Returns the position of a trail wisp when one is due.
    pub fn tick(
        &mut self,
        dt: f32,
        grid: &MazeGrid,
        hunter_cell: Pos,
        config: &GameConfig,
    ) -> Option<Vec2> {
        if !self.is_active() {
            return None;
        }

        let speed = if self.is_threatened(hunter_cell, config) {
            config.ghost_flee_speed
        } else {
            config.ghost_speed
        };
        if self.mover.advance(grid, speed, dt, config.snap_threshold) == Step::Arrived {
            self.escape_target = self.pick_escape_target(grid, hunter_cell, config);
            let heading = self.mover.direction;
            match choose_direction(
                grid,
                self.cell(),
                heading,
                self.escape_target,
                config.reversal_penalty,
                false,
            ) {
                Some(dir) => self.mover.head(grid, dir, false),
                None => self.mover.hold(),
            }
        }

        self.trail_clock -= dt;
        if self.trail_clock <= 0.0 {
            self.trail_clock += config.ghost_trail_interval;
            if self.trail_clock <= 0.0 {
                self.trail_clock = config.ghost_trail_interval;
            }
            return Some(self.position());
        }
        None
    }

    /// Caught by the hunter. Only an active ghost can be captured.
    pub fn capture(&mut self) -> bool {
        self.transition(GhostState::Active, GhostState::Captured)
    }

    /// Picked up by the player.
    pub fn collect(&mut self) -> bool {
        self.transition(GhostState::Active, GhostState::Collected)
    }

    /// Dropped off at the safe zone.
    pub fn deliver(&mut self) -> bool {
        self.transition(GhostState::Collected, GhostState::Delivered)
    }

    fn transition(&mut self, from: GhostState, to: GhostState) -> bool {
        if self.state != from {
            return false;
        }
        tracing::debug!(ghost = self.kind.name(), ?from, ?to, "ghost state change");
        self.state = to;
        true
    }

    /// A carried ghost rides along with the player, unseen.
    pub fn carry_to(&mut self, grid: &MazeGrid, position: Vec2) {
        let cell = grid.world_to_cell(position);
        self.mover.cell = cell;
        self.mover.target = cell;
        self.mover.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::create_level;

    fn grid() -> MazeGrid {
        MazeGrid::parse(&create_level().layout, 4.0).unwrap()
    }

    #[test]
    fn threatened_ghost_reflects_away_from_hunter() {
        let grid = grid();
        let config = GameConfig::default();
        let ghost = Ghost::spawn(GhostKind::Blinky, &grid, Pos::new(9, 9), Pos::new(1, 1));
        let target = ghost.pick_escape_target(&grid, Pos::new(9, 10), &config);
        assert_eq!(target, Pos::new(9, 8));
        assert!((1..=grid.width() - 2).contains(&target.x));
        assert!((1..=grid.height() - 2).contains(&target.z));
    }

    #[test]
    fn reflected_target_is_clamped_to_interior() {
        let grid = grid();
        let config = GameConfig::default();
        let ghost = Ghost::spawn(GhostKind::Inky, &grid, Pos::new(1, 1), Pos::new(19, 1));
        let target = ghost.pick_escape_target(&grid, Pos::new(3, 2), &config);
        assert_eq!(target, Pos::new(1, 1));
        let ghost = Ghost::spawn(GhostKind::Inky, &grid, Pos::new(19, 19), Pos::new(19, 1));
        let target = ghost.pick_escape_target(&grid, Pos::new(17, 17), &config);
        assert_eq!(target, Pos::new(19, 19));
    }

    #[test]
    fn distant_hunter_sends_ghost_to_its_corner() {
        let grid = grid();
        let config = GameConfig::default();
        let ghost = Ghost::spawn(GhostKind::Pinky, &grid, Pos::new(6, 7), Pos::new(1, 19));
        // Manhattan distance 12.
        assert_eq!(ghost.pick_escape_target(&grid, Pos::new(10, 15), &config), Pos::new(1, 19));
        // Exactly at the threshold still counts as safe.
        assert_eq!(ghost.pick_escape_target(&grid, Pos::new(14, 7), &config), Pos::new(1, 19));
    }

    #[test]
    fn active_ghost_moves_toward_escape_target() {
        let grid = grid();
        let config = GameConfig::default();
        let mut ghost = Ghost::spawn(GhostKind::Clyde, &grid, Pos::new(14, 7), Pos::new(19, 1));
        ghost.tick(0.016, &grid, Pos::new(10, 15), &config);
        assert_eq!(ghost.escape_target, Pos::new(19, 1));
        assert_ne!(ghost.mover.target, ghost.cell());
        assert!(grid.is_walkable_pos(ghost.mover.target));
        assert_eq!(ghost.mover.target.manhattan(ghost.cell()), 1);
    }

    #[test]
    fn inactive_ghost_does_not_move() {
        let grid = grid();
        let config = GameConfig::default();
        let mut ghost = Ghost::spawn(GhostKind::Clyde, &grid, Pos::new(14, 7), Pos::new(19, 1));
        assert!(ghost.capture());
        let before = ghost.position();
        assert_eq!(ghost.tick(1.0, &grid, Pos::new(10, 15), &config), None);
        assert_eq!(ghost.position(), before);
    }

    #[test]
    fn lifecycle_transitions() {
        let grid = grid();
        let mut ghost = Ghost::spawn(GhostKind::Blinky, &grid, Pos::new(6, 7), Pos::new(1, 1));
        assert!(!ghost.deliver());
        assert!(ghost.collect());
        assert!(!ghost.capture());
        assert!(!ghost.collect());
        assert!(ghost.deliver());
        assert_eq!(ghost.state, GhostState::Delivered);
        assert!(!ghost.deliver());

        let mut other = Ghost::spawn(GhostKind::Inky, &grid, Pos::new(6, 7), Pos::new(1, 1));
        assert!(other.capture());
        assert!(!other.collect());
        assert_eq!(other.state, GhostState::Captured);
    }

    #[test]
    fn trail_follows_the_ghost_clock() {
        let grid = grid();
        let config = GameConfig::default();
        let mut ghost = Ghost::spawn(GhostKind::Blinky, &grid, Pos::new(6, 7), Pos::new(1, 1));
        let far = Pos::new(19, 19);
        let emitted = (0..100)
            .filter(|_| ghost.tick(0.05, &grid, far, &config).is_some())
            .count();
        // 5 seconds at one wisp per 0.25 s.
        assert!((19..=21).contains(&emitted), "emitted {emitted}");
    }

    #[test]
    fn carried_ghost_follows_position() {
        let grid = grid();
        let mut ghost = Ghost::spawn(GhostKind::Blinky, &grid, Pos::new(6, 7), Pos::new(1, 1));
        ghost.collect();
        ghost.carry_to(&grid, Vec2::new(42.0, 38.0));
        assert_eq!(ghost.cell(), Pos::new(10, 9));
        assert_eq!(ghost.position(), Vec2::new(42.0, 38.0));
    }
}
