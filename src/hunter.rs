use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::GameConfig;
use crate::events::GameEvent;
use crate::ghost::{Ghost, GhostState};
use crate::maze::{Dir, MazeGrid, Pos};
use crate::motion::{GridMover, Step};
use crate::pellets::{PelletField, PelletKind};
use crate::policy::{choose_direction, walkable_directions};

/// The PAC-MAN agent. Wanders the maze eating, and hunts ghosts while
/// empowered. Its steps may wrap through tunnel mouths.
#[derive(Debug, Clone)]
pub struct Hunter {
    pub mover: GridMover,
    pub empowered: bool,
    /// Seconds of empowerment left.
    pub empower_timer: f32,
}

impl Hunter {
    pub fn spawn(grid: &MazeGrid, cell: Pos) -> Self {
        Self {
            mover: GridMover::new(grid, cell, Some(Dir::Right)),
            empowered: false,
            empower_timer: 0.0,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.mover.position
    }

    pub fn cell(&self) -> Pos {
        self.mover.cell
    }

    pub fn speed(&self, config: &GameConfig) -> f32 {
        if self.empowered {
            config.hunter_speed * config.empowered_speed_multiplier
        } else {
            config.hunter_speed
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        dt: f32,
        grid: &MazeGrid,
        pellets: &mut PelletField,
        ghosts: &[Ghost],
        config: &GameConfig,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) {
        let speed = self.speed(config);
        if self.mover.advance(grid, speed, dt, config.snap_threshold) == Step::Arrived {
            self.pick_direction(grid, pellets, ghosts, config, rng);
            self.consume(pellets, config, events);
        }
        self.count_down(dt, events);
    }

    /// Cell of the closest ghost still in play (active or being carried).
    /// Ties go to the earliest ghost.
    pub fn nearest_ghost(&self, ghosts: &[Ghost]) -> Option<Pos> {
        let here = self.cell();
        ghosts
            .iter()
            .filter(|g| matches!(g.state, GhostState::Active | GhostState::Collected))
            .map(Ghost::cell)
            .min_by_key(|cell| cell.manhattan(here))
    }

    /// Choose the next step from the current cell and start moving.
    pub fn pick_direction(
        &mut self,
        grid: &MazeGrid,
        pellets: &PelletField,
        ghosts: &[Ghost],
        config: &GameConfig,
        rng: &mut impl Rng,
    ) {
        let here = self.cell();
        let chase = if self.empowered {
            self.nearest_ghost(ghosts).and_then(|prey| {
                choose_direction(
                    grid,
                    here,
                    self.mover.direction,
                    prey,
                    config.reversal_penalty,
                    true,
                )
            })
        } else {
            None
        };

        let dir = chase.or_else(|| {
            let options = walkable_directions(grid, here, true);
            let hungry: Vec<Dir> = options
                .iter()
                .copied()
                .filter(|&dir| pellets.has_uneaten(grid.neighbor(here, dir, true)))
                .collect();
            if hungry.is_empty() {
                options.choose(rng).copied()
            } else {
                hungry.choose(rng).copied()
            }
        });

        tracing::trace!(?here, ?dir, empowered = self.empowered, "hunter turn");
        match dir {
            Some(dir) => self.mover.head(grid, dir, true),
            None => self.mover.hold(),
        }
    }

    /// Eat whatever is on the current cell. A power pellet (re)starts the
    /// empower window.
    pub fn consume(&mut self, pellets: &mut PelletField, config: &GameConfig, events: &mut Vec<GameEvent>) {
        let cell = self.cell();
        match pellets.eat(cell) {
            Some(PelletKind::Normal) => events.push(GameEvent::DotEaten { cell }),
            Some(PelletKind::Power) => {
                if !self.empowered {
                    tracing::debug!(?cell, "hunter empowered");
                }
                self.empowered = true;
                self.empower_timer = config.empower_duration;
                events.push(GameEvent::PelletEaten { cell });
            }
            None => {}
        }
    }

    pub fn count_down(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        if !self.empowered {
            return;
        }
        self.empower_timer -= dt;
        if self.empower_timer <= 0.0 {
            self.empower_timer = 0.0;
            self.empowered = false;
            tracing::debug!("hunter empowerment ended");
            events.push(GameEvent::EmpowerEnded);
        }
    }

    /// Capture every active ghost within reach. Returns how many were caught.
    pub fn check_captures(&self, ghosts: &mut [Ghost], config: &GameConfig, events: &mut Vec<GameEvent>) -> usize {
        let mut caught = 0;
        for ghost in ghosts.iter_mut().filter(|g| g.is_active()) {
            if self.position().distance(ghost.position()) < config.capture_radius && ghost.capture() {
                events.push(GameEvent::GhostCaptured { ghost: ghost.kind });
                caught += 1;
            }
        }
        caught
    }
}
