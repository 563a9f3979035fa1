use glam::Vec2;

use crate::collision::{push_out_of_walls, slide};
use crate::config::GameConfig;
use crate::events::GameEvent;
use crate::ghost::Ghost;
use crate::maze::{MazeGrid, Pos};

/// Polled intents from whatever owns the keyboard and pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub running: bool,
    /// Look direction about the vertical axis; 0 faces +Z.
    pub yaw: f32,
    pub pitch: f32,
}

impl InputState {
    /// Desired local motion: `x` strafes right, `y` walks forward. Unit length or zero.
    fn wish(&self) -> Vec2 {
        let axis = |pos: bool, neg: bool| pos as i32 as f32 - neg as i32 as f32;
        Vec2::new(axis(self.right, self.left), axis(self.forward, self.backward)).normalize_or_zero()
    }
}

/// The human's avatar, moving freely in continuous space.
#[derive(Debug, Clone)]
pub struct Player {
    pub position: Vec2,
    /// Local-frame velocity: `x` strafe, `y` forward.
    pub velocity: Vec2,
    pub yaw: f32,
    pub pitch: f32,
    /// Indices of ghosts picked up and not yet delivered.
    pub carried: Vec<usize>,
}

impl Player {
    pub fn spawn(grid: &MazeGrid, cell: Pos) -> Self {
        Self {
            position: grid.cell_to_world(cell),
            velocity: Vec2::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            carried: Vec::new(),
        }
    }

    pub fn cell(&self, grid: &MazeGrid) -> Pos {
        grid.world_to_cell(self.position)
    }

    /// Unit vector the player faces on the ground plane.
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.yaw.sin(), self.yaw.cos())
    }

    pub fn tick(&mut self, dt: f32, input: &InputState, grid: &MazeGrid, config: &GameConfig) {
        self.yaw = input.yaw;
        self.pitch = input.pitch;

        let speed = if input.running {
            config.player_run_speed
        } else {
            config.player_walk_speed
        };
        // Velocity relaxes exponentially toward the wished-for velocity.
        let decay = (config.player_damping * dt).min(1.0);
        self.velocity -= self.velocity * decay;
        self.velocity += input.wish() * speed * decay;

        let forward = self.forward();
        let right = Vec2::new(-forward.y, forward.x);
        let delta = (right * self.velocity.x + forward * self.velocity.y) * dt;

        let moved = slide(grid, self.position, delta, config.player_radius);
        let freed = push_out_of_walls(grid, moved, config.player_radius, config.wall_push_buffer);
        let size = grid.world_size();
        let margin = grid.cell_size();
        self.position = freed.clamp(Vec2::splat(margin), size - Vec2::splat(margin));
    }

    /// Pick up every active ghost within reach. Returns how many were taken.
    pub fn try_collect(&mut self, ghosts: &mut [Ghost], config: &GameConfig, events: &mut Vec<GameEvent>) -> usize {
        let mut taken = 0;
        for (i, ghost) in ghosts.iter_mut().enumerate() {
            if !ghost.is_active() || self.position.distance(ghost.position()) >= config.collection_radius {
                continue;
            }
            if ghost.collect() {
                debug_assert!(!self.carried.contains(&i));
                self.carried.push(i);
                events.push(GameEvent::GhostCollected { ghost: ghost.kind });
                taken += 1;
            }
        }
        taken
    }

    /// Hand over every carried ghost when standing on the safe zone.
    /// Returns how many were delivered.
    pub fn try_deliver(
        &mut self,
        ghosts: &mut [Ghost],
        grid: &MazeGrid,
        safe_zone: Pos,
        events: &mut Vec<GameEvent>,
    ) -> usize {
        if self.carried.is_empty() || self.cell(grid) != safe_zone {
            return 0;
        }
        let mut count = 0;
        for i in self.carried.drain(..) {
            if ghosts[i].deliver() {
                count += 1;
            }
        }
        events.push(GameEvent::GhostsDelivered { count });
        count
    }

    pub fn is_caught_by(&self, hunter: Vec2, config: &GameConfig) -> bool {
        self.position.distance(hunter) < config.contact_radius
    }
}
