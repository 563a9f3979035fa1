use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};
use crate::level::LevelData;

/// Data-driven tunables for a session. Distances are world units, times are
/// seconds, speeds are world units per second.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Edge length of one maze cell.
    pub cell_size: f32,
    /// Camera height of the player above the floor.
    pub eye_height: f32,
    pub player_walk_speed: f32,
    pub player_run_speed: f32,
    /// Exponential velocity decay rate (1/s).
    pub player_damping: f32,
    /// Radius of the player's collision circle.
    pub player_radius: f32,
    pub hunter_speed: f32,
    /// Hunter speed factor while empowered.
    pub empowered_speed_multiplier: f32,
    /// How long a power pellet keeps the hunter empowered.
    pub empower_duration: f32,
    pub ghost_speed: f32,
    /// Ghost speed while the hunter is within `ghost_flee_threshold`.
    pub ghost_flee_speed: f32,
    /// Manhattan cell distance below which a ghost flees the hunter.
    pub ghost_flee_threshold: i32,
    /// Distance under which a moving agent snaps onto its target cell.
    pub snap_threshold: f32,
    /// Hunter-to-ghost distance that captures an active ghost.
    pub capture_radius: f32,
    /// Player-to-ghost distance that collects an active ghost.
    pub collection_radius: f32,
    /// Hunter-to-player distance that ends the session.
    pub contact_radius: f32,
    /// Added to the Manhattan score of a direction that reverses travel.
    pub reversal_penalty: i32,
    /// Interval between ghost trail emissions.
    pub ghost_trail_interval: f32,
    /// Hunter distance at which the proximity warning starts rising.
    pub hunter_warning_distance: f32,
    /// Node budget for the nearest-walkable spawn correction search.
    pub spawn_search_limit: usize,
    /// Extra clearance added when pushing an agent out of a wall.
    pub wall_push_buffer: f32,
    pub level: LevelData,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cell_size: 4.0,
            eye_height: 1.7,
            player_walk_speed: 8.0,
            player_run_speed: 14.0,
            player_damping: 10.0,
            player_radius: 0.3,
            hunter_speed: 5.0,
            empowered_speed_multiplier: 1.5,
            empower_duration: 10.0,
            ghost_speed: 3.0,
            ghost_flee_speed: 5.0,
            ghost_flee_threshold: 8,
            snap_threshold: 0.1,
            capture_radius: 2.0,
            collection_radius: 3.0,
            contact_radius: 2.5,
            reversal_penalty: 3,
            ghost_trail_interval: 0.25,
            hunter_warning_distance: 15.0,
            spawn_search_limit: 1024,
            wall_push_buffer: 0.01,
            level: LevelData::default(),
        }
    }
}

impl GameConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is missing
    /// or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("PACMAN_RESCUE_CONFIG")
            .unwrap_or_else(|_| "config/game.toml".to_string());
        match Self::from_path(&path) {
            Ok(cfg) => cfg,
            Err(GameError::ConfigRead(_)) => Self::default(),
            Err(e) => {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> GameResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> GameResult<Self> {
        Ok(toml::from_str(content)?)
    }
}
