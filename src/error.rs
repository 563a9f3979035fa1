use thiserror::Error;

use crate::maze::Pos;

#[derive(Error, Debug)]
pub enum GameError {
    // Layout errors
    #[error("Maze layout has no rows")]
    EmptyLayout,

    #[error("Maze row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unknown maze glyph {glyph:?} at ({x}, {z})")]
    UnknownGlyph { glyph: char, x: usize, z: usize },

    #[error("Open border cell {pos:?} has no tunnel partner on the opposite edge")]
    UnpairedTunnel { pos: Pos },

    #[error("Spawn {name} at {pos:?} lies outside the {width}x{height} maze")]
    SpawnOutOfBounds {
        name: String,
        pos: Pos,
        width: i32,
        height: i32,
    },

    // Config errors
    #[error("Failed to read config: {0}")]
    ConfigRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type GameResult<T> = Result<T, GameError>;
