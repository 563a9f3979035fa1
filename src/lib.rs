//! Core of a first-person Pac-Man rescue game: an autonomous hunter patrols
//! a grid maze while the player races it to carry four ghosts to safety.
//!
//! The crate is pure simulation. [`GameSession`] is driven one frame at a
//! time and reports what happened through [`Frame`]; drawing, sound and
//! input devices live with the caller.

pub mod collision;
pub mod config;
pub mod error;
pub mod events;
pub mod ghost;
pub mod hunter;
pub mod level;
pub mod maze;
pub mod motion;
pub mod pellets;
pub mod player;
pub mod policy;
pub mod session;

pub use config::GameConfig;
pub use error::{GameError, GameResult};
pub use events::{EntityId, Frame, GameEvent, Presentation, RenderUpdate, Renderer};
pub use ghost::{GhostKind, GhostState};
pub use maze::{Dir, MazeGrid, Pos, Tile};
pub use player::InputState;
pub use session::{GameSession, Phase};
