//! Everything the core hands to the outside world each frame: discrete
//! gameplay events for the HUD/audio layer and transform updates for
//! whatever draws the scene. Nothing flows back in through here.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ghost::GhostKind;
use crate::maze::Pos;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted,
    DotEaten { cell: Pos },
    /// A power pellet was eaten; the hunter is empowered.
    PelletEaten { cell: Pos },
    EmpowerEnded,
    GhostCaptured { ghost: GhostKind },
    GhostCollected { ghost: GhostKind },
    GhostsDelivered { count: usize },
    SessionWon,
    SessionLost { killed_by_hunter: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityId {
    Hunter,
    Ghost(GhostKind),
    Player,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderUpdate {
    Moved {
        entity: EntityId,
        position: Vec3,
        yaw: f32,
        pitch: f32,
        visible: bool,
    },
    /// Sent once when a ghost leaves play for good.
    Removed { entity: EntityId },
    /// Cosmetic wisp left behind by an active ghost.
    Trail { ghost: GhostKind, position: Vec3 },
}

/// Output of one session tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub events: Vec<GameEvent>,
    pub updates: Vec<RenderUpdate>,
    /// 0 when the hunter is far away, rising to 1 as it reaches the player.
    pub hunter_proximity: f32,
}

/// Consumer of gameplay events (HUD text, sounds, overlays).
pub trait Presentation {
    fn present(&mut self, event: &GameEvent);

    fn hunter_proximity(&mut self, _intensity: f32) {}
}

/// Consumer of per-entity transform updates.
pub trait Renderer {
    fn apply(&mut self, update: &RenderUpdate);
}

impl Frame {
    pub fn dispatch(&self, renderer: &mut impl Renderer, presentation: &mut impl Presentation) {
        for update in &self.updates {
            renderer.apply(update);
        }
        for event in &self.events {
            presentation.present(event);
        }
        presentation.hunter_proximity(self.hunter_proximity);
    }

    pub fn contains(&self, event: &GameEvent) -> bool {
        self.events.contains(event)
    }
}
