//! The game session: owns every entity and runs one frame at a time.
//!
//! Each running tick executes in a fixed order: player movement, hunter,
//! ghosts, hunter captures, player collection, delivery, then the outcome
//! check. Captures run before collection, so a ghost within reach of both
//! the hunter and the player on the same tick is captured.

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::{GameError, GameResult};
use crate::events::{EntityId, Frame, GameEvent, RenderUpdate};
use crate::ghost::{Ghost, GhostKind, GhostState};
use crate::hunter::Hunter;
use crate::maze::{MazeGrid, Pos};
use crate::pellets::PelletField;
use crate::player::{InputState, Player};

/// Upper bound on the simulated time of one tick.
const MAX_TICK: f32 = 0.1;
const HUNTER_HEIGHT: f32 = 1.5;
const GHOST_HEIGHT: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    NotStarted,
    Running,
    Won,
    Lost { killed_by_hunter: bool },
}

impl Phase {
    pub fn is_over(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost { .. })
    }
}

pub struct GameSession<R: Rng = StdRng> {
    config: GameConfig,
    grid: MazeGrid,
    pellets: PelletField,
    hunter: Hunter,
    ghosts: Vec<Ghost>,
    player: Player,
    safe_zone: Pos,
    phase: Phase,
    /// Active plus collected.
    ghosts_alive: usize,
    ghosts_saved: usize,
    removal_sent: [bool; 4],
    pending: Vec<GameEvent>,
    rng: R,
}

impl GameSession<StdRng> {
    pub fn new(config: GameConfig) -> GameResult<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> GameSession<R> {
    pub fn with_rng(config: GameConfig, rng: R) -> GameResult<Self> {
        let grid = MazeGrid::parse(&config.level.layout, config.cell_size)?;
        let limit = config.spawn_search_limit;
        let level = &config.level;

        let safe_zone = match grid.safe_zone_marker() {
            Some(marker) => marker,
            None => resolve_spawn(&grid, "safe zone", level.player_start, limit)?,
        };
        let hunter_start = resolve_spawn(&grid, "hunter", level.hunter_start, limit)?;
        let ghosts = GhostKind::ALL
            .iter()
            .zip(level.ghost_starts.iter().zip(level.scatter_corners.iter()))
            .map(|(&kind, (&start, &corner))| {
                let cell = resolve_spawn(&grid, kind.name(), start, limit)?;
                Ok::<_, GameError>(Ghost::spawn(kind, &grid, cell, corner))
            })
            .collect::<GameResult<Vec<_>>>()?;

        let pellets = PelletField::from_grid(&grid);
        tracing::debug!(
            width = grid.width(),
            height = grid.height(),
            pellets = pellets.remaining(),
            ?safe_zone,
            "session built"
        );

        Ok(Self {
            hunter: Hunter::spawn(&grid, hunter_start),
            player: Player::spawn(&grid, safe_zone),
            ghosts_alive: ghosts.len(),
            ghosts,
            pellets,
            safe_zone,
            grid,
            config,
            phase: Phase::NotStarted,
            ghosts_saved: 0,
            removal_sent: [false; 4],
            pending: Vec::new(),
            rng,
        })
    }

    /// NotStarted → Running. Ignored in any other phase.
    pub fn start(&mut self) {
        if self.phase != Phase::NotStarted {
            return;
        }
        tracing::info!("session started");
        self.phase = Phase::Running;
        self.pending.push(GameEvent::SessionStarted);
    }

    /// Advance the simulation by `dt` seconds. Outside the running phase
    /// nothing moves; the frame only restates where everything is.
    pub fn tick(&mut self, dt: f32, input: &InputState) -> Frame {
        let mut frame = Frame {
            events: std::mem::take(&mut self.pending),
            ..Frame::default()
        };

        if self.phase == Phase::Running {
            let dt = if dt.is_finite() {
                dt.clamp(0.0, MAX_TICK)
            } else {
                0.0
            };
            self.step(dt, input, &mut frame);
        }

        self.render(&mut frame.updates);
        frame.hunter_proximity = self.hunter_proximity();
        frame
    }

    fn step(&mut self, dt: f32, input: &InputState, frame: &mut Frame) {
        let events = &mut frame.events;

        self.player.tick(dt, input, &self.grid, &self.config);
        for &i in &self.player.carried {
            self.ghosts[i].carry_to(&self.grid, self.player.position);
        }

        self.hunter.tick(
            dt,
            &self.grid,
            &mut self.pellets,
            &self.ghosts,
            &self.config,
            &mut self.rng,
            events,
        );

        let hunter_cell = self.hunter.cell();
        for ghost in &mut self.ghosts {
            if let Some(wisp) = ghost.tick(dt, &self.grid, hunter_cell, &self.config) {
                frame.updates.push(RenderUpdate::Trail {
                    ghost: ghost.kind,
                    position: Vec3::new(wisp.x, GHOST_HEIGHT, wisp.y),
                });
            }
        }

        self.ghosts_alive -= self.hunter.check_captures(&mut self.ghosts, &self.config, events);
        self.player.try_collect(&mut self.ghosts, &self.config, events);
        let delivered = self
            .player
            .try_deliver(&mut self.ghosts, &self.grid, self.safe_zone, events);
        self.ghosts_alive -= delivered;
        self.ghosts_saved += delivered;

        let caught = self
            .player
            .is_caught_by(self.hunter.position(), &self.config);
        let outcome = if caught {
            Some(Phase::Lost { killed_by_hunter: true })
        } else if self.ghosts_saved == self.ghosts.len() {
            Some(Phase::Won)
        } else if self.ghosts_alive == 0 {
            Some(Phase::Lost { killed_by_hunter: false })
        } else {
            None
        };
        if let Some(phase) = outcome {
            self.finish(phase, events);
        }

        self.check_invariants();
    }

    fn finish(&mut self, phase: Phase, events: &mut Vec<GameEvent>) {
        self.phase = phase;
        match phase {
            Phase::Won => {
                tracing::info!(saved = self.ghosts_saved, "session won");
                events.push(GameEvent::SessionWon);
            }
            Phase::Lost { killed_by_hunter } => {
                tracing::info!(killed_by_hunter, saved = self.ghosts_saved, "session lost");
                events.push(GameEvent::SessionLost { killed_by_hunter });
            }
            Phase::NotStarted | Phase::Running => {}
        }
    }

    fn check_invariants(&self) {
        let captured = self
            .ghosts
            .iter()
            .filter(|g| g.state == GhostState::Captured)
            .count();
        debug_assert_eq!(
            self.ghosts_alive + self.ghosts_saved + captured,
            self.ghosts.len(),
            "ghost counts out of balance"
        );
        debug_assert!(
            self.player
                .carried
                .iter()
                .all(|&i| self.ghosts[i].state == GhostState::Collected),
            "player carries a ghost that is not collected"
        );
    }

    fn render(&mut self, updates: &mut Vec<RenderUpdate>) {
        let hunter = self.hunter.position();
        updates.push(RenderUpdate::Moved {
            entity: EntityId::Hunter,
            position: Vec3::new(hunter.x, HUNTER_HEIGHT, hunter.y),
            yaw: self.hunter.mover.yaw(),
            pitch: 0.0,
            visible: true,
        });

        for (i, ghost) in self.ghosts.iter().enumerate() {
            let entity = EntityId::Ghost(ghost.kind);
            match ghost.state {
                GhostState::Active | GhostState::Collected => {
                    let pos = ghost.position();
                    updates.push(RenderUpdate::Moved {
                        entity,
                        position: Vec3::new(pos.x, GHOST_HEIGHT, pos.y),
                        yaw: ghost.mover.yaw(),
                        pitch: 0.0,
                        visible: ghost.is_active(),
                    });
                }
                GhostState::Captured | GhostState::Delivered => {
                    if !self.removal_sent[i] {
                        self.removal_sent[i] = true;
                        updates.push(RenderUpdate::Removed { entity });
                    }
                }
            }
        }

        let eye = self.player.position;
        updates.push(RenderUpdate::Moved {
            entity: EntityId::Player,
            position: Vec3::new(eye.x, self.config.eye_height, eye.y),
            yaw: self.player.yaw,
            pitch: self.player.pitch,
            visible: true,
        });
    }

    /// 0 at or beyond the warning distance, 1 when the hunter stands on the player.
    pub fn hunter_proximity(&self) -> f32 {
        let d = self.player.position.distance(self.hunter.position());
        (1.0 - d / self.config.hunter_warning_distance).max(0.0)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ghosts_alive(&self) -> usize {
        self.ghosts_alive
    }

    pub fn ghosts_saved(&self) -> usize {
        self.ghosts_saved
    }

    pub fn total_ghosts(&self) -> usize {
        self.ghosts.len()
    }

    pub fn dots_remaining(&self) -> usize {
        self.pellets.remaining()
    }

    pub fn pellets(&self) -> &PelletField {
        &self.pellets
    }

    pub fn hunter(&self) -> &Hunter {
        &self.hunter
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn grid(&self) -> &MazeGrid {
        &self.grid
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn safe_zone(&self) -> Pos {
        self.safe_zone
    }

    /// World-space center of the safe zone.
    pub fn safe_zone_center(&self) -> Vec2 {
        self.grid.cell_to_world(self.safe_zone)
    }
}

/// Spawns must lie inside the maze. One that lands on a wall is moved to the
/// nearest walkable cell.
fn resolve_spawn(grid: &MazeGrid, name: &str, pos: Pos, limit: usize) -> GameResult<Pos> {
    if !grid.in_bounds(pos) {
        return Err(GameError::SpawnOutOfBounds {
            name: name.to_string(),
            pos,
            width: grid.width(),
            height: grid.height(),
        });
    }
    if grid.is_walkable_pos(pos) {
        return Ok(pos);
    }
    let fixed = grid.find_nearest_walkable(pos, limit);
    tracing::warn!(name, ?pos, ?fixed, "spawn on a wall, moved to nearest walkable cell");
    Ok(fixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession<StdRng> {
        GameSession::with_rng(GameConfig::default(), StdRng::seed_from_u64(7)).unwrap()
    }

    fn running() -> GameSession<StdRng> {
        let mut session = session();
        session.start();
        session
    }

    fn idle() -> InputState {
        InputState::default()
    }

    fn count(frame: &Frame, pred: impl Fn(&GameEvent) -> bool) -> usize {
        frame.events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn builds_from_default_config() {
        let session = session();
        assert_eq!(session.phase(), Phase::NotStarted);
        assert_eq!(session.safe_zone(), Pos::new(10, 9));
        assert_eq!(session.player().cell(session.grid()), Pos::new(10, 9));
        assert_eq!(session.hunter().cell(), Pos::new(10, 15));
        assert_eq!(session.ghosts_alive(), 4);
        assert_eq!(session.ghosts_saved(), 0);
        assert_eq!(session.total_ghosts(), 4);
        assert!(session.dots_remaining() > 0);
        for ghost in session.ghosts() {
            assert!(session.grid().is_walkable_pos(ghost.cell()));
        }
    }

    #[test]
    fn spawn_on_wall_is_moved() {
        let mut config = GameConfig::default();
        config.level.hunter_start = Pos::new(10, 10);
        let session = GameSession::with_rng(config, StdRng::seed_from_u64(1)).unwrap();
        let cell = session.hunter().cell();
        assert!(session.grid().is_walkable_pos(cell));
        assert_eq!(cell.manhattan(Pos::new(10, 10)), 1);
    }

    #[test]
    fn spawn_outside_grid_is_an_error() {
        let mut config = GameConfig::default();
        config.level.ghost_starts[2] = Pos::new(40, 3);
        let err = GameSession::with_rng(config, StdRng::seed_from_u64(1)).err();
        assert!(matches!(
            err,
            Some(GameError::SpawnOutOfBounds { ref name, .. }) if name.as_str() == "Pinky"
        ));
    }

    #[test]
    fn safe_zone_falls_back_to_player_start() {
        let mut config = GameConfig::default();
        config.level.layout[9] = config.level.layout[9].replace('S', " ");
        config.level.player_start = Pos::new(1, 1);
        let session = GameSession::with_rng(config, StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(session.safe_zone(), Pos::new(1, 1));
        assert_eq!(session.player().cell(session.grid()), Pos::new(1, 1));
    }

    #[test]
    fn tick_before_start_changes_nothing() {
        let mut session = session();
        let before = (session.player().position, session.hunter().position());
        let input = InputState {
            forward: true,
            ..idle()
        };
        let frame = session.tick(0.05, &input);
        assert!(frame.events.is_empty());
        assert_eq!(session.phase(), Phase::NotStarted);
        assert_eq!(before, (session.player().position, session.hunter().position()));
        // Hunter, four ghosts, player.
        assert_eq!(frame.updates.len(), 6);
    }

    #[test]
    fn start_emits_session_started_once() {
        let mut session = session();
        session.start();
        session.start();
        assert_eq!(session.phase(), Phase::Running);
        let frame = session.tick(0.0, &idle());
        assert_eq!(count(&frame, |e| *e == GameEvent::SessionStarted), 1);
        let frame = session.tick(0.0, &idle());
        assert_eq!(count(&frame, |e| *e == GameEvent::SessionStarted), 0);
    }

    #[test]
    fn non_finite_dt_is_treated_as_zero() {
        let mut session = running();
        session.tick(0.0, &idle());
        let start = session.player.position;
        let input = InputState {
            forward: true,
            ..idle()
        };
        for dt in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            session.tick(dt, &input);
            assert_eq!(session.player.position, start);
            assert_eq!(session.player.cell(&session.grid), session.safe_zone());
        }

        // Trail clocks keep running afterwards.
        let trails = (0..20)
            .map(|_| session.tick(0.05, &idle()))
            .flat_map(|frame| frame.updates)
            .filter(|u| matches!(u, RenderUpdate::Trail { .. }))
            .count();
        assert!(trails > 0);
    }

    #[test]
    fn scenario_c_player_collects_nearby_ghost() {
        let mut session = running();
        session.player.position = Vec2::new(44.0, 38.0);
        session.ghosts[0].mover.place(&session.grid, Pos::new(10, 9));

        let frame = session.tick(1.0 / 60.0, &idle());
        assert_eq!(session.ghosts[0].state, GhostState::Collected);
        assert_eq!(session.player.carried, vec![0]);
        assert!(frame.contains(&GameEvent::GhostCollected {
            ghost: GhostKind::Blinky
        }));
        assert_eq!(session.ghosts_alive(), 4);

        let mut events = Vec::new();
        let again = session
            .player
            .try_collect(&mut session.ghosts, &session.config, &mut events);
        assert_eq!(again, 0);
        assert!(events.is_empty());
        assert_eq!(session.player.carried, vec![0]);
    }

    #[test]
    fn scenario_d_last_delivery_wins_once() {
        let mut session = running();
        session.ghosts[0].collect();
        session.ghosts[0].deliver();
        session.ghosts[1].collect();
        session.ghosts[1].deliver();
        session.ghosts_saved = 2;
        session.ghosts_alive = 2;
        session.ghosts[2].collect();
        session.ghosts[3].collect();
        session.player.carried = vec![2, 3];
        session.player.position = session.safe_zone_center();

        let frame = session.tick(1.0 / 60.0, &idle());
        assert_eq!(session.ghosts_saved(), 4);
        assert_eq!(session.ghosts_alive(), 0);
        assert!(session.player.carried.is_empty());
        assert_eq!(session.phase(), Phase::Won);
        assert!(frame.contains(&GameEvent::GhostsDelivered { count: 2 }));
        assert_eq!(count(&frame, |e| *e == GameEvent::SessionWon), 1);

        let next = session.tick(1.0 / 60.0, &idle());
        assert!(next.events.is_empty());
        assert_eq!(session.phase(), Phase::Won);
    }

    #[test]
    fn scenario_e_hunter_contact_loses_and_freezes() {
        let mut session = running();
        session.player.position = Vec2::new(44.0, 38.0);
        // Cell (11, 9) centers at (46, 38): two units from the player.
        session.hunter.mover.place(&session.grid, Pos::new(11, 9));

        let frame = session.tick(1.0 / 60.0, &idle());
        assert_eq!(session.phase(), Phase::Lost { killed_by_hunter: true });
        assert_eq!(
            count(&frame, |e| matches!(e, GameEvent::SessionLost { .. })),
            1
        );
        assert!(frame.hunter_proximity > 0.8);

        let snapshot = (
            session.player.position,
            session.hunter.position(),
            session.ghosts.iter().map(Ghost::position).collect::<Vec<_>>(),
            session.dots_remaining(),
        );
        let input = InputState {
            forward: true,
            running: true,
            ..idle()
        };
        for _ in 0..30 {
            let frame = session.tick(0.05, &input);
            assert!(frame.events.is_empty());
        }
        assert_eq!(
            snapshot,
            (
                session.player.position,
                session.hunter.position(),
                session.ghosts.iter().map(Ghost::position).collect::<Vec<_>>(),
                session.dots_remaining(),
            )
        );
    }

    #[test]
    fn capture_wins_the_race_against_collection() {
        let mut session = running();
        session.player.position = Vec2::new(42.0, 38.0);
        let ghost = &mut session.ghosts[1].mover;
        ghost.cell = Pos::new(11, 9);
        ghost.target = Pos::new(11, 9);
        ghost.position = Vec2::new(44.4, 38.0);
        let hunter = &mut session.hunter.mover;
        hunter.cell = Pos::new(11, 9);
        hunter.target = Pos::new(11, 9);
        hunter.position = Vec2::new(46.2, 38.0);

        let frame = session.tick(0.0, &idle());
        assert_eq!(session.ghosts[1].state, GhostState::Captured);
        assert!(session.player.carried.is_empty());
        assert_eq!(session.ghosts_alive(), 3);
        assert_eq!(session.phase(), Phase::Running);
        assert!(frame.contains(&GameEvent::GhostCaptured {
            ghost: GhostKind::Inky
        }));
        let removed = RenderUpdate::Removed {
            entity: EntityId::Ghost(GhostKind::Inky),
        };
        assert!(frame.updates.contains(&removed));

        let next = session.tick(0.0, &idle());
        assert!(!next.updates.contains(&removed));
    }

    #[test]
    fn losing_every_ghost_to_the_hunter_loses() {
        let mut session = running();
        for ghost in &mut session.ghosts[..3] {
            ghost.capture();
        }
        session.ghosts_alive = 1;
        let hunter_cell = session.hunter.cell();
        session.ghosts[3].mover.place(&session.grid, hunter_cell);

        let frame = session.tick(0.0, &idle());
        assert_eq!(session.phase(), Phase::Lost { killed_by_hunter: false });
        assert!(frame.contains(&GameEvent::SessionLost {
            killed_by_hunter: false
        }));
        assert_eq!(session.ghosts_alive(), 0);
    }

    #[test]
    fn collected_ghost_rides_with_the_player() {
        let mut session = running();
        session.ghosts[0].collect();
        session.player.carried = vec![0];
        session.player.position = Vec2::new(10.0, 14.0);
        let frame = session.tick(1.0 / 60.0, &idle());
        assert_eq!(session.ghosts[0].position(), session.player.position);
        let hidden = frame.updates.iter().any(|u| {
            matches!(
                u,
                RenderUpdate::Moved {
                    entity: EntityId::Ghost(GhostKind::Blinky),
                    visible: false,
                    ..
                }
            )
        });
        assert!(hidden);
    }

    #[test]
    fn proximity_fades_with_distance() {
        let mut session = session();
        session.player.position = session.hunter.position();
        assert_eq!(session.hunter_proximity(), 1.0);
        session.player.position = session.hunter.position() + Vec2::new(0.0, 7.5);
        assert!((session.hunter_proximity() - 0.5).abs() < 1e-5);
        session.player.position = session.hunter.position() + Vec2::new(0.0, 30.0);
        assert_eq!(session.hunter_proximity(), 0.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn input() -> impl Strategy<Value = (InputState, f32)> {
            (
                any::<[bool; 5]>(),
                -std::f32::consts::PI..std::f32::consts::PI,
                0.0f32..0.1,
            )
                .prop_map(|(keys, yaw, dt)| {
                    let input = InputState {
                        forward: keys[0],
                        backward: keys[1],
                        left: keys[2],
                        right: keys[3],
                        running: keys[4],
                        yaw,
                        pitch: 0.0,
                    };
                    (input, dt)
                })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(48))]

            #[test]
            fn ghost_counts_always_balance(
                seed in any::<u64>(),
                inputs in proptest::collection::vec(input(), 1..300),
            ) {
                let mut session = GameSession::with_rng(
                    GameConfig::default(),
                    StdRng::seed_from_u64(seed),
                ).unwrap();
                session.start();
                let mut endings = 0;
                for (input, dt) in &inputs {
                    let frame = session.tick(*dt, input);
                    endings += frame
                        .events
                        .iter()
                        .filter(|e| matches!(e, GameEvent::SessionWon | GameEvent::SessionLost { .. }))
                        .count();
                    let captured = session
                        .ghosts()
                        .iter()
                        .filter(|g| g.state == GhostState::Captured)
                        .count();
                    prop_assert_eq!(
                        session.ghosts_alive() + session.ghosts_saved() + captured,
                        session.total_ghosts()
                    );
                    prop_assert!(session.grid().is_walkable_pos(session.hunter().cell()));
                }
                prop_assert!(endings <= 1);
                prop_assert_eq!(endings == 1, session.phase().is_over());
            }
        }
    }
}
