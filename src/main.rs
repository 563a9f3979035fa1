use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use glam::Vec2;
use pacman_rescue::{
    Dir, EntityId, GameConfig, GameEvent, GameSession, GhostKind, InputState, MazeGrid, Pos,
    Presentation, RenderUpdate, Renderer, Tile,
};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::fs::File;
use std::io::{self, Stdout, Write};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

const CELL_W: usize = 2;
const HUD_LINES: usize = 2;
const DEFAULT_RENDER_FPS: u64 = 60;
const INPUT_HOLD_MS: u64 = 160;
const DANGER_BAR: usize = 10;

const FORWARD: usize = 0;
const BACKWARD: usize = 1;
const LEFT: usize = 2;
const RIGHT: usize = 3;
const RUN: usize = 4;

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player(Dir),
    Hunter,
    Ghost,
    Wall,
    Empty,
    Dot,
    Power,
    SafeZone,
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

/// Where the session last said everything is.
#[derive(Default)]
struct Board {
    hunter: Option<Vec2>,
    /// Visible ghosts only.
    ghosts: HashMap<GhostKind, Vec2>,
    player: Option<(Vec2, f32)>,
}

impl Renderer for Board {
    fn apply(&mut self, update: &RenderUpdate) {
        match *update {
            RenderUpdate::Moved {
                entity,
                position,
                yaw,
                visible,
                ..
            } => {
                let ground = Vec2::new(position.x, position.z);
                match entity {
                    EntityId::Hunter => self.hunter = Some(ground),
                    EntityId::Player => self.player = Some((ground, yaw)),
                    EntityId::Ghost(kind) if visible => {
                        self.ghosts.insert(kind, ground);
                    }
                    EntityId::Ghost(kind) => {
                        self.ghosts.remove(&kind);
                    }
                }
            }
            RenderUpdate::Removed {
                entity: EntityId::Ghost(kind),
            } => {
                self.ghosts.remove(&kind);
            }
            RenderUpdate::Removed { .. } | RenderUpdate::Trail { .. } => {}
        }
    }
}

/// Status line state, built purely from the event stream.
struct Hud {
    eaten: HashSet<Pos>,
    empowered: bool,
    saved: usize,
    captured: usize,
    carrying: usize,
    proximity: f32,
    message: String,
}

impl Default for Hud {
    fn default() -> Self {
        Self {
            eaten: HashSet::new(),
            empowered: false,
            saved: 0,
            captured: 0,
            carrying: 0,
            proximity: 0.0,
            message: "Press Enter to start. w/s walk, h/l strafe, a/d turn, W run.".to_string(),
        }
    }
}

impl Presentation for Hud {
    fn present(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::SessionStarted => {
                self.message = "Find the ghosts and carry them to the safe zone.".to_string();
            }
            GameEvent::DotEaten { cell } => {
                self.eaten.insert(cell);
            }
            GameEvent::PelletEaten { cell } => {
                self.eaten.insert(cell);
                self.empowered = true;
                self.message = "PAC-MAN is powered up!".to_string();
            }
            GameEvent::EmpowerEnded => {
                self.empowered = false;
                self.message = "PAC-MAN's power has faded.".to_string();
            }
            GameEvent::GhostCaptured { ghost } => {
                self.captured += 1;
                self.message = format!("PAC-MAN caught {}!", ghost.name());
            }
            GameEvent::GhostCollected { ghost } => {
                self.carrying += 1;
                self.message = format!("You picked up {}.", ghost.name());
            }
            GameEvent::GhostsDelivered { count } => {
                self.carrying = self.carrying.saturating_sub(count);
                self.saved += count;
                self.message = format!("Delivered {count} ghost(s) to safety.");
            }
            GameEvent::SessionWon => {
                self.message = "Every ghost is safe. You win! (q to quit)".to_string();
            }
            GameEvent::SessionLost { killed_by_hunter } => {
                self.message = if killed_by_hunter {
                    "PAC-MAN got you. Game over. (q to quit)".to_string()
                } else {
                    "PAC-MAN caught every ghost. Game over. (q to quit)".to_string()
                };
            }
        }
    }

    fn hunter_proximity(&mut self, intensity: f32) {
        self.proximity = intensity;
    }
}

struct Screen {
    last: Vec<Cell>,
    last_hud: [String; HUD_LINES],
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Screen {
    fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Empty,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: [String::new(), String::new()],
            needs_full: true,
            origin_x: 0,
            origin_y: HUD_LINES as u16,
        }
    }
}

/// Terminals report no key releases, so a key counts as held for a short
/// window after each press or repeat.
#[derive(Default)]
struct HeldKeys {
    last_seen: [Option<Instant>; 5],
}

impl HeldKeys {
    fn press(&mut self, key: char, now: Instant) {
        let slot = match key {
            'w' => FORWARD,
            's' => BACKWARD,
            'h' => LEFT,
            'l' => RIGHT,
            'W' => {
                self.last_seen[FORWARD] = Some(now);
                RUN
            }
            _ => return,
        };
        self.last_seen[slot] = Some(now);
    }

    fn held(&self, slot: usize, now: Instant) -> bool {
        self.last_seen[slot]
            .is_some_and(|t| now.duration_since(t) <= Duration::from_millis(INPUT_HOLD_MS))
    }

    fn input(&self, yaw: f32, now: Instant) -> InputState {
        InputState {
            forward: self.held(FORWARD, now),
            backward: self.held(BACKWARD, now),
            left: self.held(LEFT, now),
            right: self.held(RIGHT, now),
            running: self.held(RUN, now),
            yaw,
            pitch: 0.0,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let config = GameConfig::load();
    let mut session = GameSession::new(config)?;

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &mut session);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    Ok(result?)
}

/// Log lines would tear the game screen, so tracing only goes to a file.
fn init_logging() {
    let Ok(path) = std::env::var("PACMAN_RESCUE_LOG") else {
        return;
    };
    match File::create(&path) {
        Ok(file) => {
            let init = tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
            if let Err(e) = init {
                eprintln!("Cannot install logger for {path}: {e}");
            }
        }
        Err(e) => eprintln!("Cannot open log file {path}: {e}"),
    }
}

fn run(stdout: &mut Stdout, session: &mut GameSession) -> io::Result<()> {
    let grid = session.grid().clone();
    let mut screen = Screen::new(grid.width() as usize, grid.height() as usize);
    let mut board = Board::default();
    let mut hud = Hud::default();
    let mut keys = HeldKeys::default();
    let mut yaw = 0.0f32;
    let frame_time = Duration::from_micros(1_000_000 / read_render_fps().max(1));
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Enter => session.start(),
                    KeyCode::Char('a') => yaw = turn(yaw, FRAC_PI_2),
                    KeyCode::Char('d') => yaw = turn(yaw, -FRAC_PI_2),
                    KeyCode::Char(c) => keys.press(c, frame_start),
                    _ => {}
                }
            }
        }

        let dt = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();
        let frame = session.tick(dt, &keys.input(yaw, frame_start));
        frame.dispatch(&mut board, &mut hud);
        render(stdout, session, &grid, &board, &hud, &mut screen)?;

        if session.phase().is_over() {
            return wait_for_quit();
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn read_render_fps() -> u64 {
    std::env::var("PACMAN_RESCUE_FPS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RENDER_FPS)
}

fn turn(yaw: f32, by: f32) -> f32 {
    (yaw + by + PI).rem_euclid(TAU) - PI
}

/// The grid direction closest to a yaw angle.
fn facing(yaw: f32) -> Dir {
    let off = |dir: Dir| ((dir.yaw() - yaw + PI).rem_euclid(TAU) - PI).abs();
    Dir::ALL
        .into_iter()
        .min_by(|a, b| off(*a).total_cmp(&off(*b)))
        .unwrap_or(Dir::Down)
}

fn render(
    stdout: &mut Stdout,
    session: &GameSession,
    grid: &MazeGrid,
    board: &Board,
    hud: &Hud,
    screen: &mut Screen,
) -> io::Result<()> {
    let width = grid.width() as usize;
    let height = grid.height() as usize;
    let needed_h = (height + HUD_LINES + 1) as u16;
    let needed_w = (width * CELL_W) as u16;

    stdout.queue(MoveTo(0, 0))?;

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            needed_w, needed_h, term_w, term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        screen.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + HUD_LINES as u16;
    if origin_x != screen.origin_x || origin_y != screen.origin_y {
        screen.origin_x = origin_x;
        screen.origin_y = origin_y;
        screen.needs_full = true;
        stdout.queue(Clear(ClearType::All))?;
    }

    let danger = if hud.proximity > 0.0 {
        let lit = ((hud.proximity * DANGER_BAR as f32).ceil() as usize).min(DANGER_BAR);
        format!("  Danger: [{}{}]", "#".repeat(lit), " ".repeat(DANGER_BAR - lit))
    } else {
        String::new()
    };
    let lines = [
        format!(
            "Saved: {}/{}  Caught: {}  Carrying: {}  Dots: {}{}",
            hud.saved,
            session.total_ghosts(),
            hud.captured,
            hud.carrying,
            session.dots_remaining(),
            danger
        ),
        hud.message.clone(),
    ];
    for (row, line) in lines.into_iter().enumerate() {
        if screen.needs_full || line != screen.last_hud[row] {
            let y = screen.origin_y - HUD_LINES as u16 + row as u16;
            stdout.queue(MoveTo(screen.origin_x, y))?;
            stdout.queue(SetForegroundColor(if row == 0 { Color::White } else { Color::Yellow }))?;
            stdout.queue(Clear(ClearType::CurrentLine))?;
            stdout.queue(Print(&line))?;
            stdout.queue(ResetColor)?;
            screen.last_hud[row] = line;
        }
    }

    let safe_zone = session.safe_zone();
    for z in 0..height {
        for x in 0..width {
            let pos = Pos::new(x as i32, z as i32);
            let cell = cell_for(grid, safe_zone, board, hud, pos);
            let idx = z * width + x;
            if screen.needs_full || cell != screen.last[idx] {
                screen.last[idx] = cell;
                draw_cell(stdout, screen, x, z, cell)?;
            }
        }
    }
    screen.needs_full = false;

    stdout.flush()?;
    Ok(())
}

fn cell_for(grid: &MazeGrid, safe_zone: Pos, board: &Board, hud: &Hud, pos: Pos) -> Cell {
    if let Some((at, yaw)) = board.player {
        if grid.world_to_cell(at) == pos {
            return Cell {
                glyph: Glyph::Player(facing(yaw)),
                color: Color::Green,
            };
        }
    }
    if board.hunter.is_some_and(|at| grid.world_to_cell(at) == pos) {
        return Cell {
            glyph: Glyph::Hunter,
            color: if hud.empowered {
                Color::Magenta
            } else {
                Color::Yellow
            },
        };
    }
    let ghost = GhostKind::ALL.into_iter().find(|kind| {
        board
            .ghosts
            .get(kind)
            .is_some_and(|at| grid.world_to_cell(*at) == pos)
    });
    if let Some(kind) = ghost {
        let rgb = kind.color();
        return Cell {
            glyph: Glyph::Ghost,
            color: Color::Rgb {
                r: (rgb >> 16) as u8,
                g: (rgb >> 8) as u8,
                b: rgb as u8,
            },
        };
    }
    if pos == safe_zone {
        return Cell {
            glyph: Glyph::SafeZone,
            color: Color::Green,
        };
    }
    match grid.tile(pos) {
        Some(Tile::Wall) => Cell {
            glyph: Glyph::Wall,
            color: Color::Blue,
        },
        Some(Tile::Dot) if !hud.eaten.contains(&pos) => Cell {
            glyph: Glyph::Dot,
            color: Color::White,
        },
        Some(Tile::Pellet) if !hud.eaten.contains(&pos) => Cell {
            glyph: Glyph::Power,
            color: Color::Magenta,
        },
        _ => Cell {
            glyph: Glyph::Empty,
            color: Color::Reset,
        },
    }
}

fn draw_cell(stdout: &mut Stdout, screen: &Screen, x: usize, y: usize, cell: Cell) -> io::Result<()> {
    let text = match cell.glyph {
        Glyph::Player(Dir::Up) => "▲",
        Glyph::Player(Dir::Down) => "▼",
        Glyph::Player(Dir::Left) => "◀",
        Glyph::Player(Dir::Right) => "▶",
        Glyph::Hunter => "ᗧ",
        Glyph::Ghost => "ᗣ",
        Glyph::Wall => "██",
        Glyph::Empty => "  ",
        Glyph::Dot => "· ",
        Glyph::Power => "● ",
        Glyph::SafeZone => "░░",
    };
    let x_pos = screen.origin_x + (x * CELL_W) as u16;
    let y_pos = screen.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(cell.color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

fn wait_for_quit() -> io::Result<()> {
    loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && key.code == KeyCode::Char('q') {
                    return Ok(());
                }
            }
        }
    }
}
