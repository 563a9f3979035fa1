use serde::{Deserialize, Serialize};

use crate::maze::Pos;

/// Built-in maze. Rows 7, 9 and 11 open onto paired tunnels at both edges;
/// `S` marks the safe zone inside the central pen.
const LAYOUT: [&str; 21] = [
    "#####################",
    "#.........#.........#",
    "#o##.####.#.####.##o#",
    "#...................#",
    "#.##.#.#######.#.##.#",
    "#....#....#....#....#",
    "####.#### # ####.####",
    "   #.#         #.#   ",
    "####.# ### ### #.####",
    "    .  #  S  #  .    ",
    "####.# ####### #.####",
    "   #.#         #.#   ",
    "####.# ####### #.####",
    "#.........#.........#",
    "#.##.####.#.####.##.#",
    "#o.#...... ......#.o#",
    "##.#.#.#######.#.#.##",
    "#....#....#....#....#",
    "#.#######.#.#######.#",
    "#...................#",
    "#####################",
];

/// Maze layout plus every spawn the session needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelData {
    pub layout: Vec<String>,
    /// Used when the layout has no `S` marker; the safe zone sits here too.
    pub player_start: Pos,
    pub hunter_start: Pos,
    /// Blinky, Inky, Pinky, Clyde.
    pub ghost_starts: [Pos; 4],
    /// Long-term flight destination per ghost, same order as `ghost_starts`.
    pub scatter_corners: [Pos; 4],
}

impl Default for LevelData {
    fn default() -> Self {
        create_level()
    }
}

pub fn create_level() -> LevelData {
    LevelData {
        layout: LAYOUT.iter().map(|row| row.to_string()).collect(),
        player_start: Pos::new(10, 9),
        hunter_start: Pos::new(10, 15),
        ghost_starts: [
            Pos::new(6, 7),   // Blinky
            Pos::new(14, 7),  // Inky
            Pos::new(6, 11),  // Pinky
            Pos::new(14, 11), // Clyde
        ],
        scatter_corners: [
            Pos::new(1, 1),
            Pos::new(19, 1),
            Pos::new(1, 19),
            Pos::new(19, 19),
        ],
    }
}
