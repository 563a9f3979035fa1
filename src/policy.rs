//! Greedy one-step direction choice, evaluated each time an agent arrives on
//! a cell. There is no lookahead: each candidate step is scored by the
//! Manhattan distance from the cell it leads to.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::maze::{Dir, MazeGrid, Pos};

/// Directions from `from` that lead onto a walkable cell, in [`Dir::ALL`] order.
pub fn walkable_directions(grid: &MazeGrid, from: Pos, wrap: bool) -> Vec<Dir> {
    Dir::ALL
        .into_iter()
        .filter(|&dir| grid.is_walkable_pos(grid.neighbor(from, dir, wrap)))
        .collect()
}

/// Every walkable direction tied for the lowest score, in [`Dir::ALL`] order.
///
/// A step's score is the Manhattan distance from its destination to
/// `target`, plus `reversal_penalty` if it undoes `heading`. Reversing is
/// discouraged, never forbidden: at a dead end it is the only candidate.
pub fn best_directions(
    grid: &MazeGrid,
    from: Pos,
    heading: Option<Dir>,
    target: Pos,
    reversal_penalty: i32,
    wrap: bool,
) -> Vec<Dir> {
    let reverse = heading.map(Dir::opposite);
    let mut best = i32::MAX;
    let mut options = Vec::new();
    for dir in walkable_directions(grid, from, wrap) {
        let next = grid.neighbor(from, dir, wrap);
        let mut score = next.manhattan(target);
        if Some(dir) == reverse {
            score += reversal_penalty;
        }
        if score < best {
            best = score;
            options.clear();
            options.push(dir);
        } else if score == best {
            options.push(dir);
        }
    }
    options
}

/// Deterministic choice: ties go to the first direction in [`Dir::ALL`].
/// `None` only when the agent is walled in on all four sides.
pub fn choose_direction(
    grid: &MazeGrid,
    from: Pos,
    heading: Option<Dir>,
    target: Pos,
    reversal_penalty: i32,
    wrap: bool,
) -> Option<Dir> {
    best_directions(grid, from, heading, target, reversal_penalty, wrap)
        .first()
        .copied()
}

/// Same scoring as [`choose_direction`] with ties broken uniformly at random.
pub fn choose_direction_random_tie(
    grid: &MazeGrid,
    from: Pos,
    heading: Option<Dir>,
    target: Pos,
    reversal_penalty: i32,
    wrap: bool,
    rng: &mut impl Rng,
) -> Option<Dir> {
    best_directions(grid, from, heading, target, reversal_penalty, wrap)
        .choose(rng)
        .copied()
}
