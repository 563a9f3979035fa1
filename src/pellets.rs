use std::collections::HashMap;

use crate::maze::{MazeGrid, Pos, Tile};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PelletKind {
    Normal,
    Power,
}

#[derive(Debug, Clone)]
pub struct Pellet {
    pub cell: Pos,
    pub kind: PelletKind,
    /// Only ever goes from false to true.
    pub eaten: bool,
}

/// Dots and power pellets laid out from the maze's starting tiles. The maze
/// itself never changes; eaten state lives here.
#[derive(Debug, Clone, Default)]
pub struct PelletField {
    pellets: Vec<Pellet>,
    by_cell: HashMap<Pos, usize>,
    remaining: usize,
}

impl PelletField {
    pub fn from_grid(grid: &MazeGrid) -> Self {
        let mut field = Self::default();
        for (cell, tile) in grid.cells() {
            let kind = match tile {
                Tile::Dot => PelletKind::Normal,
                Tile::Pellet => PelletKind::Power,
                Tile::Wall | Tile::Path => continue,
            };
            field.by_cell.insert(cell, field.pellets.len());
            field.pellets.push(Pellet {
                cell,
                kind,
                eaten: false,
            });
        }
        field.remaining = field.pellets.len();
        field
    }

    pub fn has_uneaten(&self, cell: Pos) -> bool {
        self.by_cell
            .get(&cell)
            .is_some_and(|&i| !self.pellets[i].eaten)
    }

    /// Mark the pellet on `cell` eaten. Returns its kind the first time only.
    pub fn eat(&mut self, cell: Pos) -> Option<PelletKind> {
        let pellet = &mut self.pellets[*self.by_cell.get(&cell)?];
        if pellet.eaten {
            return None;
        }
        pellet.eaten = true;
        self.remaining -= 1;
        Some(pellet.kind)
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Pellets not yet eaten.
    pub fn active(&self) -> impl Iterator<Item = &Pellet> {
        self.pellets.iter().filter(|p| !p.eaten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> PelletField {
        let grid = MazeGrid::parse(&["#####", "#.o #", "#####"], 4.0).unwrap();
        PelletField::from_grid(&grid)
    }

    #[test]
    fn collects_dots_and_pellets() {
        let field = field();
        assert_eq!(field.remaining(), 2);
        assert!(field.has_uneaten(Pos::new(1, 1)));
        assert!(field.has_uneaten(Pos::new(2, 1)));
        assert!(!field.has_uneaten(Pos::new(3, 1)));
    }

    #[test]
    fn eating_is_idempotent() {
        let mut field = field();
        assert_eq!(field.eat(Pos::new(2, 1)), Some(PelletKind::Power));
        assert_eq!(field.eat(Pos::new(2, 1)), None);
        assert_eq!(field.eat(Pos::new(3, 1)), None);
        assert_eq!(field.remaining(), 1);
        assert!(!field.has_uneaten(Pos::new(2, 1)));
        assert_eq!(field.active().count(), 1);
    }
}
