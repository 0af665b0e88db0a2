//! Grid - fixed-size index of who occupies which cell
//!
//! Cells hold identifiers only; the registry owns the entities themselves.

use serde::{Deserialize, Serialize};

use crate::components::{BuildingId, EnemyId, FlagId, HeroId, Position};

/// At most one occupant per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub building: Option<BuildingId>,
    pub hero: Option<HeroId>,
    pub enemy: Option<EnemyId>,
    pub flag: Option<FlagId>,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.building.is_none() && self.hero.is_none() && self.enemy.is_none() && self.flag.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        Some(pos.y as usize * self.width as usize + pos.x as usize)
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.index(pos).map(move |i| &mut self.cells[i])
    }

    /// Clamp a position onto the grid.
    pub fn clamp(&self, pos: Position) -> Position {
        Position::new(
            pos.x.clamp(0, self.width as i32 - 1),
            pos.y.clamp(0, self.height as i32 - 1),
        )
    }

    /// True for cells on any of the four outer lines.
    pub fn is_border(&self, pos: Position) -> bool {
        self.contains(pos)
            && (pos.x == 0
                || pos.y == 0
                || pos.x as u32 == self.width - 1
                || pos.y as u32 == self.height - 1)
    }

    pub fn center(&self) -> Position {
        Position::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    /// Every cell with its coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        let width = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (Position::new((i % width) as i32, (i / width) as i32), cell))
    }

    /// In-bounds orthogonal neighbours of `pos`.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        pos.neighbors().into_iter().filter(move |p| self.contains(*p))
    }
}
