use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::tiles::TileId;
use crate::utils::{GameError, GameResult};

// Row 0 is the top edge, so Up moves toward smaller y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

impl FromStr for Direction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "w" => Ok(Direction::Up),
            "down" | "s" => Ok(Direction::Down),
            "left" | "a" => Ok(Direction::Left),
            "right" | "d" => Ok(Direction::Right),
            _ => Err(GameError::invalid_direction(s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: usize,
    pub y: usize,
}

impl CellCoord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    coord: CellCoord,
    occupant: Option<TileId>,
}

impl Cell {
    fn new(coord: CellCoord) -> Self {
        Self { coord, occupant: None }
    }

    pub fn coord(&self) -> CellCoord {
        self.coord
    }

    pub fn occupant(&self) -> Option<TileId> {
        self.occupant
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> GameResult<Self> {
        if width == 0 || height == 0 {
            return Err(GameError::configuration(format!(
                "Grid dimensions must be at least 1x1, got {}x{}",
                width, height
            )));
        }

        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| Cell::new(CellCoord::new(x, y))))
            .collect();

        Ok(Self { width, height, cells })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> usize {
        self.width * self.height
    }

    pub fn contains(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn cell(&self, x: isize, y: isize) -> GameResult<&Cell> {
        if !self.contains(x, y) {
            return Err(GameError::out_of_bounds(x, y, self.width, self.height));
        }
        Ok(&self.cells[self.index(x as usize, y as usize)])
    }

    pub fn cell_at(&self, coord: CellCoord) -> GameResult<&Cell> {
        self.cell(coord.x as isize, coord.y as isize)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn adjacent(&self, coord: CellCoord, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.delta();
        let x = coord.x as isize + dx;
        let y = coord.y as isize + dy;

        if self.contains(x, y) {
            Some(CellCoord::new(x as usize, y as usize))
        } else {
            None
        }
    }

    pub fn occupant(&self, coord: CellCoord) -> Option<TileId> {
        self.cell_at(coord).ok().and_then(Cell::occupant)
    }

    pub fn is_occupied(&self, coord: CellCoord) -> bool {
        self.occupant(coord).is_some()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_empty()).count()
    }

    pub fn random_empty_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> GameResult<CellCoord> {
        let empty: Vec<CellCoord> = self
            .cells
            .iter()
            .filter(|cell| cell.is_empty())
            .map(Cell::coord)
            .collect();

        empty.choose(rng).copied().ok_or(GameError::GridFull)
    }

    // Occupancy is only rewritten through the tile registry, which keeps the
    // tile side of the binding in step.
    pub(crate) fn set_occupant(&mut self, coord: CellCoord, occupant: Option<TileId>) -> GameResult<()> {
        if coord.x >= self.width || coord.y >= self.height {
            return Err(GameError::out_of_bounds(
                coord.x as isize,
                coord.y as isize,
                self.width,
                self.height,
            ));
        }
        let index = self.index(coord.x, coord.y);
        self.cells[index].occupant = occupant;
        Ok(())
    }

    pub(crate) fn clear_occupants(&mut self) {
        for cell in &mut self.cells {
            cell.occupant = None;
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}
