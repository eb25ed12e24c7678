use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::grid::{CellCoord, Grid};
use crate::utils::{GameError, GameResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub(crate) u64);

impl TileId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub level: usize,
    pub cell: Option<CellCoord>,
    // Set after absorbing a tile this turn, cleared on settle.
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDef {
    pub value: u32,
    pub background: String,
    pub foreground: String,
}

impl LevelDef {
    pub fn new<S: Into<String>>(value: u32, background: S, foreground: S) -> Self {
        Self {
            value,
            background: background.into(),
            foreground: foreground.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LevelDef>", into = "Vec<LevelDef>")]
pub struct LevelSequence {
    levels: Vec<LevelDef>,
}

impl TryFrom<Vec<LevelDef>> for LevelSequence {
    type Error = GameError;

    fn try_from(levels: Vec<LevelDef>) -> GameResult<Self> {
        Self::new(levels)
    }
}

impl From<LevelSequence> for Vec<LevelDef> {
    fn from(sequence: LevelSequence) -> Self {
        sequence.levels
    }
}

impl LevelSequence {
    pub fn new(levels: Vec<LevelDef>) -> GameResult<Self> {
        if levels.is_empty() {
            return Err(GameError::configuration("Level sequence cannot be empty"));
        }
        Ok(Self { levels })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn get(&self, level: usize) -> GameResult<&LevelDef> {
        self.levels.get(level).ok_or(GameError::InvalidLevel {
            level,
            max: self.max_level(),
        })
    }

    pub fn value(&self, level: usize) -> GameResult<u32> {
        self.get(level).map(|def| def.value)
    }

    pub fn next(&self, level: usize) -> Option<usize> {
        if level < self.max_level() {
            Some(level + 1)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelDef> {
        self.levels.iter()
    }
}

impl Default for LevelSequence {
    fn default() -> Self {
        let levels = vec![
            LevelDef::new(2, "white", "black"),
            LevelDef::new(4, "bright_white", "black"),
            LevelDef::new(8, "bright_yellow", "black"),
            LevelDef::new(16, "yellow", "black"),
            LevelDef::new(32, "bright_red", "white"),
            LevelDef::new(64, "red", "white"),
            LevelDef::new(128, "bright_magenta", "white"),
            LevelDef::new(256, "magenta", "white"),
            LevelDef::new(512, "bright_blue", "white"),
            LevelDef::new(1024, "blue", "white"),
            LevelDef::new(2048, "green", "white"),
        ];
        Self { levels }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TileRegistry {
    tiles: BTreeMap<TileId, Tile>,
    next_id: u64,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, id: TileId) -> GameResult<&Tile> {
        self.tiles.get(&id).ok_or(GameError::TileNotFound { id: id.0 })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn spawn(&mut self, grid: &mut Grid, level: usize, coord: CellCoord) -> GameResult<TileId> {
        if self.tiles.len() >= grid.size() {
            return Err(GameError::GridFull);
        }
        if grid.cell_at(coord)?.is_occupied() {
            return Err(GameError::CellOccupied { x: coord.x, y: coord.y });
        }

        let id = TileId(self.next_id);
        self.next_id += 1;

        grid.set_occupant(coord, Some(id))?;
        self.tiles.insert(
            id,
            Tile {
                id,
                level,
                cell: Some(coord),
                locked: false,
            },
        );

        Ok(id)
    }

    pub fn remove(&mut self, grid: &mut Grid, id: TileId) -> GameResult<Tile> {
        let mut tile = self
            .tiles
            .remove(&id)
            .ok_or(GameError::TileNotFound { id: id.0 })?;

        if let Some(coord) = tile.cell.take() {
            if grid.occupant(coord) == Some(id) {
                grid.set_occupant(coord, None)?;
            }
        }

        Ok(tile)
    }

    pub fn move_to(&mut self, grid: &mut Grid, id: TileId, coord: CellCoord) -> GameResult<()> {
        if grid.cell_at(coord)?.is_occupied() {
            return Err(GameError::CellOccupied { x: coord.x, y: coord.y });
        }
        let tile = self
            .tiles
            .get_mut(&id)
            .ok_or(GameError::TileNotFound { id: id.0 })?;

        if let Some(previous) = tile.cell {
            grid.set_occupant(previous, None)?;
        }
        grid.set_occupant(coord, Some(id))?;
        tile.cell = Some(coord);

        Ok(())
    }

    pub fn promote(&mut self, id: TileId, level: usize) -> GameResult<&Tile> {
        let tile = self
            .tiles
            .get_mut(&id)
            .ok_or(GameError::TileNotFound { id: id.0 })?;
        tile.level = level;
        tile.locked = true;
        Ok(tile)
    }

    pub fn unlock_all(&mut self) {
        for tile in self.tiles.values_mut() {
            tile.locked = false;
        }
    }

    pub fn clear_all(&mut self, grid: &mut Grid) {
        grid.clear_occupants();
        self.tiles.clear();
    }
}
