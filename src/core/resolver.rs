use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::grid::{CellCoord, Direction, Grid};
use crate::core::tiles::{LevelSequence, Tile, TileId, TileRegistry};
use crate::utils::GameResult;

// Starts beside the edge tiles move toward and steps away from it, so each
// tile lands before the one behind it is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Traversal {
    pub start_x: isize,
    pub step_x: isize,
    pub start_y: isize,
    pub step_y: isize,
}

impl Traversal {
    pub fn for_direction(direction: Direction, width: usize, height: usize) -> Self {
        let width = width as isize;
        let height = height as isize;

        match direction {
            Direction::Up => Self { start_x: 0, step_x: 1, start_y: 1, step_y: 1 },
            Direction::Down => Self { start_x: 0, step_x: 1, start_y: height - 2, step_y: -1 },
            Direction::Left => Self { start_x: 1, step_x: 1, start_y: 0, step_y: 1 },
            Direction::Right => Self { start_x: width - 2, step_x: -1, start_y: 0, step_y: 1 },
        }
    }

    pub fn coords(&self, width: usize, height: usize) -> Vec<CellCoord> {
        let in_range = |value: isize, limit: usize| value >= 0 && (value as usize) < limit;
        let mut coords = Vec::new();

        let mut x = self.start_x;
        while in_range(x, width) {
            let mut y = self.start_y;
            while in_range(y, height) {
                coords.push(CellCoord::new(x as usize, y as usize));
                y += self.step_y;
            }
            x += self.step_x;
        }

        coords
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileChange {
    Moved {
        tile: TileId,
        from: CellCoord,
        to: CellCoord,
    },
    Merged {
        survivor: TileId,
        absorbed: TileId,
        from: CellCoord,
        into: CellCoord,
        new_level: usize,
        points: u64,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub changes: Vec<TileChange>,
    pub points: u64,
}

impl MoveOutcome {
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn merge_count(&self) -> usize {
        self.changes
            .iter()
            .filter(|change| matches!(change, TileChange::Merged { .. }))
            .count()
    }

    pub fn move_count(&self) -> usize {
        self.changes.len() - self.merge_count()
    }
}

pub fn can_merge(moving: &Tile, target: &Tile, levels: &LevelSequence) -> bool {
    moving.level == target.level && !target.locked && levels.next(target.level).is_some()
}

pub fn resolve(
    grid: &mut Grid,
    registry: &mut TileRegistry,
    levels: &LevelSequence,
    direction: Direction,
) -> GameResult<MoveOutcome> {
    let mut outcome = MoveOutcome::default();
    let traversal = Traversal::for_direction(direction, grid.width(), grid.height());

    for coord in traversal.coords(grid.width(), grid.height()) {
        if let Some(id) = grid.occupant(coord) {
            if let Some(change) = move_tile(grid, registry, levels, id, direction)? {
                if let TileChange::Merged { points, .. } = &change {
                    outcome.points += points;
                }
                outcome.changes.push(change);
            }
        }
    }

    debug!(
        "Resolved move {}: {} moved, {} merged, {} points",
        direction,
        outcome.move_count(),
        outcome.merge_count(),
        outcome.points
    );

    Ok(outcome)
}

fn move_tile(
    grid: &mut Grid,
    registry: &mut TileRegistry,
    levels: &LevelSequence,
    id: TileId,
    direction: Direction,
) -> GameResult<Option<TileChange>> {
    let tile = registry.get(id)?.clone();
    let Some(origin) = tile.cell else {
        return Ok(None);
    };

    let mut destination = None;
    let mut next = grid.adjacent(origin, direction);

    while let Some(coord) = next {
        if let Some(other_id) = grid.occupant(coord) {
            let target = registry.get(other_id)?;
            if can_merge(&tile, target, levels) {
                return merge_tiles(grid, registry, levels, id, other_id, origin, coord).map(Some);
            }
            break;
        }

        destination = Some(coord);
        next = grid.adjacent(coord, direction);
    }

    match destination {
        Some(to) => {
            registry.move_to(grid, id, to)?;
            Ok(Some(TileChange::Moved { tile: id, from: origin, to }))
        }
        None => Ok(None),
    }
}

fn merge_tiles(
    grid: &mut Grid,
    registry: &mut TileRegistry,
    levels: &LevelSequence,
    absorbed: TileId,
    survivor: TileId,
    from: CellCoord,
    into: CellCoord,
) -> GameResult<TileChange> {
    let current = registry.get(survivor)?.level;
    let new_level = levels.next(current).unwrap_or(current);
    let points = u64::from(levels.value(new_level)?);

    registry.remove(grid, absorbed)?;
    registry.promote(survivor, new_level)?;

    Ok(TileChange::Merged {
        survivor,
        absorbed,
        from,
        into,
        new_level,
        points,
    })
}

pub fn has_available_merge(grid: &Grid, registry: &TileRegistry, levels: &LevelSequence) -> bool {
    registry.iter().any(|tile| {
        let Some(coord) = tile.cell else {
            return false;
        };
        Direction::ALL.iter().any(|&direction| {
            grid.adjacent(coord, direction)
                .and_then(|neighbour| grid.occupant(neighbour))
                .and_then(|other| registry.get(other).ok())
                .map(|other| can_merge(tile, other, levels))
                .unwrap_or(false)
        })
    })
}
