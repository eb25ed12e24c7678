pub mod events;
pub mod grid;
pub mod resolver;
pub mod session;
pub mod tiles;

pub use events::{CompositeObserver, EventLogger, GameEvent, GameEventType, GameObserver};
pub use grid::{Cell, CellCoord, Direction, Grid};
pub use resolver::{MoveOutcome, TileChange, Traversal};
pub use session::{BoardSnapshot, GameSession, MoveResult, MoveSummary, SessionState, SettleReport};
pub use tiles::{LevelDef, LevelSequence, Tile, TileId, TileRegistry};
