use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::core::events::GameObserver;
use crate::core::grid::{CellCoord, Direction, Grid};
use crate::core::resolver::{self, MoveOutcome, TileChange};
use crate::core::tiles::{LevelSequence, TileId, TileRegistry};
use crate::utils::{GameError, GameResult, HighScoreStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Ready,
    Settling { remaining: Duration },
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveResult {
    Rejected(SessionState),
    NoOp,
    Changed(MoveSummary),
}

impl MoveResult {
    pub fn is_changed(&self) -> bool {
        matches!(self, MoveResult::Changed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSummary {
    pub direction: Direction,
    pub moved: usize,
    pub merged: usize,
    pub points: u64,
    pub best_merge: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleReport {
    pub spawned: Option<TileId>,
    pub game_over: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Option<usize>>,
}

impl BoardSnapshot {
    pub fn level_at(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[y * self.width + x]
    }

    pub fn rows(&self) -> Vec<Vec<Option<usize>>> {
        self.cells.chunks(self.width).map(<[_]>::to_vec).collect()
    }
}

pub struct GameSession<O: GameObserver> {
    grid: Grid,
    tiles: TileRegistry,
    levels: LevelSequence,
    state: SessionState,
    score: u64,
    high_score: u64,
    saved_high_score: u64,
    moves: u64,
    game_id: Uuid,
    settle_delay: Duration,
    starting_tiles: usize,
    rng: StdRng,
    store: Box<dyn HighScoreStore>,
    observer: O,
}

impl<O: GameObserver> GameSession<O> {
    pub fn new(config: &Config, store: Box<dyn HighScoreStore>, observer: O) -> GameResult<Self> {
        config.validate()?;

        let rng = match config.board.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let high_score = store.load_high_score()?;

        Ok(Self {
            grid: Grid::new(config.board.width, config.board.height)?,
            tiles: TileRegistry::new(),
            levels: config.level_sequence()?,
            state: SessionState::Ready,
            score: 0,
            high_score,
            saved_high_score: high_score,
            moves: 0,
            game_id: Uuid::new_v4(),
            settle_delay: config.settle_delay(),
            starting_tiles: config.board.starting_tiles,
            rng,
            store,
            observer,
        })
    }

    pub fn new_game(&mut self) -> GameResult<()> {
        self.score = 0;
        self.moves = 0;
        self.game_id = Uuid::new_v4();
        self.high_score = self.store.load_high_score()?;
        self.saved_high_score = self.high_score;
        self.tiles.clear_all(&mut self.grid);

        info!(
            "Starting new game {} on a {}x{} board (high score {})",
            self.game_id,
            self.grid.width(),
            self.grid.height(),
            self.high_score
        );
        self.observer.on_game_started(self.game_id);
        self.observer.on_score_changed(self.score, self.high_score);

        for _ in 0..self.starting_tiles {
            self.spawn_tile()?;
        }

        self.state = SessionState::Ready;
        Ok(())
    }

    pub fn submit_move(&mut self, direction: Direction) -> GameResult<MoveResult> {
        if self.state != SessionState::Ready {
            debug!("Ignoring move {} while {:?}", direction, self.state);
            return Ok(MoveResult::Rejected(self.state));
        }

        let outcome = resolver::resolve(&mut self.grid, &mut self.tiles, &self.levels, direction)?;
        if !outcome.changed() {
            return Ok(MoveResult::NoOp);
        }

        self.moves += 1;
        self.state = SessionState::Settling {
            remaining: self.settle_delay,
        };

        let summary = MoveSummary {
            direction,
            moved: outcome.move_count(),
            merged: outcome.merge_count(),
            points: outcome.points,
            best_merge: outcome
                .changes
                .iter()
                .filter_map(|change| match change {
                    TileChange::Merged { new_level, .. } => Some(*new_level),
                    TileChange::Moved { .. } => None,
                })
                .max(),
        };
        self.report_changes(&outcome)?;

        Ok(MoveResult::Changed(summary))
    }

    pub fn tick(&mut self, elapsed: Duration) -> GameResult<Option<SettleReport>> {
        let SessionState::Settling { remaining } = self.state else {
            return Ok(None);
        };

        let remaining = remaining.saturating_sub(elapsed);
        if !remaining.is_zero() {
            self.state = SessionState::Settling { remaining };
            return Ok(None);
        }

        self.settle().map(Some)
    }

    pub fn is_accepting_input(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn is_game_over(&self) -> bool {
        self.state == SessionState::GameOver
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }

    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tiles(&self) -> &TileRegistry {
        &self.tiles
    }

    pub fn levels(&self) -> &LevelSequence {
        &self.levels
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let cells = self
            .grid
            .cells()
            .iter()
            .map(|cell| {
                cell.occupant()
                    .and_then(|id| self.tiles.get(id).ok())
                    .map(|tile| tile.level)
            })
            .collect();

        BoardSnapshot {
            width: self.grid.width(),
            height: self.grid.height(),
            cells,
        }
    }

    pub fn restore_board(&mut self, rows: &[Vec<Option<usize>>]) -> GameResult<()> {
        if rows.len() != self.grid.height() || rows.iter().any(|row| row.len() != self.grid.width()) {
            return Err(GameError::configuration(format!(
                "Board layout must be {}x{}",
                self.grid.width(),
                self.grid.height()
            )));
        }
        for level in rows.iter().flatten().flatten() {
            self.levels.get(*level)?;
        }

        self.tiles.clear_all(&mut self.grid);
        for (y, row) in rows.iter().enumerate() {
            for (x, level) in row.iter().enumerate() {
                if let Some(level) = level {
                    self.tiles.spawn(&mut self.grid, *level, CellCoord::new(x, y))?;
                }
            }
        }

        self.state = if self.check_game_over() {
            SessionState::GameOver
        } else {
            SessionState::Ready
        };
        Ok(())
    }

    fn report_changes(&mut self, outcome: &MoveOutcome) -> GameResult<()> {
        for change in &outcome.changes {
            match change {
                TileChange::Moved { tile, from, to } => {
                    let tile = self.tiles.get(*tile)?;
                    self.observer.on_tile_moved(tile, *from, *to);
                }
                TileChange::Merged {
                    survivor,
                    absorbed,
                    new_level,
                    points,
                    ..
                } => {
                    let tile = self.tiles.get(*survivor)?;
                    debug!("Tile {} absorbed {} -> level {}", survivor, absorbed, new_level);
                    self.observer.on_tile_merged(tile, *absorbed, *new_level);
                    self.increase_score(*points);
                }
            }
        }

        self.persist_high_score()
    }

    fn increase_score(&mut self, points: u64) {
        self.score += points;
        self.high_score = self.high_score.max(self.score);
        self.observer.on_score_changed(self.score, self.high_score);
    }

    // A failed write leaves the new best unsaved; the next scoring move retries it.
    fn persist_high_score(&mut self) -> GameResult<()> {
        if self.high_score > self.saved_high_score {
            self.store.save_high_score(self.high_score)?;
            self.saved_high_score = self.high_score;
        }
        Ok(())
    }

    fn settle(&mut self) -> GameResult<SettleReport> {
        self.tiles.unlock_all();

        let spawned = if self.tiles.len() < self.grid.size() {
            Some(self.spawn_tile()?)
        } else {
            None
        };

        let game_over = self.check_game_over();
        if game_over {
            self.state = SessionState::GameOver;
            info!("Game over after {} moves with score {}", self.moves, self.score);
            self.observer.on_game_over(self.score);
        } else {
            self.state = SessionState::Ready;
        }

        Ok(SettleReport { spawned, game_over })
    }

    fn spawn_tile(&mut self) -> GameResult<TileId> {
        let coord = self.grid.random_empty_cell(&mut self.rng)?;
        let id = self.tiles.spawn(&mut self.grid, 0, coord)?;

        debug!("Spawned tile {} at {}", id, coord);
        let tile = self.tiles.get(id)?;
        self.observer.on_tile_spawned(tile, coord);
        Ok(id)
    }

    fn check_game_over(&self) -> bool {
        self.tiles.len() == self.grid.size()
            && !resolver::has_available_merge(&self.grid, &self.tiles, &self.levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{EventLogger, GameEventType};
    use crate::utils::MemoryHighScoreStore;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    struct FlakyStore {
        saved: u64,
        failures: usize,
    }

    impl HighScoreStore for FlakyStore {
        fn load_high_score(&self) -> GameResult<u64> {
            Ok(self.saved)
        }

        fn save_high_score(&mut self, score: u64) -> GameResult<()> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(GameError::high_score("disk full"));
            }
            self.saved = score;
            Ok(())
        }
    }

    fn seeded_config(seed: u64) -> Config {
        let mut config = Config::default();
        config.board.seed = Some(seed);
        config
    }

    fn session(seed: u64) -> GameSession<EventLogger> {
        GameSession::new(
            &seeded_config(seed),
            Box::new(MemoryHighScoreStore::new()),
            EventLogger::default(),
        )
        .unwrap()
    }

    fn settle(session: &mut GameSession<EventLogger>) -> SettleReport {
        session.tick(Duration::from_millis(100)).unwrap().unwrap()
    }

    fn rows(layout: &[[Option<usize>; 4]; 4]) -> Vec<Vec<Option<usize>>> {
        layout.iter().map(|row| row.to_vec()).collect()
    }

    fn assert_consistent(session: &GameSession<EventLogger>) {
        let grid = session.grid();
        let tiles = session.tiles();
        assert!(tiles.len() <= grid.size());

        let occupied = grid.cells().iter().filter(|cell| cell.is_occupied()).count();
        assert_eq!(occupied, tiles.len());

        for tile in tiles.iter() {
            let coord = tile.cell.expect("live tile without a cell");
            assert_eq!(grid.occupant(coord), Some(tile.id));
        }
    }

    #[test]
    fn test_new_game_spawns_two_tiles() {
        let mut session = session(1);
        session.new_game().unwrap();

        assert_eq!(session.tile_count(), 2);
        assert_eq!(session.score(), 0);
        assert!(session.is_accepting_input());
        assert!(!session.is_game_over());
        assert!(session.tiles().iter().all(|tile| tile.level == 0));
        assert_consistent(&session);

        let logger = session.observer();
        assert_eq!(logger.get_event_count_by_type(&GameEventType::GameStarted), 1);
        assert_eq!(logger.get_event_count_by_type(&GameEventType::TileSpawned), 2);
    }

    #[test]
    fn test_new_game_resets_previous_board() {
        let mut session = session(2);
        session.new_game().unwrap();
        let first_game = session.game_id();

        session
            .restore_board(&rows(&[
                [Some(1), Some(1), None, None],
                [None, None, None, None],
                [None, None, None, None],
                [None, None, None, None],
            ]))
            .unwrap();
        session.submit_move(Direction::Left).unwrap();
        assert_eq!(session.score(), 8);

        session.new_game().unwrap();
        assert_eq!(session.score(), 0);
        assert_eq!(session.tile_count(), 2);
        assert_ne!(session.game_id(), first_game);
        assert!(session.is_accepting_input());
    }

    #[test]
    fn test_noop_move_changes_nothing() {
        let mut session = session(3);
        session
            .restore_board(&rows(&[
                [Some(0), Some(1), None, None],
                [None, None, None, None],
                [None, None, None, None],
                [None, None, None, None],
            ]))
            .unwrap();
        let before = session.snapshot();

        let result = session.submit_move(Direction::Left).unwrap();
        assert_eq!(result, MoveResult::NoOp);
        assert_eq!(session.snapshot(), before);
        assert!(session.is_accepting_input());
        assert_eq!(session.moves(), 0);
        assert_eq!(session.tick(Duration::from_secs(1)).unwrap(), None);
    }

    #[test]
    fn test_move_settles_after_delay() {
        let mut session = session(4);
        session
            .restore_board(&rows(&[
                [None, None, None, Some(0)],
                [None, None, None, None],
                [None, None, None, None],
                [None, None, None, None],
            ]))
            .unwrap();

        let result = session.submit_move(Direction::Left).unwrap();
        assert!(result.is_changed());
        assert!(!session.is_accepting_input());

        // Further input is rejected while settling.
        assert!(matches!(
            session.submit_move(Direction::Right).unwrap(),
            MoveResult::Rejected(SessionState::Settling { .. })
        ));

        assert_eq!(session.tick(Duration::from_millis(60)).unwrap(), None);
        assert_eq!(session.tile_count(), 1);

        let report = session.tick(Duration::from_millis(60)).unwrap().unwrap();
        assert!(report.spawned.is_some());
        assert!(!report.game_over);
        assert_eq!(session.tile_count(), 2);
        assert!(session.is_accepting_input());
        assert_eq!(session.snapshot().level_at(0, 0), Some(0));
    }

    #[test]
    fn test_merge_scores_once_and_unlocks_on_settle() {
        let mut session = session(5);
        session
            .restore_board(&rows(&[
                [Some(0), Some(0), Some(0), None],
                [None, None, None, None],
                [None, None, None, None],
                [None, None, None, None],
            ]))
            .unwrap();

        let result = session.submit_move(Direction::Right).unwrap();
        let MoveResult::Changed(summary) = result else {
            panic!("expected a changed move");
        };
        assert_eq!(summary.merged, 1);
        assert_eq!(summary.points, 4);
        assert_eq!(summary.best_merge, Some(1));
        assert_eq!(session.score(), 4);
        assert!(session.tiles().iter().any(|tile| tile.locked));

        settle(&mut session);
        assert!(session.tiles().iter().all(|tile| !tile.locked));
        assert_consistent(&session);
    }

    #[test]
    fn test_game_over_detection() {
        let mut session = session(6);
        let stuck = [
            [Some(0), Some(1), Some(0), Some(1)],
            [Some(1), Some(0), Some(1), Some(0)],
            [Some(0), Some(1), Some(0), Some(1)],
            [Some(1), Some(0), Some(1), Some(0)],
        ];
        session.restore_board(&rows(&stuck)).unwrap();
        assert!(session.is_game_over());
        assert!(matches!(
            session.submit_move(Direction::Up).unwrap(),
            MoveResult::Rejected(SessionState::GameOver)
        ));

        let mut playable = stuck;
        playable[3][3] = Some(1);
        session.restore_board(&rows(&playable)).unwrap();
        assert!(!session.is_game_over());
        assert!(session.is_accepting_input());
    }

    #[test]
    fn test_last_move_ends_game() {
        let mut session = session(7);
        // The only pair left merges; the spawn fills the freed corner and
        // nothing on the board can merge afterwards.
        session
            .restore_board(&rows(&[
                [Some(2), Some(3), Some(2), Some(3)],
                [Some(3), Some(2), Some(3), Some(2)],
                [Some(2), Some(3), Some(2), Some(3)],
                [Some(4), Some(4), Some(6), Some(5)],
            ]))
            .unwrap();

        let result = session.submit_move(Direction::Left).unwrap();
        assert!(result.is_changed());
        let report = settle(&mut session);

        assert_eq!(session.tile_count(), 16);
        assert_eq!(session.snapshot().level_at(0, 3), Some(5));
        assert_eq!(session.snapshot().level_at(3, 3), Some(0));
        assert!(report.game_over);
        assert!(session.is_game_over());
        assert_eq!(session.observer().get_event_count_by_type(&GameEventType::GameOver), 1);
    }

    #[test]
    fn test_spawning_until_full() {
        let mut session = session(8);
        let mut layout = vec![vec![Some(0); 4]; 4];
        layout[2][1] = None;
        // Alternate levels so the restored board is not already lost.
        for (y, row) in layout.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                if cell.is_some() {
                    *cell = Some((x + y) % 2 + 1);
                }
            }
        }
        session.restore_board(&layout).unwrap();
        assert_eq!(session.tile_count(), 15);

        session.spawn_tile().unwrap();
        assert_eq!(session.tile_count(), 16);
        assert!(matches!(session.spawn_tile(), Err(GameError::GridFull)));
    }

    #[test]
    fn test_high_score_write_through() {
        let mut session = GameSession::new(
            &seeded_config(9),
            Box::new(MemoryHighScoreStore::with_high_score(6)),
            EventLogger::default(),
        )
        .unwrap();
        assert_eq!(session.high_score(), 6);

        session
            .restore_board(&rows(&[
                [Some(0), Some(0), None, None],
                [None, None, None, None],
                [None, None, None, None],
                [None, None, None, None],
            ]))
            .unwrap();
        session.submit_move(Direction::Left).unwrap();
        assert_eq!(session.score(), 4);
        assert_eq!(session.high_score(), 6);
        settle(&mut session);

        session
            .restore_board(&rows(&[
                [Some(1), Some(1), None, None],
                [None, None, None, None],
                [None, None, None, None],
                [None, None, None, None],
            ]))
            .unwrap();
        session.submit_move(Direction::Left).unwrap();
        assert_eq!(session.score(), 12);
        assert_eq!(session.high_score(), 12);
        assert_eq!(session.store.load_high_score().unwrap(), 12);
    }

    #[test]
    fn test_failed_high_score_save_keeps_every_merge() {
        let mut session = GameSession::new(
            &seeded_config(12),
            Box::new(FlakyStore { saved: 0, failures: 1 }),
            EventLogger::default(),
        )
        .unwrap();
        session
            .restore_board(&rows(&[
                [Some(0), Some(0), None, None],
                [Some(1), Some(1), None, None],
                [None, None, None, None],
                [None, None, None, None],
            ]))
            .unwrap();

        let result = session.submit_move(Direction::Left);
        assert!(matches!(result, Err(GameError::HighScore { .. })));

        assert_eq!(session.score(), 12);
        assert_eq!(session.high_score(), 12);
        assert_eq!(session.store.load_high_score().unwrap(), 0);
        assert_eq!(
            session.observer().get_event_count_by_type(&GameEventType::TileMerged),
            2
        );
        assert!(matches!(session.state(), SessionState::Settling { .. }));
        assert_eq!(session.snapshot().level_at(0, 0), Some(1));
        assert_eq!(session.snapshot().level_at(0, 1), Some(2));

        settle(&mut session);
        assert!(session.is_accepting_input());

        // The next scoring move writes the unsaved best through.
        session
            .restore_board(&rows(&[
                [Some(1), Some(1), None, None],
                [None, None, None, None],
                [None, None, None, None],
                [None, None, None, None],
            ]))
            .unwrap();
        session.submit_move(Direction::Left).unwrap();
        assert_eq!(session.score(), 20);
        assert_eq!(session.store.load_high_score().unwrap(), 20);
    }

    #[test]
    fn test_restore_board_rejects_bad_layouts() {
        let mut session = session(10);
        assert!(session.restore_board(&[vec![None; 4]]).is_err());

        let mut layout = vec![vec![None; 4]; 4];
        layout[0][0] = Some(99);
        assert!(matches!(
            session.restore_board(&layout),
            Err(GameError::InvalidLevel { level: 99, .. })
        ));
    }

    #[test]
    fn test_seeded_sessions_are_deterministic() {
        let mut first = session(11);
        let mut second = session(11);
        first.new_game().unwrap();
        second.new_game().unwrap();

        for direction in [Direction::Left, Direction::Up, Direction::Right, Direction::Down] {
            first.submit_move(direction).unwrap();
            second.submit_move(direction).unwrap();
            first.tick(Duration::from_secs(1)).unwrap();
            second.tick(Duration::from_secs(1)).unwrap();
        }

        assert_eq!(first.snapshot(), second.snapshot());
        assert_eq!(first.score(), second.score());
    }

    proptest! {
        #[test]
        fn prop_invariants_hold_after_every_settle(
            seed in any::<u64>(),
            moves in prop::collection::vec(0usize..4, 1..80),
        ) {
            let mut session = session(seed);
            session.new_game().unwrap();
            let mut last_score = 0;

            for index in moves {
                let tiles_before: u64 = session
                    .tiles()
                    .iter()
                    .map(|tile| u64::from(session.levels().value(tile.level).unwrap()))
                    .sum();
                let score_before = session.score();

                let result = session.submit_move(Direction::ALL[index]).unwrap();
                if let MoveResult::Changed(summary) = &result {
                    prop_assert_eq!(session.score(), score_before + summary.points);

                    // A merge of two value-v tiles yields one 2v tile, so the
                    // board's face value is conserved through the slide.
                    let tiles_after: u64 = session
                        .tiles()
                        .iter()
                        .map(|tile| u64::from(session.levels().value(tile.level).unwrap()))
                        .sum();
                    prop_assert_eq!(tiles_after, tiles_before);

                    session.tick(Duration::from_secs(1)).unwrap();
                }

                prop_assert!(session.tiles().iter().all(|tile| !tile.locked));
                prop_assert!(session.tile_count() <= session.grid().size());
                prop_assert!(session.score() >= last_score);
                assert_consistent(&session);
                last_score = session.score();

                if session.is_game_over() {
                    break;
                }
            }
        }
    }
}
