use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::grid::CellCoord;
use crate::core::tiles::{Tile, TileId};

pub trait GameObserver {
    fn on_game_started(&mut self, _game_id: Uuid) {}

    fn on_tile_spawned(&mut self, _tile: &Tile, _cell: CellCoord) {}

    fn on_tile_moved(&mut self, _tile: &Tile, _from: CellCoord, _to: CellCoord) {}

    fn on_tile_merged(&mut self, _survivor: &Tile, _removed: TileId, _new_level: usize) {}

    fn on_score_changed(&mut self, _score: u64, _high_score: u64) {}

    fn on_game_over(&mut self, _final_score: u64) {}
}

impl GameObserver for () {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: Uuid,
    pub event_type: GameEventType,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventType {
    GameStarted,
    TileSpawned,
    TileMoved,
    TileMerged,
    ScoreChanged,
    GameOver,
}

impl GameEvent {
    pub fn new(event_type: GameEventType, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            timestamp: Utc::now(),
            data,
        }
    }

    pub fn game_started(game_id: Uuid) -> Self {
        let data = serde_json::json!({
            "game_id": game_id
        });
        Self::new(GameEventType::GameStarted, data)
    }

    pub fn tile_spawned(tile: &Tile, cell: CellCoord) -> Self {
        let data = serde_json::json!({
            "tile": tile.id,
            "level": tile.level,
            "x": cell.x,
            "y": cell.y
        });
        Self::new(GameEventType::TileSpawned, data)
    }

    pub fn tile_moved(tile: &Tile, from: CellCoord, to: CellCoord) -> Self {
        let data = serde_json::json!({
            "tile": tile.id,
            "from": from,
            "to": to
        });
        Self::new(GameEventType::TileMoved, data)
    }

    pub fn tile_merged(survivor: &Tile, removed: TileId, new_level: usize) -> Self {
        let data = serde_json::json!({
            "survivor": survivor.id,
            "removed": removed,
            "new_level": new_level,
            "cell": survivor.cell
        });
        Self::new(GameEventType::TileMerged, data)
    }

    pub fn score_changed(score: u64, high_score: u64) -> Self {
        let data = serde_json::json!({
            "score": score,
            "high_score": high_score
        });
        Self::new(GameEventType::ScoreChanged, data)
    }

    pub fn game_over(final_score: u64) -> Self {
        let data = serde_json::json!({
            "final_score": final_score
        });
        Self::new(GameEventType::GameOver, data)
    }
}

#[derive(Debug, Clone)]
pub struct EventLogger {
    events: Vec<GameEvent>,
    max_events: usize,
}

impl EventLogger {
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    pub fn get_events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn get_events_by_type(&self, event_type: &GameEventType) -> Vec<&GameEvent> {
        self.events
            .iter()
            .filter(|event| &event.event_type == event_type)
            .collect()
    }

    pub fn get_recent_events(&self, count: usize) -> Vec<&GameEvent> {
        self.events.iter().rev().take(count).collect()
    }

    pub fn get_event_count_by_type(&self, event_type: &GameEventType) -> usize {
        self.events
            .iter()
            .filter(|event| &event.event_type == event_type)
            .count()
    }

    pub fn get_event_count(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn export_events(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.events)
    }

    fn record(&mut self, event: GameEvent) {
        self.events.push(event);

        if self.events.len() > self.max_events {
            self.events.remove(0);
        }
    }
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl GameObserver for EventLogger {
    fn on_game_started(&mut self, game_id: Uuid) {
        self.record(GameEvent::game_started(game_id));
    }

    fn on_tile_spawned(&mut self, tile: &Tile, cell: CellCoord) {
        self.record(GameEvent::tile_spawned(tile, cell));
    }

    fn on_tile_moved(&mut self, tile: &Tile, from: CellCoord, to: CellCoord) {
        self.record(GameEvent::tile_moved(tile, from, to));
    }

    fn on_tile_merged(&mut self, survivor: &Tile, removed: TileId, new_level: usize) {
        self.record(GameEvent::tile_merged(survivor, removed, new_level));
    }

    fn on_score_changed(&mut self, score: u64, high_score: u64) {
        self.record(GameEvent::score_changed(score, high_score));
    }

    fn on_game_over(&mut self, final_score: u64) {
        self.record(GameEvent::game_over(final_score));
    }
}

// Forwards every callback to each inner observer in insertion order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Box<dyn GameObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer<O: GameObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl GameObserver for CompositeObserver {
    fn on_game_started(&mut self, game_id: Uuid) {
        for observer in &mut self.observers {
            observer.on_game_started(game_id);
        }
    }

    fn on_tile_spawned(&mut self, tile: &Tile, cell: CellCoord) {
        for observer in &mut self.observers {
            observer.on_tile_spawned(tile, cell);
        }
    }

    fn on_tile_moved(&mut self, tile: &Tile, from: CellCoord, to: CellCoord) {
        for observer in &mut self.observers {
            observer.on_tile_moved(tile, from, to);
        }
    }

    fn on_tile_merged(&mut self, survivor: &Tile, removed: TileId, new_level: usize) {
        for observer in &mut self.observers {
            observer.on_tile_merged(survivor, removed, new_level);
        }
    }

    fn on_score_changed(&mut self, score: u64, high_score: u64) {
        for observer in &mut self.observers {
            observer.on_score_changed(score, high_score);
        }
    }

    fn on_game_over(&mut self, final_score: u64) {
        for observer in &mut self.observers {
            observer.on_game_over(final_score);
        }
    }
}
