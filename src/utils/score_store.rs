use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::utils::{GameError, GameResult};

pub const HIGH_SCORE_KEY: &str = "hiscore";

pub trait HighScoreStore {
    fn load_high_score(&self) -> GameResult<u64>;

    fn save_high_score(&mut self, score: u64) -> GameResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHighScoreStore {
    high_score: u64,
    saves: usize,
}

impl MemoryHighScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_high_score(high_score: u64) -> Self {
        Self { high_score, saves: 0 }
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn load_high_score(&self) -> GameResult<u64> {
        Ok(self.high_score)
    }

    fn save_high_score(&mut self, score: u64) -> GameResult<()> {
        self.high_score = score;
        self.saves += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HighScoreRecord {
    #[serde(rename = "hiscore")]
    high_score: u64,
    updated_at: DateTime<Utc>,
    version: String,
}

#[derive(Debug, Clone)]
pub struct FileHighScoreStore {
    path: PathBuf,
}

impl FileHighScoreStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_updated(&self) -> GameResult<Option<DateTime<Utc>>> {
        Ok(self.read_record()?.map(|record| record.updated_at))
    }

    fn read_record(&self) -> GameResult<Option<HighScoreRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| GameError::high_score(format!("Failed to read high score file: {}", e)))?;

        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| GameError::high_score(format!("Failed to parse high score file: {}", e)))?;

        if value.get(HIGH_SCORE_KEY).is_none() {
            return Err(GameError::high_score(format!(
                "High score file is missing the '{}' key",
                HIGH_SCORE_KEY
            )));
        }

        let record = serde_json::from_value(value)
            .map_err(|e| GameError::high_score(format!("Invalid high score record: {}", e)))?;

        Ok(Some(record))
    }
}

impl HighScoreStore for FileHighScoreStore {
    fn load_high_score(&self) -> GameResult<u64> {
        let high_score = self
            .read_record()?
            .map(|record| record.high_score)
            .unwrap_or(0);

        debug!("Loaded high score {} from {:?}", high_score, self.path);
        Ok(high_score)
    }

    fn save_high_score(&mut self, score: u64) -> GameResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    GameError::high_score(format!("Failed to create high score directory: {}", e))
                })?;
            }
        }

        let record = HighScoreRecord {
            high_score: score,
            updated_at: Utc::now(),
            version: crate::VERSION.to_string(),
        };

        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| GameError::high_score(format!("Failed to serialize high score: {}", e)))?;

        std::fs::write(&self.path, json)
            .map_err(|e| GameError::high_score(format!("Failed to write high score file: {}", e)))?;

        info!("New high score saved: {}", score);
        Ok(())
    }
}
