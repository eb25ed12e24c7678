pub mod errors;
pub mod score_store;

pub use errors::{GameError, GameResult};
pub use score_store::{FileHighScoreStore, HighScoreStore, MemoryHighScoreStore, HIGH_SCORE_KEY};
