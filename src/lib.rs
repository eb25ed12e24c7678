pub mod core;
pub mod ui;
pub mod config;
pub mod utils;

pub use crate::core::{Direction, GameSession, MoveResult, SessionState};
pub use ui::GameInterface;
pub use config::Config;

// Re-export commonly used types
pub type Result<T> = anyhow::Result<T>;

// Game version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
