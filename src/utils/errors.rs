use thiserror::Error;

pub type GameResult<T> = Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: isize,
        y: isize,
        width: usize,
        height: usize,
    },

    #[error("Grid is full: no empty cell to spawn into")]
    GridFull,

    #[error("Cell ({x}, {y}) is already occupied")]
    CellOccupied { x: usize, y: usize },

    #[error("Tile not found: {id}")]
    TileNotFound { id: u64 },

    #[error("Invalid level {level} (highest defined level is {max})")]
    InvalidLevel { level: usize, max: usize },

    #[error("Invalid direction: {input}")]
    InvalidDirection { input: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("High score error: {message}")]
    HighScore { message: String },

    #[error("Interface error: {message}")]
    Interface { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl GameError {
    pub fn out_of_bounds(x: isize, y: isize, width: usize, height: usize) -> Self {
        Self::OutOfBounds { x, y, width, height }
    }

    pub fn invalid_direction<S: Into<String>>(input: S) -> Self {
        Self::InvalidDirection {
            input: input.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn high_score<S: Into<String>>(message: S) -> Self {
        Self::HighScore {
            message: message.into(),
        }
    }

    pub fn interface<S: Into<String>>(message: S) -> Self {
        Self::Interface {
            message: message.into(),
        }
    }
}
