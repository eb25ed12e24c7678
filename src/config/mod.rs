use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::{LevelDef, LevelSequence};
use crate::utils::{GameError, GameResult};

pub const ENV_PREFIX: &str = "TILE_MERGE";

const MAX_DIMENSION: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub board: BoardConfig,
    pub timing: TimingConfig,
    pub ui: UiConfig,
    pub paths: PathConfig,
    pub logging: LoggingConfig,
    pub levels: Vec<LevelDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    pub starting_tiles: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub settle_delay_ms: u64,
    pub frame_rate_hz: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub theme: String,
    pub cell_width: usize,
    pub game_over_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub high_score_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            board: BoardConfig {
                width: 4,
                height: 4,
                starting_tiles: 2,
                seed: None,
            },
            timing: TimingConfig {
                settle_delay_ms: 100,
                frame_rate_hz: 60,
            },
            ui: UiConfig {
                theme: "default".to_string(),
                cell_width: 6,
                game_over_delay_ms: 1000,
            },
            paths: PathConfig {
                high_score_file: PathBuf::from("./assets/hiscore.json"),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            levels: LevelSequence::default().iter().cloned().collect(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> GameResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            // Create default config file
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GameError::configuration(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| GameError::configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    pub fn load(path: Option<&Path>) -> GameResult<Self> {
        let defaults = toml::to_string(&Self::default())?;

        let mut builder = ::config::Config::builder()
            .add_source(::config::File::from_str(&defaults, ::config::FileFormat::Toml));

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        let settings = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> GameResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GameError::configuration(format!("Failed to create config directory: {}", e)))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .map_err(|e| GameError::configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_content)
            .map_err(|e| GameError::configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> GameResult<()> {
        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => return Err(GameError::configuration("Invalid logging level")),
        }

        let board = &self.board;
        if board.width == 0 || board.height == 0 {
            return Err(GameError::configuration("Board dimensions must be at least 1"));
        }
        if board.width > MAX_DIMENSION || board.height > MAX_DIMENSION {
            return Err(GameError::configuration(format!(
                "Board dimensions cannot exceed {}",
                MAX_DIMENSION
            )));
        }
        if board.starting_tiles > board.width * board.height {
            return Err(GameError::configuration("Starting tiles cannot exceed the number of cells"));
        }

        if self.levels.is_empty() {
            return Err(GameError::configuration("At least one tile level must be defined"));
        }
        if self.timing.frame_rate_hz == 0 {
            return Err(GameError::configuration("Frame rate must be greater than 0"));
        }
        if self.ui.cell_width < 3 {
            return Err(GameError::configuration("Cell width must be at least 3"));
        }
        if self.paths.high_score_file.as_os_str().is_empty() {
            return Err(GameError::configuration("High score file path cannot be empty"));
        }

        Ok(())
    }

    pub fn merge_with_cli(&mut self, cli_config: CliConfig) {
        if let Some(seed) = cli_config.seed {
            self.board.seed = Some(seed);
        }
        if let Some(high_score_file) = cli_config.high_score_file {
            self.paths.high_score_file = high_score_file;
        }
        if let Some(log_level) = cli_config.log_level {
            self.logging.level = log_level;
        }
        if cli_config.debug {
            self.logging.level = "debug".to_string();
        }
        if let Some(theme) = cli_config.theme {
            self.ui.theme = theme;
        }
    }

    pub fn level_sequence(&self) -> GameResult<LevelSequence> {
        LevelSequence::new(self.levels.clone())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.timing.settle_delay_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.timing.frame_rate_hz.max(1)))
    }

    pub fn game_over_delay(&self) -> Duration {
        Duration::from_millis(self.ui.game_over_delay_ms)
    }
}

// Configuration that can be overridden by CLI arguments
#[derive(Debug, Default)]
pub struct CliConfig {
    pub seed: Option<u64>,
    pub high_score_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub debug: bool,
    pub theme: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.board.width, 4);
        assert_eq!(config.board.height, 4);
        assert_eq!(config.board.starting_tiles, 2);
        assert_eq!(config.timing.settle_delay_ms, 100);
        assert_eq!(config.levels.len(), 11);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.board.width = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.board.starting_tiles = 17;
        assert!(config.validate().is_err());

        config = Config::default();
        config.levels.clear();
        assert!(config.validate().is_err());

        config = Config::default();
        config.timing.frame_rate_hz = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut original_config = Config::default();
        original_config.board.seed = Some(42);
        original_config.save_to_file(&config_path).unwrap();

        let loaded_config = Config::from_file(&config_path).unwrap();

        assert_eq!(loaded_config.board.seed, Some(42));
        assert_eq!(loaded_config.levels, original_config.levels);
        assert_eq!(loaded_config.ui.theme, original_config.ui.theme);
    }

    #[test]
    fn test_from_file_writes_defaults_when_missing() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config").join("tile-merge.toml");

        let config = Config::from_file(&config_path).unwrap();

        assert!(config_path.exists());
        assert_eq!(config.board.width, 4);
    }

    #[test]
    fn test_layered_load_overrides_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            "[board]\nwidth = 5\nheight = 3\n\n[timing]\nsettle_delay_ms = 250\n",
        )
        .unwrap();

        let config = Config::load(Some(config_path.as_path())).unwrap();

        assert_eq!(config.board.width, 5);
        assert_eq!(config.board.height, 3);
        assert_eq!(config.board.starting_tiles, 2);
        assert_eq!(config.settle_delay(), Duration::from_millis(250));
        assert_eq!(config.levels.len(), 11);
    }

    #[test]
    fn test_layered_load_without_file() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("absent.toml");

        let config = Config::load(Some(missing.as_path())).unwrap();
        assert_eq!(config.board.width, 4);
    }

    #[test]
    fn test_cli_config_merge() {
        let mut config = Config::default();
        let cli_config = CliConfig {
            seed: Some(7),
            log_level: Some("debug".to_string()),
            theme: Some("dark".to_string()),
            ..Default::default()
        };

        config.merge_with_cli(cli_config);

        assert_eq!(config.board.seed, Some(7));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.ui.theme, "dark");
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.settle_delay(), Duration::from_millis(100));
        assert_eq!(config.game_over_delay(), Duration::from_secs(1));
        assert!(config.frame_interval() < Duration::from_millis(17));
    }
}
