use console::{Key, Term};
use dialoguer::{Confirm, Select};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};

use crate::config::Config;
use crate::core::{Direction, EventLogger, GameSession, MoveResult};
use crate::ui::{Display, ThemeManager};
use crate::utils::{FileHighScoreStore, GameError, GameResult};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Restart,
    Quit,
}

pub fn key_to_command(key: &Key) -> Option<Command> {
    match key {
        Key::ArrowUp => Some(Command::Move(Direction::Up)),
        Key::ArrowDown => Some(Command::Move(Direction::Down)),
        Key::ArrowLeft => Some(Command::Move(Direction::Left)),
        Key::ArrowRight => Some(Command::Move(Direction::Right)),
        Key::Escape => Some(Command::Quit),
        Key::Char(c) => match c.to_ascii_lowercase() {
            'q' => Some(Command::Quit),
            'r' => Some(Command::Restart),
            other => other.to_string().parse().ok().map(Command::Move),
        },
        _ => None,
    }
}

pub struct GameInterface {
    session: GameSession<EventLogger>,
    display: Display,
    config: Config,
    last_merge: Option<usize>,
}

impl GameInterface {
    pub async fn new(config: Config) -> GameResult<Self> {
        info!("Initializing game interface");

        let theme_manager = ThemeManager::new();
        let mut display = Display::new(theme_manager, config.ui.cell_width)
            .map_err(|e| GameError::configuration(format!("Failed to create display: {}", e)))?;

        if !display.set_theme(&config.ui.theme) {
            let available = display.get_available_themes().join(", ");
            warn!(
                "Unknown theme '{}', using default (available: {})",
                config.ui.theme,
                available
            );
        }

        let store = FileHighScoreStore::new(&config.paths.high_score_file);
        let session = GameSession::new(&config, Box::new(store), EventLogger::default())?;

        Ok(Self {
            session,
            display,
            config,
            last_merge: None,
        })
    }

    pub async fn run(&mut self) -> GameResult<()> {
        info!("Starting game interface");

        loop {
            match self.show_main_menu().await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!("Main menu error: {}", e);
                    self.display.show_error(&e.to_string()).ok();
                    self.display.wait_for_enter().ok();
                }
            }
        }

        self.display.show_success("Thanks for playing!").ok();
        Ok(())
    }

    pub async fn show_main_menu(&mut self) -> GameResult<bool> {
        self.display.clear_screen().ok();
        self.show_game_title()?;

        let choices = vec!["Start New Game", "View High Score", "Exit"];

        let selection = Select::new()
            .with_prompt("What would you like to do?")
            .items(&choices)
            .default(0)
            .interact()
            .map_err(|e| GameError::interface(format!("Menu selection error: {}", e)))?;

        match selection {
            0 => self.play().await?,
            1 => self.show_high_score()?,
            2 => return Ok(false),
            _ => unreachable!(),
        }

        Ok(true)
    }

    fn show_game_title(&self) -> GameResult<()> {
        let title = format!("T I L E   M E R G E   v{}", crate::VERSION);
        self.display.show_title(&title)?;
        self.display.show_separator(title.len())?;
        Ok(())
    }

    fn show_high_score(&self) -> GameResult<()> {
        self.display
            .show_message(&format!("Best score: {}", self.session.high_score()), "high_score")?;
        self.display.wait_for_enter()?;
        Ok(())
    }

    pub async fn play(&mut self) -> GameResult<()> {
        self.restart()?;

        loop {
            self.render()?;

            if self.session.is_game_over() {
                sleep(self.config.game_over_delay()).await;
                self.display.show_game_over(self.session.score())?;

                let again = Confirm::new()
                    .with_prompt("Play again?")
                    .default(true)
                    .interact()
                    .map_err(|e| GameError::interface(format!("Confirmation error: {}", e)))?;

                if again {
                    self.restart()?;
                    continue;
                }
                return Ok(());
            }

            let key = read_key().await?;
            match key_to_command(&key) {
                Some(Command::Move(direction)) => {
                    if self.apply_move(direction)? {
                        self.settle().await?;
                    }
                }
                Some(Command::Restart) => self.restart()?,
                Some(Command::Quit) => return Ok(()),
                None => {
                    debug!("Ignoring key {:?}", key);
                    self.last_merge = None;
                }
            }
        }
    }

    fn restart(&mut self) -> GameResult<()> {
        self.last_merge = None;
        self.session.new_game()
    }

    // Returns whether the board changed; remembers the move's best merge for the banner.
    fn apply_move(&mut self, direction: Direction) -> GameResult<bool> {
        self.last_merge = None;
        match self.session.submit_move(direction)? {
            MoveResult::Changed(summary) => {
                self.last_merge = summary.best_merge;
                Ok(true)
            }
            MoveResult::NoOp | MoveResult::Rejected(_) => Ok(false),
        }
    }

    async fn settle(&mut self) -> GameResult<()> {
        let mut frames = interval(self.config.frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = Instant::now();

        while !self.session.is_accepting_input() && !self.session.is_game_over() {
            frames.tick().await;
            let now = Instant::now();
            self.session.tick(now - last)?;
            last = now;
        }

        Ok(())
    }

    fn render(&self) -> GameResult<()> {
        self.display.clear_screen().ok();
        self.show_game_title()?;
        self.display.show_scores(
            self.session.score(),
            self.session.high_score(),
            self.session.moves(),
        )?;
        self.display
            .show_board(&self.session.snapshot(), self.session.levels())?;

        if let Some(level) = self.last_merge {
            if let Ok(value) = self.session.levels().value(level) {
                self.display.show_success(&format!("  Merged into {}!", value))?;
            }
        }

        self.display.show_controls()?;
        Ok(())
    }

    pub async fn autoplay(&mut self, max_moves: usize) -> GameResult<u64> {
        let mut rng = match self.config.board.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ 0x5eed),
            None => StdRng::from_entropy(),
        };

        self.session.new_game()?;
        let settle_step = self.config.settle_delay();

        for _ in 0..max_moves {
            if self.session.is_game_over() {
                break;
            }

            let mut directions = Direction::ALL;
            directions.shuffle(&mut rng);

            let mut moved = false;
            for direction in directions {
                if let MoveResult::Changed(summary) = self.session.submit_move(direction)? {
                    debug!("Autoplay {}: +{} points", summary.direction, summary.points);
                    self.session.tick(settle_step)?;
                    moved = true;
                    break;
                }
            }

            if !moved {
                break;
            }
        }

        self.display
            .show_board(&self.session.snapshot(), self.session.levels())?;
        self.display.show_scores(
            self.session.score(),
            self.session.high_score(),
            self.session.moves(),
        )?;

        info!(
            "Autoplay finished after {} moves with score {}",
            self.session.moves(),
            self.session.score()
        );
        Ok(self.session.score())
    }

    pub fn session(&self) -> &GameSession<EventLogger> {
        &self.session
    }
}

async fn read_key() -> GameResult<Key> {
    tokio::task::spawn_blocking(|| Term::stdout().read_key())
        .await
        .map_err(|e| GameError::interface(format!("Input task failed: {}", e)))?
        .map_err(GameError::from)
}
