use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tile_merge::config::CliConfig;
use tile_merge::{Config, GameInterface, VERSION};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tile-merge")]
#[command(about = "A 2048-style tile merging puzzle for the terminal")]
#[command(version = VERSION)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for tile spawns, for reproducible games
    #[arg(short, long)]
    seed: Option<u64>,

    /// Theme to use (default, dark, light)
    #[arg(short, long)]
    theme: Option<String>,

    /// Where the high score is stored
    #[arg(long)]
    high_score_file: Option<PathBuf>,

    /// Play this many random moves without a terminal and print the result
    #[arg(long, value_name = "MOVES")]
    autoplay: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    config.merge_with_cli(CliConfig {
        seed: cli.seed,
        high_score_file: cli.high_score_file,
        log_level: None,
        debug: cli.debug,
        theme: cli.theme,
    });
    config.validate()?;

    // Logs go to stderr so they never interleave with the board.
    tracing_subscriber::fmt()
        .with_env_filter(format!("tile_merge={},warn", config.logging.level))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Tile Merge v{}", VERSION);

    let mut game_interface = GameInterface::new(config).await?;

    if let Some(moves) = cli.autoplay {
        let score = game_interface.autoplay(moves).await?;
        println!("Final score: {}", score);
        return Ok(());
    }

    if let Err(e) = game_interface.run().await {
        error!("Game error: {}", e);
        eprintln!("An error occurred: {}", e);
        std::process::exit(1);
    }

    info!("Game session ended");
    Ok(())
}
