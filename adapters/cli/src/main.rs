#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Bomberman match in the terminal.

mod terminal;

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use bomberman_core::GameConfig;
use bomberman_system_turn_loop::Game;
use clap::Parser;
use log::LevelFilter;

use crate::terminal::{TerminalGuard, TerminalRenderer};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "bomberman", about = "Turn-based Bomberman against three AI players")]
struct CliArgs {
    /// Seed for the arena and the AI players. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// TOML file overriding the default game configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Tick period in milliseconds, overriding the configuration.
    #[arg(long, value_name = "MILLIS")]
    tick_ms: Option<u64>,
    /// File receiving the log output.
    #[arg(long, value_name = "PATH", default_value = "bomb.log")]
    log_file: PathBuf,
    /// Log level, overriding `RUST_LOG`.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LevelFilter>,
    /// Prints the effective configuration as TOML and exits.
    #[arg(long)]
    print_config: bool,
}

/// Entry point for the Bomberman command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = match args.config.as_deref() {
        Some(path) => load_config(path)?,
        None => GameConfig::default(),
    };
    if let Some(tick_ms) = args.tick_ms {
        config.tick_millis = tick_ms;
    }

    if args.print_config {
        print!(
            "{}",
            toml::to_string(&config).context("failed to serialize configuration")?
        );
        return Ok(());
    }

    init_logging(&args.log_file, args.log_level)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("seed {seed}, tick period {:?}", config.tick_period());

    let mut game = Game::standard(config, seed).context("failed to set up the match")?;
    let (events_tx, events) = crossbeam_channel::unbounded();

    let outcome = {
        let _guard = TerminalGuard::enter().context("failed to prepare the terminal")?;
        terminal::spawn_input_pump(events_tx).context("failed to start the input thread")?;
        let mut renderer = TerminalRenderer::new();
        game.run(&events, &mut renderer)
    };
    let outcome = outcome.context("game aborted on a broken invariant")?;

    println!("{outcome}");
    Ok(())
}

fn load_config(path: &Path) -> Result<GameConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid configuration {}", path.display()))
}

fn parse_config(text: &str) -> Result<GameConfig> {
    Ok(toml::from_str(text)?)
}

fn init_logging(path: &Path, level: Option<LevelFilter>) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let _ = builder.target(env_logger::Target::Pipe(Box::new(file)));
    if let Some(level) = level {
        let _ = builder.filter_level(level);
    }
    builder.try_init().context("failed to install the logger")
}
