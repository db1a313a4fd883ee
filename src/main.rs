//! Othello-Engine command line.
//!
//! ## Usage
//!
//! - `othello` / `othello play` - Play against the engine in the terminal
//! - `othello selfplay` - Let the engine play itself, optionally saving the log
//! - `othello replay <FILE>` - Replay a saved game log
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use othello_engine::board::{Board, Piece, parse_square, square_name};
use othello_engine::config::Config;
use othello_engine::constants::{DEFAULT_LEVEL, MAX_LEVEL, MIN_LEVEL};
use othello_engine::engine::{AnyEngine, LocalEngine};
use othello_engine::player::{AutomatedPlayer, PlayerSignal, shared};
use othello_engine::remote::RemoteEngine;
use othello_engine::replay::{
    LoggedMove, ReplayLog, ReplayObserver, ReplayOutcome, game_file_name, parse_game_file_name,
    record_game, replay,
};
use othello_engine::session::Session;

/// Othello-Engine: Othello rules and move search
#[derive(Parser)]
#[command(name = "othello")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with engine and player settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play against the engine in the terminal
    Play {
        /// Search strength, 1 (easy) to 4 (hard)
        #[arg(long, value_parser = level_parser())]
        level: Option<u32>,
        /// Colour you play
        #[arg(long, value_enum, default_value_t = Color::Black)]
        color: Color,
        /// Pause before the engine answers
        #[arg(long)]
        delay_ms: Option<u64>,
        /// URL of a remote search service to use instead of the local engine
        #[arg(long)]
        remote: Option<String>,
    },
    /// Let the engine play itself
    Selfplay {
        #[arg(long, default_value_t = DEFAULT_LEVEL, value_parser = level_parser())]
        black_level: u32,
        #[arg(long, default_value_t = DEFAULT_LEVEL, value_parser = level_parser())]
        white_level: u32,
        /// URL of a remote search service to use instead of the local engine
        #[arg(long)]
        remote: Option<String>,
        /// Directory to save the game log in
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replay a saved game log
    Replay {
        file: PathBuf,
    },
}

fn level_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(i64::from(MIN_LEVEL)..=i64::from(MAX_LEVEL))
}

#[derive(Copy, Clone, ValueEnum)]
enum Color {
    Black,
    White,
}

impl From<Color> for Piece {
    fn from(color: Color) -> Piece {
        match color {
            Color::Black => Piece::Black,
            Color::White => Piece::White,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Some(Commands::Play {
            level,
            color,
            delay_ms,
            remote,
        }) => {
            if let Some(level) = level {
                config.player.level = level;
            }
            if let Some(delay_ms) = delay_ms {
                config.player.response_delay_ms = delay_ms;
            }
            run_play(config, color.into(), remote).await
        }
        None => run_play(config, Piece::Black, None).await,
        Some(Commands::Selfplay {
            black_level,
            white_level,
            remote,
            out,
        }) => run_selfplay(config, [black_level, white_level], remote, out.as_deref()).await,
        Some(Commands::Replay { file }) => run_replay(&file),
    }
}

fn make_engine(config: &Config, remote: Option<String>) -> AnyEngine {
    match remote {
        Some(url) => {
            info!(%url, "using remote engine");
            AnyEngine::Remote(RemoteEngine::new(url))
        }
        None => AnyEngine::Local(LocalEngine::new(config.engine.clone())),
    }
}

async fn run_play(config: Config, human: Piece, remote: Option<String>) -> Result<()> {
    let board = shared(Board::new());
    let session = Session::new(Arc::clone(&board))
        .with_human(human)
        .with_config(config.engine.clone());
    let engine = make_engine(&config, remote);
    let (bot, mut signals) = AutomatedPlayer::spawn(
        Arc::clone(&board),
        human.opponent(),
        engine,
        config.player.clone(),
    );

    println!("You play {human}. Type `help` for commands, `sleep`/`wake` to pause the engine.\n");
    println!("{}\n", session.execute("show"));
    bot.wakeup();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                match line {
                    "sleep" => {
                        bot.sleep();
                        println!("= engine sleeping\n");
                        continue;
                    }
                    "wake" => {
                        bot.wakeup();
                        println!("= engine awake\n");
                        continue;
                    }
                    _ => {}
                }

                let response = session.execute(line);
                println!("{response}\n");
                if line.eq_ignore_ascii_case("quit") {
                    break;
                }
                if response.success && changes_turn(line) {
                    println!("{}\n", session.execute("show"));
                }
            }
            Some(signal) = signals.recv() => match signal {
                PlayerSignal::ThinkStart | PlayerSignal::ThinkEnd => {}
                PlayerSignal::Played { x, y } => {
                    println!("engine plays {}\n", square_name((x, y)));
                    println!("{}\n", session.execute("show"));
                }
                PlayerSignal::Passed => println!("engine passes, your move\n"),
                PlayerSignal::GameOver(result) => {
                    println!("{}", session.execute("score"));
                    if let Some(result) = result {
                        println!("{result}\n");
                    }
                }
                PlayerSignal::Failed(err) => {
                    warn!(error = %err, "engine failed, type `wake` to retry");
                }
            },
        }
    }

    bot.shutdown().await;
    Ok(())
}

fn changes_turn(line: &str) -> bool {
    let command = line.split_whitespace().next().unwrap_or("").to_lowercase();
    matches!(command.as_str(), "play" | "pass") || parse_square(&command).is_some()
}

async fn run_selfplay(
    config: Config,
    levels: [u32; 2],
    remote: Option<String>,
    out: Option<&Path>,
) -> Result<()> {
    let engine = make_engine(&config, remote);
    let mut board = Board::new();
    let (log, result) = record_game(&mut board, &engine, &engine, levels)
        .await
        .context("self-play failed")?;

    println!("{board}\n{result}");

    if let Some(dir) = out {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
        let name = game_file_name(board.score(), now, fastrand::u32(..1000));
        let path = dir.join(name);
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        std::fs::write(&path, serde_json::to_string(&log)?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), moves = log.len(), "game saved");
    }
    Ok(())
}

/// Prints the board after every replayed move.
struct Printer;

impl ReplayObserver for Printer {
    fn before_move(&mut self, board: &Board, entry: LoggedMove, index: usize) {
        match entry {
            Some([x, y]) => println!("{}. {} {}", index + 1, board.next_piece(), square_name((x, y))),
            None => println!("{}. {} passes", index + 1, board.next_piece()),
        }
    }

    fn after_move(&mut self, board: &Board, _entry: LoggedMove) {
        println!("{board}\n");
    }
}

fn run_replay(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let log: ReplayLog =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", file.display()))?;

    let mut board = Board::new();
    let outcome = replay(&mut board, log, &mut Printer)
        .with_context(|| format!("replaying {}", file.display()))?;

    match outcome {
        ReplayOutcome::Finished(result) => println!("{result}"),
        ReplayOutcome::Exhausted { moves } => println!("log ended after {moves} moves, game unfinished"),
    }

    let recorded = file
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(parse_game_file_name);
    if let Some(recorded) = recorded {
        if recorded != board.score() {
            warn!(
                recorded = %format!("{}v{}", recorded.black, recorded.white),
                replayed = %format!("{}v{}", board.score().black, board.score().white),
                "final score differs from the file name"
            );
        }
    }
    Ok(())
}
