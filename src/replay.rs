//! Recorded games.
//!
//! A game log is the list of moves in turn order, each a placement `[x, y]`
//! or `null` for a pass. Replaying a log from the initial layout reproduces
//! the game exactly; [`record_game`] produces one by letting two engines
//! play each other.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::{Board, GameResult, Score};
use crate::engine::Engine;
use crate::error::{EngineError, GameError};
use crate::move_finder;

/// One logged turn: a placement, or `None` for a pass.
pub type LoggedMove = Option<[usize; 2]>;

pub type ReplayLog = Vec<LoggedMove>;

/// How a replay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayOutcome {
    /// The game reached a terminal state.
    Finished(GameResult),
    /// The source ran out first, after this many moves.
    Exhausted { moves: usize },
}

/// Hooks around each replayed move. Both default to doing nothing.
pub trait ReplayObserver {
    /// Called before `entry` is played as move number `index`.
    fn before_move(&mut self, _board: &Board, _entry: LoggedMove, _index: usize) {}

    fn after_move(&mut self, _board: &Board, _entry: LoggedMove) {}
}

impl ReplayObserver for () {}

/// Reset `board` and play `source` on it until the game ends or the source
/// runs dry. An illegal placement or pass stops the replay with an error,
/// leaving the board at the last legal position.
pub fn replay<I, O>(board: &mut Board, source: I, observer: &mut O) -> Result<ReplayOutcome, GameError>
where
    I: IntoIterator<Item = LoggedMove>,
    O: ReplayObserver + ?Sized,
{
    board.reset();
    let mut source = source.into_iter();
    let mut played = 0;

    loop {
        if let Some(result) = board.result() {
            debug!(moves = played, %result, "replay finished");
            return Ok(ReplayOutcome::Finished(result));
        }
        let Some(entry) = source.next() else {
            debug!(moves = played, "replay source exhausted");
            return Ok(ReplayOutcome::Exhausted { moves: played });
        };

        observer.before_move(board, entry, played);
        match entry {
            Some([x, y]) => move_finder::try_move(board, x, y)?.apply(board),
            None => {
                move_finder::check_pass(board)?;
                board.pass();
            }
        }
        played += 1;
        observer.after_move(board, entry);
    }
}

/// Play a full game between two engines on `board`, starting from the
/// initial layout. `levels` is indexed by turn: black first.
pub async fn record_game<B, W>(
    board: &mut Board,
    black: &B,
    white: &W,
    levels: [u32; 2],
) -> Result<(ReplayLog, GameResult), EngineError>
where
    B: Engine,
    W: Engine,
{
    board.reset();
    let mut log = ReplayLog::new();

    loop {
        if let Some(result) = board.result() {
            let score = board.score();
            info!(moves = log.len(), black = score.black, white = score.white, "self-play finished: {result}");
            return Ok((log, result));
        }

        let snapshot = board.snapshot();
        let level = levels[usize::from(board.turn())];
        let moves = match board.turn() {
            0 => black.find_next_move(snapshot, level).await?,
            _ => white.find_next_move(snapshot, level).await?,
        };

        match moves.first() {
            Some(mv) => {
                let mv = move_finder::try_move(board, mv.x, mv.y)?;
                debug!(player = %mv.piece, x = mv.x, y = mv.y, "self-play move");
                mv.apply(board);
                log.push(Some([mv.x, mv.y]));
            }
            None => {
                move_finder::check_pass(board)?;
                debug!(player = %board.next_piece(), "self-play pass");
                board.pass();
                log.push(None);
            }
        }
    }
}

/// File name for a saved game log: `{unix_ms}_{black}v{white}_{dedup}.json`.
pub fn game_file_name(score: Score, now_ms: u128, dedup: u32) -> String {
    format!("{now_ms}_{}v{}_{dedup}.json", score.black, score.white)
}

/// Final score encoded in a [`game_file_name`].
pub fn parse_game_file_name(name: &str) -> Option<Score> {
    let score = name.split('_').nth(1)?;
    let (black, white) = score.split_once('v')?;
    Some(Score {
        black: black.parse().ok()?,
        white: white.parse().ok()?,
    })
}
