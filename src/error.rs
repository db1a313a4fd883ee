//! Error types for rule violations and engine failures.

use thiserror::Error;

use crate::board::Point;

/// An action rejected by the rules. Rejected actions never mutate the board.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("illegal move at ({x}, {y}): nothing to flip")]
    IllegalMove { x: usize, y: usize },

    #[error("illegal move at ({x}, {y}): cell is occupied")]
    Occupied { x: usize, y: usize },

    #[error("({x}, {y}) is off the board")]
    OutOfRange { x: usize, y: usize },

    /// Passing is only allowed when the side to move has no legal move.
    #[error("don't pass yet, you can flip at ({}, {})", hint.0, hint.1)]
    IllegalPass { hint: Point },

    #[error("the game is over")]
    GameOver,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("not your turn")]
    NotYourTurn,

    #[error("level {0} is out of range, expected 1 to 4")]
    InvalidLevel(u32),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of one think cycle. Never retried by the engine itself.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("request to remote engine failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote engine answered {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("unexpected engine response: {0}")]
    Protocol(String),

    #[error("search worker stopped: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("malformed engine message: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Game(#[from] GameError),
}
