//! Engine backed by a remote tree-search service.
//!
//! One `GET` per think, with query parameters:
//!
//! ```text
//! player  BLACK | WHITE
//! board   4 hyphen-joined 32-bit hex words, 2 bits per cell
//! passes  consecutive passes so far
//! level   search strength
//! ```
//!
//! Cell `i = y * 8 + x` lives in word `i / 16` at bit offset `(i % 16) * 2`,
//! encoded as 0 (empty), 1 (black) or 2 (white).
//!
//! A success reply is `{"move": [x, y], "passes": n}`. A pass count higher
//! than the one sent means the service considers the position a forced pass.
//! Any non-2xx reply carries `{"error": "..."}` and fails the think; it is
//! not retried.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, Grid, Piece, Snapshot};
use crate::constants::{CELLS, HEIGHT, WIDTH};
use crate::engine::Engine;
use crate::error::{EngineError, GameError};
use crate::move_finder;
use crate::moves::Move;

const CELLS_PER_WORD: usize = 16;
const WORDS: usize = CELLS / CELLS_PER_WORD;

/// Pack a grid into the wire format.
pub fn encode_board(grid: &Grid) -> String {
    let mut words = [0u32; WORDS];
    for (y, row) in grid.iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let bits: u32 = match cell {
                None => 0,
                Some(Piece::Black) => 1,
                Some(Piece::White) => 2,
            };
            let index = y * WIDTH + x;
            words[index / CELLS_PER_WORD] |= bits << ((index % CELLS_PER_WORD) * 2);
        }
    }
    words
        .iter()
        .map(|w| format!("{w:08x}"))
        .collect::<Vec<_>>()
        .join("-")
}

/// Inverse of [`encode_board`].
pub fn decode_board(encoded: &str) -> Result<Grid, GameError> {
    let words = encoded
        .split('-')
        .map(|w| u32::from_str_radix(w, 16))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| GameError::InvalidSnapshot(format!("bad board word: {e}")))?;
    if words.len() != WORDS {
        return Err(GameError::InvalidSnapshot(format!(
            "expected {WORDS} board words, got {}",
            words.len()
        )));
    }

    let mut grid: Grid = [[None; WIDTH]; HEIGHT];
    for (index, cell) in grid.iter_mut().flatten().enumerate() {
        let bits = (words[index / CELLS_PER_WORD] >> ((index % CELLS_PER_WORD) * 2)) & 0b11;
        *cell = match bits {
            0 => None,
            1 => Some(Piece::Black),
            2 => Some(Piece::White),
            _ => return Err(GameError::InvalidSnapshot(format!("bad cell code at {index}"))),
        };
    }
    Ok(grid)
}

/// Success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteReply {
    #[serde(rename = "move")]
    pub mv: Option<[usize; 2]>,
    pub passes: u8,
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFailure {
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct RemoteEngine {
    client: reqwest::Client,
    url: String,
}

impl RemoteEngine {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, snapshot: Snapshot, level: u32) -> Result<Vec<Move>, EngineError> {
        let player = snapshot.next_piece();
        let query = [
            ("player", player.name().to_string()),
            ("board", encode_board(&snapshot.grid)),
            ("passes", snapshot.pass_count.to_string()),
            ("level", level.to_string()),
        ];
        debug!(url = %self.url, player = player.name(), level, "querying remote engine");

        let response = self.client.get(&self.url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<RemoteFailure>().await {
                Ok(failure) => failure.error,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(EngineError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let reply: RemoteReply = response.json().await?;
        if reply.passes > snapshot.pass_count {
            debug!(passes = reply.passes, "remote engine passes");
            return Ok(Vec::new());
        }
        let Some([x, y]) = reply.mv else {
            return Err(EngineError::Protocol("reply has neither a move nor a pass".into()));
        };

        let board = Board::from_snapshot(snapshot)?;
        match move_finder::legal_move(&board, x, y) {
            Some(mv) => Ok(vec![mv]),
            None => Err(EngineError::Protocol(format!("remote move ({x}, {y}) is not legal"))),
        }
    }
}

impl Engine for RemoteEngine {
    fn find_next_move(
        &self,
        snapshot: Snapshot,
        level: u32,
    ) -> impl Future<Output = Result<Vec<Move>, EngineError>> + Send {
        self.request(snapshot, level)
    }
}
