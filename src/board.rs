//! Othello board state and its mutation primitives.
//!
//! The board is mutated only through [`Board::set`], [`Board::unset`],
//! [`Board::flip`], [`Board::pass`] and [`Board::next_turn`]. Legality is
//! never checked here: callers find legal moves with
//! [`move_finder`](crate::move_finder) before committing, and the
//! [`Session`](crate::session::Session) layer rejects illegal actions.
//!
//! Coordinates are `(x, y)` with `x` the column and `y` the row, both
//! starting at the top-left corner.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{CELLS, HEIGHT, MAX_PASSES, WIDTH};
use crate::error::GameError;
use crate::events::{BoardEvent, Observers, SubscriptionId, Topic};
use crate::move_finder;
use crate::moves::Move;

/// A cell coordinate `(x, y)`.
pub type Point = (usize, usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Piece {
    #[serde(rename = "b")]
    Black,
    #[serde(rename = "w")]
    White,
}

impl Piece {
    /// Turn order: index 0 moves first.
    pub const ORDER: [Piece; 2] = [Piece::Black, Piece::White];

    pub fn opponent(self) -> Piece {
        match self {
            Piece::Black => Piece::White,
            Piece::White => Piece::Black,
        }
    }

    /// Upper-case name used on the wire by the remote engine.
    pub fn name(self) -> &'static str {
        match self {
            Piece::Black => "BLACK",
            Piece::White => "WHITE",
        }
    }

    fn symbol(self) -> char {
        match self {
            Piece::Black => 'X',
            Piece::White => 'O',
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Piece::Black => write!(f, "black"),
            Piece::White => write!(f, "white"),
        }
    }
}

/// Disc count per colour.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    #[serde(rename = "b")]
    pub black: u32,
    #[serde(rename = "w")]
    pub white: u32,
}

impl Score {
    pub fn of(&self, piece: Piece) -> u32 {
        match piece {
            Piece::Black => self.black,
            Piece::White => self.white,
        }
    }

    fn of_mut(&mut self, piece: Piece) -> &mut u32 {
        match piece {
            Piece::Black => &mut self.black,
            Piece::White => &mut self.white,
        }
    }

    pub fn total(&self) -> u32 {
        self.black + self.white
    }
}

/// Outcome of a finished game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    BlackWins,
    WhiteWins,
    Draw,
}

impl GameResult {
    pub fn from_score(score: Score) -> Self {
        use std::cmp::Ordering;

        match score.black.cmp(&score.white) {
            Ordering::Greater => GameResult::BlackWins,
            Ordering::Less => GameResult::WhiteWins,
            Ordering::Equal => GameResult::Draw,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::BlackWins => write!(f, "Black wins!"),
            GameResult::WhiteWins => write!(f, "White wins!"),
            GameResult::Draw => write!(f, "Draw!"),
        }
    }
}

pub type Grid = [[Option<Piece>; WIDTH]; HEIGHT];

/// Serializable board state. Undo history and observers are not included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub grid: Grid,
    pub score: Score,
    pub turn: u8,
    pub pass_count: u8,
}

impl Snapshot {
    pub fn next_piece(&self) -> Piece {
        Piece::ORDER[usize::from(self.turn & 1)]
    }

    fn validate(&self) -> Result<(), GameError> {
        if self.turn > 1 {
            return Err(GameError::InvalidSnapshot(format!("turn {} is not 0 or 1", self.turn)));
        }
        if self.pass_count > MAX_PASSES {
            return Err(GameError::InvalidSnapshot(format!(
                "pass count {} exceeds {MAX_PASSES}",
                self.pass_count
            )));
        }
        let mut counted = Score::default();
        for piece in self.grid.iter().flatten().flatten() {
            *counted.of_mut(*piece) += 1;
        }
        if counted != self.score {
            return Err(GameError::InvalidSnapshot(format!(
                "score {}/{} does not match {}/{} discs on the grid",
                self.score.black, self.score.white, counted.black, counted.white
            )));
        }
        Ok(())
    }
}

/// An undoable entry of the board's history.
#[derive(Clone, Debug)]
pub(crate) enum Action {
    /// A placement, with the pass count it reset.
    Place { mv: Move, pass_count: u8 },
    /// A pass, with the pass count before it.
    Pass { pass_count: u8 },
}

/// The game state: grid, score, turn, pass counter and undo history.
pub struct Board {
    grid: Grid,
    score: Score,
    turn: u8,
    pass_count: u8,
    history: Vec<Action>,
    observers: Observers,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("score", &self.score)
            .field("turn", &self.turn)
            .field("pass_count", &self.pass_count)
            .field("history", &self.history.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Board {
    pub fn new() -> Self {
        let mut board = Self {
            grid: [[None; WIDTH]; HEIGHT],
            score: Score::default(),
            turn: 0,
            pass_count: 0,
            history: Vec::new(),
            observers: Observers::default(),
        };
        board.reset();
        board
    }

    /// Build a board from a snapshot, with empty history and no observers.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, GameError> {
        snapshot.validate()?;
        Ok(Self {
            grid: snapshot.grid,
            score: snapshot.score,
            turn: snapshot.turn,
            pass_count: snapshot.pass_count,
            history: Vec::new(),
            observers: Observers::default(),
        })
    }

    /// Parse a board from [`Board::serialize`] output.
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        Self::from_snapshot(serde_json::from_str(json)?)
    }

    /// Restore the initial four-disc layout. Observers are kept.
    pub fn reset(&mut self) {
        self.grid = [[None; WIDTH]; HEIGHT];
        self.grid[3][3] = Some(Piece::White);
        self.grid[4][4] = Some(Piece::White);
        self.grid[3][4] = Some(Piece::Black);
        self.grid[4][3] = Some(Piece::Black);
        self.score = Score { black: 2, white: 2 };
        self.turn = 0;
        self.pass_count = 0;
        self.history.clear();
        self.observers.emit(BoardEvent::Reset);
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn in_range(x: isize, y: isize) -> bool {
        (0..WIDTH as isize).contains(&x) && (0..HEIGHT as isize).contains(&y)
    }

    /// True if the cell is unoccupied. Cells off the board count as empty,
    /// which lets line walks treat the edge like a gap.
    pub fn is_empty(&self, x: isize, y: isize) -> bool {
        if Self::in_range(x, y) {
            self.grid[y as usize][x as usize].is_none()
        } else {
            true
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Piece> {
        if x >= WIDTH || y >= HEIGHT {
            return None;
        }
        self.grid[y][x]
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn total_score(&self) -> u32 {
        self.score.total()
    }

    pub fn turn(&self) -> u8 {
        self.turn
    }

    /// The colour that moves next.
    pub fn next_piece(&self) -> Piece {
        Piece::ORDER[usize::from(self.turn)]
    }

    pub fn pass_count(&self) -> u8 {
        self.pass_count
    }

    pub fn is_terminal(&self) -> bool {
        self.pass_count >= MAX_PASSES || self.total_score() as usize == CELLS
    }

    /// The winner, once the game is over.
    pub fn result(&self) -> Option<GameResult> {
        self.is_terminal().then(|| GameResult::from_score(self.score))
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Every legal move for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        move_finder::search(self)
    }

    /// The move playing `(x, y)` would make, flips included.
    pub fn flippable(&self, x: usize, y: usize) -> Move {
        move_finder::get_flippable(self, x, y)
    }

    // -------------------------------------------------------------------------
    // Mutation primitives
    // -------------------------------------------------------------------------

    /// Place the side to move's disc on an empty cell and hand over the turn.
    pub fn set(&mut self, x: usize, y: usize) {
        let piece = self.next_piece();
        self.grid[y][x] = Some(piece);
        *self.score.of_mut(piece) += 1;
        self.pass_count = 0;
        self.observers.emit(BoardEvent::Set { x, y, piece });

        let ended = self.total_score() as usize == CELLS;
        self.next_turn(ended);
        if ended {
            self.observers.emit(BoardEvent::End);
        }
    }

    /// Remove a disc placed by [`Board::set`].
    pub fn unset(&mut self, x: usize, y: usize) {
        if let Some(piece) = self.grid[y][x].take() {
            *self.score.of_mut(piece) -= 1;
            self.observers.emit(BoardEvent::Unset { x, y });
        }
    }

    /// Toggle the colour of an occupied cell. No-op on an empty cell.
    pub fn flip(&mut self, x: usize, y: usize) {
        let Some(before) = self.grid[y][x] else {
            return;
        };
        let after = before.opponent();
        self.grid[y][x] = Some(after);
        *self.score.of_mut(before) -= 1;
        *self.score.of_mut(after) += 1;
        self.observers.emit(BoardEvent::Flip { x, y, before, after });
    }

    /// Give up the turn. A pass after the game ended is a no-op.
    ///
    /// Passing while a legal move exists is the caller's error; see
    /// [`Session::pass`](crate::session::Session::pass).
    pub fn pass(&mut self) {
        if self.pass_count >= MAX_PASSES {
            return;
        }
        self.history.push(Action::Pass {
            pass_count: self.pass_count,
        });
        self.pass_count += 1;

        let ended = self.pass_count == MAX_PASSES;
        self.next_turn(ended);
        if ended {
            self.observers.emit(BoardEvent::End);
        }
    }

    /// Hand the turn to the other side.
    pub fn next_turn(&mut self, ended: bool) {
        self.turn = (self.turn + 1) % 2;
        self.observers.emit(BoardEvent::TurnChange { ended });
    }

    /// Revert the most recent placement or pass. No-op with empty history.
    pub fn undo(&mut self) {
        let Some(action) = self.history.pop() else {
            return;
        };
        match action {
            Action::Place { mv, pass_count } => mv.revert(self, pass_count),
            Action::Pass { pass_count } => {
                self.pass_count = pass_count;
                self.next_turn(false);
            }
        }
    }

    pub(crate) fn record(&mut self, action: Action) {
        self.history.push(action);
    }

    pub(crate) fn set_pass_count(&mut self, pass_count: u8) {
        self.pass_count = pass_count;
    }

    // -------------------------------------------------------------------------
    // Snapshots
    // -------------------------------------------------------------------------

    /// An independent board in the same position, with no history and no
    /// observers. Used for speculative search.
    pub fn copy(&self) -> Board {
        Board {
            grid: self.grid,
            score: self.score,
            turn: self.turn,
            pass_count: self.pass_count,
            history: Vec::new(),
            observers: Observers::default(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid,
            score: self.score,
            turn: self.turn,
            pass_count: self.pass_count,
        }
    }

    pub fn serialize(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Replace the position with a serialized snapshot. History is cleared,
    /// observers are kept and receive [`BoardEvent::Reset`].
    pub fn restore(&mut self, json: &str) -> Result<(), GameError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        self.grid = snapshot.grid;
        self.score = snapshot.score;
        self.turn = snapshot.turn;
        self.pass_count = snapshot.pass_count;
        self.history.clear();
        self.observers.emit(BoardEvent::Reset);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------------------

    pub fn subscribe<F>(&mut self, topic: Topic, callback: F) -> SubscriptionId
    where
        F: FnMut(&BoardEvent) + Send + 'static,
    {
        self.observers.subscribe(topic, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " ")?;
        for x in 0..WIDTH {
            write!(f, " {}", (b'a' + x as u8) as char)?;
        }
        writeln!(f)?;
        for y in 0..HEIGHT {
            write!(f, "{}", y + 1)?;
            for x in 0..WIDTH {
                let ch = self.grid[y][x].map_or('.', Piece::symbol);
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "X: {}  O: {}  ({} to move)",
            self.score.black,
            self.score.white,
            self.next_piece()
        )
    }
}

/// Parse a square name like `"d3"` into `(x, y)`.
pub fn parse_square(s: &str) -> Option<Point> {
    let bytes = s.trim().as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let col = bytes[0].to_ascii_lowercase();
    let row = bytes[1];
    if !(b'a'..b'a' + WIDTH as u8).contains(&col) || !(b'1'..b'1' + HEIGHT as u8).contains(&row) {
        return None;
    }
    Some(((col - b'a') as usize, (row - b'1') as usize))
}

/// Name a square, e.g. `(3, 2)` is `"d3"`.
pub fn square_name((x, y): Point) -> String {
    format!("{}{}", (b'a' + x as u8) as char, y + 1)
}
