//! Reversible placements.
//!
//! A [`Move`] is plain data: the target cell, the colour placed and the
//! opponent discs it flips. Applying it records it on the board's undo
//! history, and [`Board::undo`] reverts it exactly: grid, score, turn and
//! pass count all return to their previous values.

use serde::{Deserialize, Serialize};

use crate::board::{Action, Board, Piece, Point};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub x: usize,
    pub y: usize,
    pub piece: Piece,
    /// Opponent discs turned over, grouped by direction.
    #[serde(rename = "flippables")]
    pub flips: Vec<Point>,
}

impl Move {
    pub fn new(x: usize, y: usize, piece: Piece) -> Self {
        Self {
            x,
            y,
            piece,
            flips: Vec::new(),
        }
    }

    pub fn point(&self) -> Point {
        (self.x, self.y)
    }

    /// Number of discs flipped.
    pub fn len(&self) -> usize {
        self.flips.len()
    }

    /// A move that flips nothing is not legal.
    pub fn is_empty(&self) -> bool {
        self.flips.is_empty()
    }

    /// Flip every recorded disc, place the mover's disc and push the move
    /// onto the board's undo history.
    ///
    /// The move must have been computed for this board in its current state.
    pub fn apply(&self, board: &mut Board) {
        debug_assert_eq!(board.next_piece(), self.piece, "move applied out of turn");
        let pass_count = board.pass_count();
        for &(x, y) in &self.flips {
            board.flip(x, y);
        }
        board.set(self.x, self.y);
        board.record(Action::Place {
            mv: self.clone(),
            pass_count,
        });
    }

    /// Inverse of [`Move::apply`]. Only reachable through [`Board::undo`].
    pub(crate) fn revert(&self, board: &mut Board, pass_count: u8) {
        for &(x, y) in &self.flips {
            board.flip(x, y);
        }
        board.unset(self.x, self.y);
        board.set_pass_count(pass_count);
        board.next_turn(false);
    }
}
