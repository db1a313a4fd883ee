//! Legal move generation.
//!
//! Any legal move must touch an opponent disc, so instead of testing all 64
//! cells [`search`] only tests the empty cells next to one.

use crate::board::{Board, Point};
use crate::constants::{DIRECTIONS, HEIGHT, WIDTH};
use crate::error::GameError;
use crate::moves::Move;

/// Every legal move for the side to move, in discovery order.
///
/// Returns an empty list exactly when the side to move must pass.
pub fn search(board: &Board) -> Vec<Move> {
    let mover = board.next_piece();
    let mut seen = [[false; WIDTH]; HEIGHT];
    let mut candidates: Vec<Point> = Vec::new();

    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            match board.get(x, y) {
                Some(piece) if piece != mover => {}
                _ => continue,
            }
            for (dx, dy) in DIRECTIONS {
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                if Board::in_range(nx, ny) && board.is_empty(nx, ny) {
                    let (nx, ny) = (nx as usize, ny as usize);
                    if !seen[ny][nx] {
                        seen[ny][nx] = true;
                        candidates.push((nx, ny));
                    }
                }
            }
        }
    }

    candidates
        .into_iter()
        .map(|(x, y)| get_flippable(board, x, y))
        .filter(|mv| !mv.is_empty())
        .collect()
}

/// The discs the side to move would flip by playing `(x, y)`.
///
/// Walks the 8 directions from the target. A direction counts only if it
/// runs over one or more opponent discs and ends on one of the mover's own;
/// hitting an empty cell or the edge first discards it. The target cell
/// itself is not examined, see [`legal_move`].
pub fn get_flippable(board: &Board, x: usize, y: usize) -> Move {
    let mover = board.next_piece();
    let mut mv = Move::new(x, y, mover);

    for (dx, dy) in DIRECTIONS {
        let (mut nx, mut ny) = (x as isize, y as isize);
        let mut line: Vec<Point> = Vec::new();
        loop {
            nx += dx;
            ny += dy;
            if board.is_empty(nx, ny) {
                line.clear();
                break;
            }
            let (cx, cy) = (nx as usize, ny as usize);
            if board.get(cx, cy) == Some(mover) {
                break;
            }
            line.push((cx, cy));
        }
        mv.flips.extend(line);
    }

    mv
}

/// The legal move at `(x, y)`, if there is one.
pub fn legal_move(board: &Board, x: usize, y: usize) -> Option<Move> {
    if x >= WIDTH || y >= HEIGHT || !board.is_empty(x as isize, y as isize) {
        return None;
    }
    let mv = get_flippable(board, x, y);
    (!mv.is_empty()).then_some(mv)
}

/// Like [`legal_move`], but says why the cell cannot be played.
pub fn try_move(board: &Board, x: usize, y: usize) -> Result<Move, GameError> {
    if x >= WIDTH || y >= HEIGHT {
        return Err(GameError::OutOfRange { x, y });
    }
    if board.get(x, y).is_some() {
        return Err(GameError::Occupied { x, y });
    }
    let mv = get_flippable(board, x, y);
    if mv.is_empty() {
        return Err(GameError::IllegalMove { x, y });
    }
    Ok(mv)
}

/// Passing is legal only when the side to move has nothing to play.
pub fn check_pass(board: &Board) -> Result<(), GameError> {
    match search(board).first() {
        Some(mv) => Err(GameError::IllegalPass { hint: mv.point() }),
        None => Ok(()),
    }
}
