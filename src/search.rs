//! Fixed-depth game tree search with positional heuristics.
//!
//! Each candidate move is scored as `weight[y][x] + flips`. Above the depth
//! limit the candidate is played, the opponent's replies are searched, and
//! the spread between the best and worst reply is folded back into the
//! candidate's score:
//!
//! - no reply at all: the opponent must pass, worth a fixed bonus
//! - every reply leaves the mover behind, or every reply leaves the mover
//!   ahead: keep the most favourable difference
//! - mixed: add the two differences together
//!
//! The search plays and undoes moves on the board it is given, so that board
//! must be a private copy and must not be touched until [`analyze`] returns.
//! Moves are undone in strict LIFO order, which leaves the board exactly as
//! it was.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::config::EngineConfig;
use crate::constants::{DEEP_FROM_PIECES, SHALLOW_BELOW_PIECES};
use crate::move_finder;
use crate::moves::Move;

/// A move and its heuristic score, local to one search.
#[derive(Debug, Clone)]
pub struct SearchCandidate {
    pub mv: Move,
    pub score: i32,
}

/// Diagnostic trace of one search node. Not needed to pick a move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchNode {
    /// Raw heuristic score of each candidate.
    pub gains: Vec<i32>,
    /// Final score of each candidate after folding in the replies.
    pub scores: Vec<i32>,
    pub children: Vec<SearchChild>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchChild {
    /// Best and worst reply differences; `None` when the opponent had no reply.
    pub best: Option<i32>,
    pub worst: Option<i32>,
    pub node: SearchNode,
}

/// Search depth for a requested level, adjusted to the game phase: the
/// branching factor shrinks as the board fills, so later positions can
/// afford one more ply.
pub fn effective_depth(level: u32, total_pieces: u32) -> u32 {
    let depth = if total_pieces < SHALLOW_BELOW_PIECES {
        level.saturating_sub(1)
    } else if total_pieces < DEEP_FROM_PIECES {
        level
    } else {
        level.saturating_add(1)
    };
    depth.max(1)
}

/// Find the best moves for the side to move.
///
/// Returns every top-level move tied for the best score, shuffled, or an
/// empty list when the side to move has no legal move.
pub fn analyze(
    board: &mut Board,
    max_depth: u32,
    config: &EngineConfig,
    rng: &mut fastrand::Rng,
    root: &mut SearchNode,
) -> Vec<Move> {
    let max_depth = max_depth.max(1);
    let mut nodes = 0usize;
    let candidates = analyze_recursive(board, max_depth, 1, config, root, &mut nodes);

    let Some(best) = candidates.iter().map(|c| c.score).max() else {
        debug!(nodes, "no legal move");
        return Vec::new();
    };

    let mut moves: Vec<Move> = candidates
        .into_iter()
        .filter(|c| c.score == best)
        .map(|c| c.mv)
        .collect();
    rng.shuffle(&mut moves);

    debug!(depth = max_depth, nodes, best, ties = moves.len(), "search finished");
    moves
}

fn analyze_recursive(
    board: &mut Board,
    max_depth: u32,
    depth: u32,
    config: &EngineConfig,
    node: &mut SearchNode,
    nodes: &mut usize,
) -> Vec<SearchCandidate> {
    *nodes += 1;
    let weights = config.weights_for(board.total_score());

    let mut candidates: Vec<SearchCandidate> = move_finder::search(board)
        .into_iter()
        .map(|mv| {
            let score = weights[mv.y][mv.x] + mv.len() as i32;
            SearchCandidate { mv, score }
        })
        .collect();
    node.gains = candidates.iter().map(|c| c.score).collect();

    if depth < max_depth {
        for cand in &mut candidates {
            cand.mv.apply(board);

            let mut child = SearchNode::default();
            let replies = analyze_recursive(board, max_depth, depth + 1, config, &mut child, nodes);

            let spread = replies
                .iter()
                .map(|reply| cand.score - reply.score)
                .fold(None, |acc: Option<(i32, i32)>, diff| match acc {
                    None => Some((diff, diff)),
                    Some((best, worst)) => Some((best.max(diff), worst.min(diff))),
                });

            match spread {
                Some((best, worst)) => {
                    cand.score = finalize(best, worst);
                    node.children.push(SearchChild {
                        best: Some(best),
                        worst: Some(worst),
                        node: child,
                    });
                }
                None => {
                    cand.score += config.free_turn_bonus;
                    node.children.push(SearchChild {
                        best: None,
                        worst: None,
                        node: child,
                    });
                }
            }

            board.undo();
        }
    }

    node.scores = candidates.iter().map(|c| c.score).collect();
    candidates
}

/// Fold the best and worst reply differences into one score.
fn finalize(best: i32, worst: i32) -> i32 {
    if (best < 0 && worst < 0) || (best > 0 && worst > 0) {
        best.max(worst)
    } else {
        best + worst
    }
}
