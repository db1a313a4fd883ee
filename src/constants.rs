//! Board geometry, heuristic weight tables and engine defaults.
//!
//! Everything tunable about the automated player lives here as a constant.
//! The search itself never reads these directly: they seed
//! [`EngineConfig`](crate::config::EngineConfig) and
//! [`PlayerConfig`](crate::config::PlayerConfig), which are passed to the
//! engine and the scheduler at construction.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board width in cells.
pub const WIDTH: usize = 8;

/// Board height in cells.
pub const HEIGHT: usize = 8;

/// Number of cells on the board. A game ends when every cell is occupied.
pub const CELLS: usize = WIDTH * HEIGHT;

/// Consecutive passes that end the game.
pub const MAX_PASSES: u8 = 2;

/// Offsets `(dx, dy)` to the 8 neighbouring cells.
/// Order: NW, N, NE, W, E, SW, S, SE
pub const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

// =============================================================================
// Positional Weights
// =============================================================================

/// A per-cell weight table indexed as `table[y][x]`.
pub type WeightTable = [[i32; WIDTH]; HEIGHT];

/// Weights used while the board holds at most [`OPENING_MAX_PIECES`] discs.
///
/// Corners are worth the most; the cells touching a corner are penalised
/// because they hand the corner to the opponent.
pub const OPENING_WEIGHTS: WeightTable = [
    [20, -2, 5, 5, 5, 5, -2, 20],
    [-2, -5, 1, 1, 1, 1, -5, -2],
    [5, 1, 1, 1, 1, 1, 1, 5],
    [5, 1, 1, 1, 1, 1, 1, 5],
    [5, 1, 1, 1, 1, 1, 1, 5],
    [5, 1, 1, 1, 1, 1, 1, 5],
    [-2, -5, 1, 1, 1, 1, -5, -2],
    [20, -2, 5, 5, 5, 5, -2, 20],
];

/// Flatter weights for the rest of the game.
pub const MIDGAME_WEIGHTS: WeightTable = [
    [9, 0, 3, 3, 3, 3, 0, 9],
    [0, -2, 1, 1, 1, 1, -2, 0],
    [3, 1, 1, 1, 1, 1, 1, 3],
    [3, 1, 1, 1, 1, 1, 1, 3],
    [3, 1, 1, 1, 1, 1, 1, 3],
    [3, 1, 1, 1, 1, 1, 1, 3],
    [0, -2, 1, 1, 1, 1, -2, 0],
    [9, 0, 3, 3, 3, 3, 0, 9],
];

/// Largest disc count for which [`OPENING_WEIGHTS`] applies.
pub const OPENING_MAX_PIECES: u32 = 32;

/// Bonus for a move that leaves the opponent without a reply.
/// Deliberately larger than any table weight plus flip count.
pub const FREE_TURN_BONUS: i32 = 100;

// =============================================================================
// Automated Player Defaults
// =============================================================================

/// Weakest accepted search strength.
pub const MIN_LEVEL: u32 = 1;

/// Strongest accepted search strength. Deeper searches take too long to
/// answer a human.
pub const MAX_LEVEL: u32 = 4;

/// Default search strength, 1 (easy) to 4 (hard).
pub const DEFAULT_LEVEL: u32 = 3;

/// Debounce between a turn change and the automated player's think.
pub const RESPONSE_DELAY_MS: u64 = 300;

/// Disc count below which the search goes one level shallower.
pub const SHALLOW_BELOW_PIECES: u32 = 8;

/// Disc count from which the search goes one level deeper.
pub const DEEP_FROM_PIECES: u32 = 16;

/// Depth used when the human asks for a hint or tries to pass.
pub const HINT_DEPTH: u32 = 2;
