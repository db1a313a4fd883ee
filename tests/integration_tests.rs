//! Integration tests for othello-engine
//!
//! Rule properties are checked over seeded random games; the end-to-end
//! scenarios go through the public API the way a front end would.

use othello_engine::board::{Board, GameResult, Piece, Score};
use othello_engine::config::EngineConfig;
use othello_engine::constants::{CELLS, DIRECTIONS, HEIGHT, WIDTH};
use othello_engine::move_finder::{self, check_pass, get_flippable, search};
use othello_engine::replay::{ReplayLog, ReplayOutcome, replay};
use othello_engine::search::{SearchNode, analyze};

// =============================================================================
// Helper functions
// =============================================================================

/// Play a game to the end with uniformly random legal moves.
/// Calls `visit` on every position before its move is played.
fn random_game_with(seed: u64, mut visit: impl FnMut(&mut Board)) -> (Board, ReplayLog) {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut board = Board::new();
    let mut log = ReplayLog::new();

    while !board.is_terminal() {
        visit(&mut board);
        let moves = search(&board);
        if moves.is_empty() {
            board.pass();
            log.push(None);
        } else {
            let mv = &moves[rng.usize(..moves.len())];
            mv.apply(&mut board);
            log.push(Some([mv.x, mv.y]));
        }
    }
    (board, log)
}

fn random_game(seed: u64) -> (Board, ReplayLog) {
    random_game_with(seed, |_| {})
}

fn occupied(board: &Board) -> usize {
    board.grid().iter().flatten().filter(|c| c.is_some()).count()
}

/// Reference outflanking check: some direction has one or more opponent
/// discs followed by one of the mover's own, all in range.
fn outflanks(board: &Board, x: usize, y: usize) -> bool {
    let mover = board.next_piece();
    DIRECTIONS.iter().any(|&(dx, dy)| {
        let (mut cx, mut cy) = (x as isize + dx, y as isize + dy);
        let mut between = 0;
        while Board::in_range(cx, cy) {
            match board.get(cx as usize, cy as usize) {
                Some(p) if p == mover => return between > 0,
                Some(_) => between += 1,
                None => return false,
            }
            cx += dx;
            cy += dy;
        }
        false
    })
}

// =============================================================================
// Board invariants
// =============================================================================

#[test]
fn test_initial_board() {
    let board = Board::new();
    assert_eq!(board.score(), Score { black: 2, white: 2 });
    assert_eq!(occupied(&board), 4);
    assert_eq!(board.get(3, 3), Some(Piece::White));
    assert_eq!(board.get(4, 4), Some(Piece::White));
    assert_eq!(board.get(4, 3), Some(Piece::Black));
    assert_eq!(board.get(3, 4), Some(Piece::Black));
    assert_eq!(board.next_piece(), Piece::Black);
}

#[test]
fn test_score_matches_grid_through_random_games() {
    for seed in 0..20 {
        let (board, _) = random_game_with(seed, |board| {
            let discs = occupied(board);
            assert_eq!(board.total_score() as usize, discs);
            let empty = board.grid().iter().flatten().filter(|c| c.is_none()).count();
            assert_eq!(discs + empty, CELLS);
        });
        assert_eq!(board.total_score() as usize, occupied(&board));
        assert!(board.is_terminal());
    }
}

#[test]
fn test_apply_then_undo_restores_everything() {
    for seed in 0..5 {
        random_game_with(seed, |board| {
            let before = board.snapshot();
            for mv in search(board) {
                mv.apply(board);
                assert_ne!(board.snapshot(), before);
                board.undo();
                assert_eq!(board.snapshot(), before);
            }
            if search(board).is_empty() {
                board.pass();
                board.undo();
                assert_eq!(board.snapshot(), before);
            }
        });
    }
}

#[test]
fn test_flippable_matches_outflanking() {
    for seed in 0..10 {
        random_game_with(seed, |board| {
            for y in 0..HEIGHT {
                for x in 0..WIDTH {
                    if board.get(x, y).is_none() {
                        assert_eq!(
                            !get_flippable(board, x, y).is_empty(),
                            outflanks(board, x, y),
                            "cell ({x}, {y})"
                        );
                    }
                }
            }
        });
    }
}

#[test]
fn test_search_empty_exactly_when_pass_is_legal() {
    for seed in 0..30 {
        random_game_with(seed, |board| {
            let moves = search(board);
            assert_eq!(moves.is_empty(), check_pass(board).is_ok());
            for mv in &moves {
                assert_eq!(board.get(mv.x, mv.y), None);
                assert_eq!(move_finder::legal_move(board, mv.x, mv.y).as_ref(), Some(mv));
            }
        });
    }
}

#[test]
fn test_two_passes_end_the_game() {
    let mut board = Board::new();
    board.pass();
    assert!(!board.is_terminal());
    board.pass();
    assert!(board.is_terminal());
    assert_eq!(board.result(), Some(GameResult::Draw));

    let ended = board.snapshot();
    board.pass();
    assert_eq!(board.snapshot(), ended);
}

#[test]
fn test_placement_resets_pass_count_and_undo_brings_it_back() {
    let mut board = Board::new();
    board.pass();
    assert_eq!(board.pass_count(), 1);

    let mv = search(&board).remove(0);
    mv.apply(&mut board);
    assert_eq!(board.pass_count(), 0);

    board.undo();
    assert_eq!(board.pass_count(), 1);
    assert_eq!(board.next_piece(), Piece::White);
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn test_scenario_opening_move() {
    let mut board = Board::new();
    let mv = get_flippable(&board, 2, 3);
    assert_eq!(mv.flips, vec![(3, 3)]);

    mv.apply(&mut board);
    assert_eq!(board.score(), Score { black: 4, white: 1 });
    assert_eq!(board.next_piece(), Piece::White);
}

#[test]
fn test_scenario_depth_one_search() {
    let mut board = Board::new();
    let config = EngineConfig::default();
    let mut root = SearchNode::default();
    let moves = analyze(&mut board, 1, &config, &mut config.rng(), &mut root);

    let best = root.scores.iter().copied().max().unwrap();
    assert_eq!(root.scores.len(), 4);
    assert!(!moves.is_empty());
    for mv in &moves {
        assert_eq!(board.get(mv.x, mv.y), None);
        let score = config.weights_for(board.total_score())[mv.y][mv.x] + mv.len() as i32;
        assert_eq!(score, best);
    }
}

#[test]
fn test_scenario_serialize_and_restore() {
    let mut rng = fastrand::Rng::with_seed(11);
    let mut board = Board::new();
    for _ in 0..20 {
        let moves = search(&board);
        if moves.is_empty() {
            board.pass();
        } else {
            moves[rng.usize(..moves.len())].apply(&mut board);
        }
    }

    let json = board.serialize().unwrap();
    let restored = Board::from_json(&json).unwrap();
    assert_eq!(restored.snapshot(), board.snapshot());
    assert_eq!(restored.grid(), board.grid());
    assert!(board.can_undo());
    assert!(!restored.can_undo());

    let mut fresh = Board::new();
    fresh.restore(&json).unwrap();
    assert_eq!(fresh.snapshot(), board.snapshot());
    assert!(!fresh.can_undo());
}

#[test]
fn test_scenario_replay_reproduces_result() {
    for seed in 0..10 {
        let (played, log) = random_game(seed);
        let expected = played.result().unwrap();

        let json = serde_json::to_string(&log).unwrap();
        let log: ReplayLog = serde_json::from_str(&json).unwrap();

        let mut board = Board::new();
        let outcome = replay(&mut board, log.clone(), &mut ()).unwrap();
        assert_eq!(outcome, ReplayOutcome::Finished(expected));
        assert_eq!(board.score(), played.score());
        assert_eq!(GameResult::from_score(board.score()), expected);

        // Same log, same result, every time.
        let mut again = Board::new();
        assert_eq!(replay(&mut again, log, &mut ()).unwrap(), outcome);
        assert_eq!(again.snapshot(), board.snapshot());
    }
}

#[test]
fn test_replay_stops_early_without_passing() {
    let (_, log) = random_game(3);
    let cut = log.len() / 2;

    let mut board = Board::new();
    let outcome = replay(&mut board, log.into_iter().take(cut), &mut ()).unwrap();
    assert_eq!(outcome, ReplayOutcome::Exhausted { moves: cut });
    assert!(!board.is_terminal());
}
