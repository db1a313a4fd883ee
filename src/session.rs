//! The calling layer between a user interface and the board.
//!
//! [`Board`] trusts its callers; [`Session`] is the caller that does the
//! checking. Every rejected action leaves the board untouched.
//!
//! [`Session::execute`] wraps the same operations in a line protocol:
//!
//! ```text
//! play <sq>    place a disc, e.g. `play d3` (or just `d3`)
//! pass         give up the turn, only when nothing can be played
//! undo         take back the last round
//! new          start over
//! show         print the board
//! score        disc counts, and the result once the game is over
//! moves        list legal squares
//! hint         suggest a square
//! save         print the position as JSON
//! load <json>  restore a saved position
//! help         list commands
//! quit         leave
//! ```
//!
//! Replies start with `=` on success and `?` on failure.

use std::fmt;

use crate::board::{Board, GameResult, Piece, Score, parse_square, square_name};
use crate::config::EngineConfig;
use crate::constants::HINT_DEPTH;
use crate::error::GameError;
use crate::move_finder;
use crate::moves::Move;
use crate::player::{SharedBoard, lock_board};
use crate::search::{self, SearchNode};

/// Commands understood by [`Session::execute`].
pub const COMMANDS: &[&str] = &[
    "help", "hint", "load", "moves", "new", "pass", "play", "quit", "save", "score", "show",
    "undo",
];

/// A summary of the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub score: Score,
    pub next: Piece,
    pub pass_count: u8,
    pub terminal: bool,
    pub result: Option<GameResult>,
}

/// Reply to one protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub success: bool,
    pub message: String,
}

impl Response {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<Result<String, GameError>> for Response {
    fn from(result: Result<String, GameError>) -> Self {
        match result {
            Ok(message) => Response::ok(message),
            Err(err) => Response::fail(err.to_string()),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.success { '=' } else { '?' };
        if self.message.is_empty() {
            write!(f, "{prefix}")
        } else if self.message.contains('\n') {
            write!(f, "{prefix}\n{}", self.message)
        } else {
            write!(f, "{prefix} {}", self.message)
        }
    }
}

pub struct Session {
    board: SharedBoard,
    /// When set, placements and passes are only accepted for this colour.
    human: Option<Piece>,
    config: EngineConfig,
}

impl Session {
    pub fn new(board: SharedBoard) -> Self {
        Self {
            board,
            human: None,
            config: EngineConfig::default(),
        }
    }

    /// Restrict moves to one colour, leaving the other to an automated player.
    pub fn with_human(mut self, piece: Piece) -> Self {
        self.human = Some(piece);
        self
    }

    /// Engine settings used for hints.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn board(&self) -> &SharedBoard {
        &self.board
    }

    pub fn human(&self) -> Option<Piece> {
        self.human
    }

    // -------------------------------------------------------------------------
    // Game operations
    // -------------------------------------------------------------------------

    pub fn legal_move_at(&self, x: usize, y: usize) -> Option<Move> {
        move_finder::legal_move(&lock_board(&self.board), x, y)
    }

    /// Place a disc for the side to move.
    pub fn play(&self, x: usize, y: usize) -> Result<Move, GameError> {
        let mut live = lock_board(&self.board);
        self.check_turn(&live)?;
        let mv = move_finder::try_move(&live, x, y)?;
        mv.apply(&mut live);
        Ok(mv)
    }

    /// Pass, if the side to move has nothing to play. Otherwise the error
    /// carries the square a shallow search would pick.
    pub fn pass(&self) -> Result<(), GameError> {
        let mut live = lock_board(&self.board);
        self.check_turn(&live)?;
        if let Err(GameError::IllegalPass { hint }) = move_finder::check_pass(&live) {
            let hint = self.best_move(&live).map_or(hint, |mv| mv.point());
            return Err(GameError::IllegalPass { hint });
        }
        live.pass();
        Ok(())
    }

    /// Take back one round: the last move, and the one before it if that
    /// hands the turn back to the human.
    pub fn undo_round(&self) -> Result<(), GameError> {
        let mut live = lock_board(&self.board);
        if !live.can_undo() {
            return Err(GameError::NothingToUndo);
        }
        live.undo();
        if live.can_undo() && self.human.is_none_or(|human| live.next_piece() != human) {
            live.undo();
        }
        Ok(())
    }

    pub fn new_game(&self) {
        lock_board(&self.board).reset();
    }

    pub fn status(&self) -> Status {
        let live = lock_board(&self.board);
        Status {
            score: live.score(),
            next: live.next_piece(),
            pass_count: live.pass_count(),
            terminal: live.is_terminal(),
            result: live.result(),
        }
    }

    pub fn save(&self) -> Result<String, GameError> {
        lock_board(&self.board).serialize()
    }

    pub fn load(&self, json: &str) -> Result<(), GameError> {
        lock_board(&self.board).restore(json)
    }

    /// Suggest a move for the side to move. `None` means pass.
    pub fn hint(&self) -> Result<Option<Move>, GameError> {
        let live = lock_board(&self.board);
        if live.is_terminal() {
            return Err(GameError::GameOver);
        }
        Ok(self.best_move(&live))
    }

    fn check_turn(&self, board: &Board) -> Result<(), GameError> {
        if board.is_terminal() {
            return Err(GameError::GameOver);
        }
        match self.human {
            Some(human) if board.next_piece() != human => Err(GameError::NotYourTurn),
            _ => Ok(()),
        }
    }

    fn best_move(&self, board: &Board) -> Option<Move> {
        let mut scratch = board.copy();
        let mut root = SearchNode::default();
        search::analyze(&mut scratch, HINT_DEPTH, &self.config, &mut self.config.rng(), &mut root)
            .into_iter()
            .next()
    }

    // -------------------------------------------------------------------------
    // Line protocol
    // -------------------------------------------------------------------------

    /// Run one protocol line.
    pub fn execute(&self, line: &str) -> Response {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command.to_lowercase(), rest.trim()),
            None => (line.to_lowercase(), ""),
        };

        match command.as_str() {
            "" => Response::ok(""),
            "play" => self.cmd_play(rest),
            "pass" => self.pass().map(|()| "pass".to_string()).into(),
            "undo" => self.undo_round().map(|()| self.show()).into(),
            "new" => {
                self.new_game();
                Response::ok(self.show())
            }
            "show" => Response::ok(self.show()),
            "score" => Response::ok(self.cmd_score()),
            "moves" => {
                let moves = lock_board(&self.board).legal_moves();
                let squares: Vec<String> = moves.iter().map(|mv| square_name(mv.point())).collect();
                Response::ok(if squares.is_empty() {
                    "pass".to_string()
                } else {
                    squares.join(" ")
                })
            }
            "hint" => self
                .hint()
                .map(|mv| mv.map_or("pass".to_string(), |mv| square_name(mv.point())))
                .into(),
            "save" => self.save().into(),
            "load" => {
                if rest.is_empty() {
                    return Response::fail("load needs a saved position");
                }
                self.load(rest).map(|()| self.show()).into()
            }
            "help" => Response::ok(COMMANDS.join(" ")),
            "quit" => Response::ok("bye"),
            other => match parse_square(other) {
                Some(_) if rest.is_empty() => self.cmd_play(other),
                _ => Response::fail(format!("unknown command: {other}")),
            },
        }
    }

    fn cmd_play(&self, square: &str) -> Response {
        let Some((x, y)) = parse_square(square) else {
            return Response::fail(format!("bad square: {square:?}"));
        };
        self.play(x, y)
            .map(|mv| format!("{} {} flips {}", mv.piece, square_name(mv.point()), mv.len()))
            .into()
    }

    fn cmd_score(&self) -> String {
        let status = self.status();
        let counts = format!("black {} white {}", status.score.black, status.score.white);
        match status.result {
            Some(result) => format!("{counts} ({result})"),
            None => counts,
        }
    }

    fn show(&self) -> String {
        lock_board(&self.board).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::shared;

    fn session() -> Session {
        Session::new(shared(Board::new()))
    }

    #[test]
    fn test_play_and_reject() {
        let session = session();
        let mv = session.play(2, 3).unwrap();
        assert_eq!(mv.flips, vec![(3, 3)]);
        assert_eq!(session.status().next, Piece::White);

        let before = session.save().unwrap();
        assert!(matches!(session.play(2, 3), Err(GameError::Occupied { .. })));
        assert!(matches!(session.play(0, 0), Err(GameError::IllegalMove { .. })));
        assert!(matches!(session.play(9, 0), Err(GameError::OutOfRange { .. })));
        assert_eq!(session.save().unwrap(), before);
    }

    #[test]
    fn test_human_colour_is_enforced() {
        let session = session().with_human(Piece::White);
        assert!(matches!(session.play(2, 3), Err(GameError::NotYourTurn)));
        assert!(matches!(session.pass(), Err(GameError::NotYourTurn)));
    }

    #[test]
    fn test_pass_rejected_with_legal_hint() {
        let session = session();
        let Err(GameError::IllegalPass { hint }) = session.pass() else {
            panic!("pass should be rejected on the opening board");
        };
        assert!(session.legal_move_at(hint.0, hint.1).is_some());
        assert_eq!(session.status().pass_count, 0);
    }

    #[test]
    fn test_undo_round() {
        let session = session();
        assert!(matches!(session.undo_round(), Err(GameError::NothingToUndo)));

        session.play(2, 3).unwrap();
        session.play(2, 2).unwrap();
        session.undo_round().unwrap();
        assert_eq!(session.save().unwrap(), Board::new().serialize().unwrap());
    }

    #[test]
    fn test_undo_round_stops_on_human_turn() {
        let session = session().with_human(Piece::Black);
        session.play(2, 3).unwrap();
        // The bot has not answered yet: only the human's move goes.
        session.undo_round().unwrap();
        assert_eq!(session.status().next, Piece::Black);
        assert_eq!(session.status().score, Score { black: 2, white: 2 });
    }

    #[test]
    fn test_game_over_rejects_moves() {
        let session = session();
        let json = r#"{"grid":[[null,null,null,null,null,null,null,null],
            [null,null,null,null,null,null,null,null],[null,null,null,null,null,null,null,null],
            [null,null,null,"b","b",null,null,null],[null,null,null,"b","b",null,null,null],
            [null,null,null,null,null,null,null,null],[null,null,null,null,null,null,null,null],
            [null,null,null,null,null,null,null,null]],
            "score":{"b":4,"w":0},"turn":0,"passCount":2}"#;
        session.load(json).unwrap();

        let status = session.status();
        assert!(status.terminal);
        assert_eq!(status.result, Some(GameResult::BlackWins));
        assert!(matches!(session.play(2, 3), Err(GameError::GameOver)));
        assert!(matches!(session.pass(), Err(GameError::GameOver)));
        assert!(matches!(session.hint(), Err(GameError::GameOver)));
    }

    #[test]
    fn test_load_rejects_bad_snapshot() {
        let session = session();
        assert!(matches!(session.load("not json"), Err(GameError::Json(_))));
        let bad_score = Board::new().serialize().unwrap().replace(r#""b":2"#, r#""b":3"#);
        assert!(matches!(session.load(&bad_score), Err(GameError::InvalidSnapshot(_))));
    }

    #[test]
    fn test_execute_protocol() {
        let session = session();

        assert_eq!(session.execute("play d3"), Response::ok("black d3 flips 1"));
        assert_eq!(session.execute("C3"), Response::ok("white c3 flips 1"));
        assert!(!session.execute("play d3").success);
        assert!(!session.execute("play z9").success);
        assert!(!session.execute("frobnicate").success);

        let moves = session.execute("moves");
        assert!(moves.success);
        assert!(!moves.message.is_empty());

        assert_eq!(session.execute("score").message, "black 3 white 3");
        assert!(session.execute("undo").success);
        assert_eq!(session.execute("score").message, "black 2 white 2");

        let saved = session.execute("save").message;
        session.execute("d3");
        assert!(session.execute(&format!("load {saved}")).success);
        assert_eq!(session.execute("score").message, "black 2 white 2");

        assert_eq!(session.execute("help").message, COMMANDS.join(" "));
    }

    #[test]
    fn test_response_display() {
        assert_eq!(Response::ok("d3").to_string(), "= d3");
        assert_eq!(Response::fail("nope").to_string(), "? nope");
        assert_eq!(Response::ok("").to_string(), "=");
        assert_eq!(Response::ok("a\nb").to_string(), "=\na\nb");
    }
}
