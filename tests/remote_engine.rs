//! Remote engine tests against an in-process search service.

use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use othello_engine::board::{Board, Piece, Score, Snapshot};
use othello_engine::config::EngineConfig;
use othello_engine::engine::{AnyEngine, Engine};
use othello_engine::error::EngineError;
use othello_engine::remote::{RemoteEngine, RemoteFailure, RemoteReply, decode_board};
use othello_engine::search::{SearchNode, analyze, effective_depth};

// =============================================================================
// Fake service
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
struct Params {
    player: String,
    board: String,
    passes: u8,
    level: u32,
}

type Seen = Arc<Mutex<Vec<Params>>>;
type Failure = (StatusCode, Json<RemoteFailure>);

fn bad_request(message: impl ToString) -> Failure {
    (
        StatusCode::BAD_REQUEST,
        Json(RemoteFailure {
            error: message.to_string(),
        }),
    )
}

/// Searches the posted board locally, the way the real service would.
async fn search_handler(
    State(seen): State<Seen>,
    Query(params): Query<Params>,
) -> Result<Json<RemoteReply>, Failure> {
    seen.lock().unwrap().push(params.clone());

    let grid = decode_board(&params.board).map_err(bad_request)?;
    let mut score = Score::default();
    for piece in grid.iter().flatten().flatten() {
        match piece {
            Piece::Black => score.black += 1,
            Piece::White => score.white += 1,
        }
    }
    let turn = match params.player.as_str() {
        "BLACK" => 0,
        "WHITE" => 1,
        other => return Err(bad_request(format!("unknown player {other}"))),
    };
    let mut board = Board::from_snapshot(Snapshot {
        grid,
        score,
        turn,
        pass_count: params.passes,
    })
    .map_err(bad_request)?;

    let config = EngineConfig::default();
    let depth = effective_depth(params.level, board.total_score());
    let moves = analyze(&mut board, depth, &config, &mut config.rng(), &mut SearchNode::default());
    Ok(Json(match moves.first() {
        Some(mv) => RemoteReply {
            mv: Some([mv.x, mv.y]),
            passes: params.passes,
        },
        None => RemoteReply {
            mv: None,
            passes: params.passes + 1,
        },
    }))
}

async fn overloaded() -> Failure {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(RemoteFailure {
            error: "too many games".into(),
        }),
    )
}

/// Always answers the top-left corner.
async fn corner(Query(params): Query<Params>) -> Json<RemoteReply> {
    Json(RemoteReply {
        mv: Some([0, 0]),
        passes: params.passes,
    })
}

/// Serve the fake service on an ephemeral port and return its base URL.
async fn serve() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/move", get(search_handler))
        .route("/busy", get(overloaded))
        .route("/corner", get(corner))
        .with_state(Arc::clone(&seen));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

/// Black to move with nothing to play.
fn black_stuck() -> Board {
    Board::from_json(
        r#"{"grid":[["w","b",null,null,null,null,null,null],
        [null,null,null,null,null,null,null,null],[null,null,null,null,null,null,null,null],
        [null,null,null,null,null,null,null,null],[null,null,null,null,null,null,null,null],
        [null,null,null,null,null,null,null,null],[null,null,null,null,null,null,null,null],
        [null,null,null,null,null,null,null,null]],
        "score":{"b":1,"w":1},"turn":0,"passCount":0}"#,
    )
    .unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_remote_move_is_legal_and_complete() {
    let (base, seen) = serve().await;
    let engine = RemoteEngine::new(format!("{base}/move"));

    let mut board = Board::new();
    board.flippable(2, 3).apply(&mut board);
    let moves = engine.find_next_move(board.snapshot(), 2).await.unwrap();

    assert_eq!(moves.len(), 1);
    let mv = &moves[0];
    assert_eq!(mv.piece, Piece::White);
    assert!(!mv.is_empty());
    assert_eq!(board.flippable(mv.x, mv.y), *mv);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].player, "WHITE");
    assert_eq!(seen[0].passes, 0);
    assert_eq!(seen[0].level, 2);
    assert_eq!(&decode_board(&seen[0].board).unwrap(), board.grid());
}

#[tokio::test]
async fn test_remote_forced_pass() {
    let (base, _) = serve().await;
    let engine = AnyEngine::Remote(RemoteEngine::new(format!("{base}/move")));

    let moves = engine.find_next_move(black_stuck().snapshot(), 3).await.unwrap();
    assert!(moves.is_empty());
}

#[tokio::test]
async fn test_remote_error_status_is_surfaced() {
    let (base, _) = serve().await;
    let engine = RemoteEngine::new(format!("{base}/busy"));

    let err = engine.find_next_move(Board::new().snapshot(), 3).await.unwrap_err();
    match err {
        EngineError::Remote { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "too many games");
        }
        other => panic!("expected a remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_remote_illegal_move_is_rejected() {
    let (base, _) = serve().await;
    let engine = RemoteEngine::new(format!("{base}/corner"));

    let err = engine.find_next_move(Board::new().snapshot(), 1).await.unwrap_err();
    assert!(matches!(err, EngineError::Protocol(_)));
}

#[tokio::test]
async fn test_unreachable_service() {
    // Bind and drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let engine = RemoteEngine::new(format!("http://{addr}/move"));
    let err = engine.find_next_move(Board::new().snapshot(), 1).await.unwrap_err();
    assert!(matches!(err, EngineError::Http(_)));
}
