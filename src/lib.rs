//! Othello-Engine: rules and move search for Othello (Reversi).
//!
//! This crate provides an 8x8 Othello board with exact apply/undo, a legal
//! move generator, a shallow heuristic tree search and an automated player
//! that answers turn changes on a shared board, with the search running
//! either in process or on a remote HTTP service.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry, weight tables and player defaults
//! - [`config`] - Engine and player settings, loadable from JSON
//! - [`error`] - Rule violations and engine failures
//! - [`board`] - Game state, mutation primitives and snapshots
//! - [`events`] - Board change notifications
//! - [`move_finder`] - Legal move generation
//! - [`moves`] - Reversible placements
//! - [`search`] - Fixed-depth tree search with positional weights
//! - [`engine`] - The engine contract and the local engine
//! - [`remote`] - Engine backed by a remote search service
//! - [`player`] - Automated player driven by turn changes
//! - [`session`] - Checked moves and a line protocol for front ends
//! - [`replay`] - Game logs, replay and self-play
//!
//! ## Example
//!
//! ```
//! use othello_engine::board::Board;
//! use othello_engine::config::EngineConfig;
//! use othello_engine::search::{SearchNode, analyze};
//!
//! // Create a new game and play d3
//! let mut board = Board::new();
//! board.flippable(3, 2).apply(&mut board);
//!
//! // Search two plies for white's answer
//! let config = EngineConfig::default();
//! let mut root = SearchNode::default();
//! let best = analyze(&mut board, 2, &config, &mut config.rng(), &mut root);
//! println!("White could play at ({}, {})", best[0].x, best[0].y);
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod move_finder;
pub mod moves;
pub mod player;
pub mod remote;
pub mod replay;
pub mod search;
pub mod session;
