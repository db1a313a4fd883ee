//! The move-selection contract and the in-process engine.
//!
//! An [`Engine`] receives a [`Snapshot`] rather than the live board, so it
//! can never mutate the caller's state, and answers asynchronously: the
//! local engine hands the search to a blocking worker, the
//! [`RemoteEngine`](crate::remote::RemoteEngine) makes one HTTP round trip.
//! Both answer with the moves tied for best, first one preferred; an empty
//! list means the side to move has to pass.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, Snapshot};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::moves::Move;
use crate::remote::RemoteEngine;
use crate::search::{self, SearchNode};

pub trait Engine: Send + Sync + 'static {
    /// Pick moves for the side to move in `snapshot`.
    fn find_next_move(
        &self,
        snapshot: Snapshot,
        level: u32,
    ) -> impl Future<Output = Result<Vec<Move>, EngineError>> + Send;
}

/// Message handed to the search worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRequest {
    /// Serialized [`Snapshot`].
    pub board: String,
    pub level: u32,
}

/// Message returned by the search worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineResponse {
    pub result: Vec<Move>,
    /// Search trace, informational only.
    pub tree: SearchNode,
}

/// Run one search request to completion on the current thread.
pub fn handle_request(config: &EngineConfig, request: &EngineRequest) -> Result<EngineResponse, EngineError> {
    let mut board = Board::from_json(&request.board)?;
    let depth = search::effective_depth(request.level, board.total_score());
    let mut tree = SearchNode::default();
    let result = search::analyze(&mut board, depth, config, &mut config.rng(), &mut tree);
    Ok(EngineResponse { result, tree })
}

/// Searches on a blocking worker thread, off the async runtime.
#[derive(Debug, Clone, Default)]
pub struct LocalEngine {
    config: Arc<EngineConfig>,
}

impl LocalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Engine for LocalEngine {
    fn find_next_move(
        &self,
        snapshot: Snapshot,
        level: u32,
    ) -> impl Future<Output = Result<Vec<Move>, EngineError>> + Send {
        let config = Arc::clone(&self.config);
        async move {
            let request = EngineRequest {
                board: serde_json::to_string(&snapshot)?,
                level,
            };
            let response =
                tokio::task::spawn_blocking(move || handle_request(&config, &request)).await??;
            debug!(
                candidates = response.tree.gains.len(),
                chosen = response.result.len(),
                "local search done"
            );
            Ok(response.result)
        }
    }
}

/// Either engine, chosen at runtime.
#[derive(Debug, Clone)]
pub enum AnyEngine {
    Local(LocalEngine),
    Remote(RemoteEngine),
}

impl Engine for AnyEngine {
    fn find_next_move(
        &self,
        snapshot: Snapshot,
        level: u32,
    ) -> impl Future<Output = Result<Vec<Move>, EngineError>> + Send {
        async move {
            match self {
                AnyEngine::Local(engine) => engine.find_next_move(snapshot, level).await,
                AnyEngine::Remote(engine) => engine.find_next_move(snapshot, level).await,
            }
        }
    }
}

impl<E: Engine> Engine for Arc<E> {
    fn find_next_move(
        &self,
        snapshot: Snapshot,
        level: u32,
    ) -> impl Future<Output = Result<Vec<Move>, EngineError>> + Send {
        (**self).find_next_move(snapshot, level)
    }
}
