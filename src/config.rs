//! Engine and player configuration.
//!
//! Both structs deserialize from JSON with every field optional, so a config
//! file only needs to name the values it overrides:
//!
//! ```json
//! { "engine": { "seed": 7 }, "player": { "level": 4, "response_delay_ms": 0 } }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_LEVEL, FREE_TURN_BONUS, MAX_LEVEL, MIDGAME_WEIGHTS, MIN_LEVEL, OPENING_MAX_PIECES,
    OPENING_WEIGHTS, RESPONSE_DELAY_MS, WeightTable,
};
use crate::error::GameError;

/// Heuristic parameters shared by every node of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub opening_weights: WeightTable,
    pub midgame_weights: WeightTable,
    /// Boards with at most this many discs use `opening_weights`.
    pub opening_max_pieces: u32,
    pub free_turn_bonus: i32,
    /// Seed for shuffling tied moves. `None` draws a fresh seed per search.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            opening_weights: OPENING_WEIGHTS,
            midgame_weights: MIDGAME_WEIGHTS,
            opening_max_pieces: OPENING_MAX_PIECES,
            free_turn_bonus: FREE_TURN_BONUS,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Pick the weight table for a board holding `total_pieces` discs.
    pub fn weights_for(&self, total_pieces: u32) -> &WeightTable {
        if total_pieces <= self.opening_max_pieces {
            &self.opening_weights
        } else {
            &self.midgame_weights
        }
    }

    /// Random source for one search.
    pub fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

/// Settings for an automated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub level: u32,
    pub response_delay_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            response_delay_ms: RESPONSE_DELAY_MS,
        }
    }
}

impl PlayerConfig {
    /// Reject a level outside [`MIN_LEVEL`]..=[`MAX_LEVEL`].
    pub fn validate(&self) -> Result<(), GameError> {
        if (MIN_LEVEL..=MAX_LEVEL).contains(&self.level) {
            Ok(())
        } else {
            Err(GameError::InvalidLevel(self.level))
        }
    }

    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }
}

/// Top-level config file layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub player: PlayerConfig,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let config: Self = serde_json::from_str(json)?;
        config.player.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}
