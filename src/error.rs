//! Error types
//!
//! None of these are fatal to the game: the driver recovers from
//! [`SimError`], and the leaderboard facade converts every
//! [`LeaderboardError`] into local fallback mode.

use thiserror::Error;

/// A frame that left the world in a state the next tick cannot trust
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("frame delta {0} is not a finite non-negative number")]
    InvalidDelta(f32),
    #[error("player pose became non-finite")]
    NonFinitePlayer,
    #[error("hazard {id} has a non-finite position")]
    NonFiniteHazard { id: u32 },
}

/// Tuning table rejected at load time
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("could not parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning table `{0}` is empty")]
    Empty(&'static str),
    #[error("tuning value `{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
}

/// Remote leaderboard failure
#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard request failed: {0}")]
    Transport(String),
    #[error("leaderboard returned HTTP {0}")]
    Status(u16),
    #[error("could not decode leaderboard payload: {0}")]
    Decode(#[from] serde_json::Error),
}
