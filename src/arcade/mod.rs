//! Arcade mini-games. Each game is a plain state machine with no
//! persistence; pages carry the serialized state between moves.

pub mod budget;
pub mod debate;
pub mod policy_puzzle;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArcadeError {
    #[error("The game is already over")]
    GameOver,

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Invalid game state: {0}")]
    Corrupt(String),

    #[error("Game state decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A game whose state can round-trip through a page.
pub trait GameState: Serialize + DeserializeOwned {
    /// Reject states no sequence of legal moves could produce.
    fn validate(&self) -> Result<(), ArcadeError>;
}

pub fn encode<T: GameState>(state: &T) -> Result<String, ArcadeError> {
    Ok(serde_json::to_string(state)?)
}

pub fn decode<T: GameState>(raw: &str) -> Result<T, ArcadeError> {
    let state: T = serde_json::from_str(raw)?;
    state.validate()?;
    Ok(state)
}

pub struct GameInfo {
    pub slug: &'static str,
    pub title: &'static str,
    pub blurb: &'static str,
}

pub const GAMES: &[GameInfo] = &[
    GameInfo {
        slug: "policy-puzzle",
        title: "Policy Puzzle",
        blurb: "Match each problem with the policy that fixes it and the outcome it delivers.",
    },
    GameInfo {
        slug: "budget",
        title: "Campaign Budget",
        blurb: "Steer a campaign through eight decisions without running out of funds, support or capacity.",
    },
    GameInfo {
        slug: "debate",
        title: "Evidence Debate",
        blurb: "Play evidence cards against an opponent over five rounds of argument.",
    },
];
