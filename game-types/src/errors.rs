use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameError {
    #[error("Please enter a player name")]
    InvalidPlayerName,
    #[error("Guess must be a number between 1 and 100, got '{input}'")]
    InvalidGuess { input: String },
    #[error("Action not allowed while {current_state}")]
    InvalidGameState { current_state: String },
}
