use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub type GuessId = Uuid;

/// Lowest number a player may guess (and the lowest possible target).
pub const GUESS_MIN: u8 = 1;
/// Highest number a player may guess (and the highest possible target).
pub const GUESS_MAX: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum GameStatus {
    Lobby,    // Waiting for a player name
    Playing,  // Target drawn, clock running
    Finished, // Target found, clock frozen
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Lobby => "LOBBY",
            GameStatus::Playing => "PLAYING",
            GameStatus::Finished => "FINISHED",
        }
    }
}

/// Direction the player has to move after a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Verdict {
    Up,      // Target is higher than the guess
    Down,    // Target is lower than the guess
    Correct, // Guess hit the target
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Up => "UP",
            Verdict::Down => "DOWN",
            Verdict::Correct => "CORRECT",
        }
    }

    /// Immediate reply shown before any commentary arrives.
    pub fn announcement(&self) -> &'static str {
        match self {
            Verdict::Up => "더 높은 숫자입니다! ⬆️",
            Verdict::Down => "더 낮은 숫자입니다! ⬇️",
            Verdict::Correct => "정답입니다! 🎉",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessRecord {
    pub id: GuessId,
    pub value: u8,
    pub verdict: Verdict,
    pub timestamp: String, // ISO 8601 string
    pub commentary: Option<String>,
}

/// Outcome of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinishedGame {
    pub attempts: u32,
    pub time_seconds: f64,
    pub is_new_record: bool,
}

/// Client-facing view of a session. Never carries the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSnapshot {
    pub player_name: Option<String>,
    pub status: GameStatus,
    pub history: Vec<GuessRecord>,
    pub attempts: u32,
    pub elapsed_seconds: f64,
    pub started_at: Option<String>,
    pub result: Option<FinishedGame>,
}
