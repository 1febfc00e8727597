use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GuessId, GuessRecord, LeaderboardEntry, SessionSnapshot, Verdict};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    StartGame { player_name: String },
    SubmitGuess { value: String },
    ResetToLobby,
    RefreshLeaderboard,
    GetState,
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    GameStarted {
        state: SessionSnapshot,
        announcement: String,
    },
    GuessEvaluated {
        guess: GuessRecord,
        announcement: String,
        state: SessionSnapshot,
    },
    CommentaryReady {
        guess_id: GuessId,
        verdict: Verdict,
        commentary: String,
    },
    GameFinished {
        attempts: u32,
        time_seconds: f64,
        is_new_record: bool,
        saved: bool,
    },
    LeaderboardUpdate {
        entries: Vec<LeaderboardEntry>,
        warning: Option<String>,
    },
    StateUpdate { state: SessionSnapshot },
    ReturnedToLobby,
    Error { message: String },
}
