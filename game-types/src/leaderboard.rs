use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardEntry {
    pub id: Uuid,
    pub player_name: String,
    pub attempts: u32,
    pub time_seconds: f64,
    pub created_at: String, // ISO 8601 string
}

impl LeaderboardEntry {
    pub fn score(&self) -> RecordScore {
        RecordScore {
            attempts: self.attempts,
            time_seconds: self.time_seconds,
        }
    }
}

/// Row written when a game finishes; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLeaderboardEntry {
    pub player_name: String,
    pub attempts: u32,
    pub time_seconds: f64,
}

impl NewLeaderboardEntry {
    pub fn score(&self) -> RecordScore {
        RecordScore {
            attempts: self.attempts,
            time_seconds: self.time_seconds,
        }
    }
}

/// The ranked part of a result: fewer attempts first, then less time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecordScore {
    pub attempts: u32,
    pub time_seconds: f64,
}
