#![allow(dead_code)]

use async_trait::async_trait;
use game_core::{
    FixedTargetGenerator, GameSession, LeaderboardError, LeaderboardStore,
};
use game_types::{GameStatus, LeaderboardEntry, NewLeaderboardEntry, Verdict};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Creates a session already playing against `target`
pub fn create_playing_session(name: &str, target: u8) -> GameSession {
    let mut session = GameSession::new();
    session
        .start_game(name, &mut FixedTargetGenerator(target))
        .expect("start should succeed");
    session
}

/// Submits every guess and returns the verdicts in submission order
pub fn submit_all(session: &mut GameSession, guesses: &[u8]) -> Vec<Verdict> {
    guesses
        .iter()
        .map(|&value| {
            session
                .submit_guess(value, None)
                .expect("guess should be accepted")
                .guess()
                .expect("guess event")
                .verdict
        })
        .collect()
}

pub fn assert_status(session: &GameSession, expected: GameStatus) {
    assert_eq!(
        session.status(),
        expected,
        "Expected status {:?}, got {:?}",
        expected,
        session.status()
    );
}

pub fn entry(name: &str, attempts: u32, time_seconds: f64) -> LeaderboardEntry {
    LeaderboardEntry {
        id: Uuid::new_v4(),
        player_name: name.to_string(),
        attempts,
        time_seconds,
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// In-memory leaderboard that can be switched into a failing mode
#[derive(Clone, Default)]
pub struct MemoryLeaderboard {
    entries: Arc<Mutex<Vec<LeaderboardEntry>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl LeaderboardStore for MemoryLeaderboard {
    async fn fetch_top(&self, limit: u64) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        if *self.failing.lock().unwrap() {
            return Err(LeaderboardError::Connectivity("offline".to_string()));
        }
        let mut entries = self.entries.lock().unwrap().clone();
        game_core::sort_entries(&mut entries);
        entries.truncate(limit as usize);
        Ok(entries)
    }

    async fn insert(
        &self,
        entry: NewLeaderboardEntry,
    ) -> Result<LeaderboardEntry, LeaderboardError> {
        if *self.failing.lock().unwrap() {
            return Err(LeaderboardError::Connectivity("offline".to_string()));
        }
        let stored = self::entry(&entry.player_name, entry.attempts, entry.time_seconds);
        self.entries.lock().unwrap().push(stored.clone());
        Ok(stored)
    }
}
