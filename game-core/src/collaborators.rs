use async_trait::async_trait;
use game_types::{LeaderboardEntry, NewLeaderboardEntry, RecordScore, Verdict};
use thiserror::Error;

use crate::records::sort_entries;

/// Shown when commentary is unavailable or the provider failed.
pub const FALLBACK_COMMENTARY: &str = "화이팅!";
/// Shown when the provider answered with nothing usable.
pub const EMPTY_COMMENTARY: &str = "좋은 시도예요!";

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard store unreachable: {0}")]
    Connectivity(String),
    #[error("leaderboard schema problem: {0}")]
    Schema(String),
    #[error("leaderboard request timed out")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum CommentaryError {
    #[error("commentary provider is not configured")]
    NotConfigured,
    #[error("commentary request failed: {0}")]
    Request(String),
    #[error("commentary request timed out")]
    Timeout,
}

/// Persistent ranking of finished games.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// Up to `limit` entries ordered by attempts, then time.
    async fn fetch_top(&self, limit: u64) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;

    async fn insert(&self, entry: NewLeaderboardEntry)
    -> Result<LeaderboardEntry, LeaderboardError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentaryRequest {
    pub guess: u8,
    pub verdict: Verdict,
    /// Every guess of the session, oldest first, ending with `guess`.
    pub history: Vec<u8>,
}

/// Short flavour text for a guess.
#[async_trait]
pub trait CommentaryProvider: Send + Sync {
    async fn comment(&self, request: &CommentaryRequest) -> Result<String, CommentaryError>;
}

/// Provider used when no text generator is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticCommentary;

#[async_trait]
impl CommentaryProvider for StaticCommentary {
    async fn comment(&self, _request: &CommentaryRequest) -> Result<String, CommentaryError> {
        Ok(FALLBACK_COMMENTARY.to_string())
    }
}

/// Client-side copy of the top of the leaderboard.
///
/// A failed refresh keeps the previous entries and records a warning, so the
/// game keeps working against stale data.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardCache {
    entries: Vec<LeaderboardEntry>,
    warning: Option<String>,
}

impl LeaderboardCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, mut entries: Vec<LeaderboardEntry>) {
        sort_entries(&mut entries);
        self.entries = entries;
        self.warning = None;
    }

    pub fn mark_stale(&mut self, warning: impl Into<String>) {
        self.warning = Some(warning.into());
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn best(&self) -> Option<RecordScore> {
        self.entries.first().map(LeaderboardEntry::score)
    }
}
