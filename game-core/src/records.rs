use game_types::{LeaderboardEntry, RecordScore};
use std::cmp::Ordering;

/// Leaderboard ranking: fewer attempts first, then less time.
///
/// Time only breaks ties between equal attempt counts.
pub fn rank_order(a: &RecordScore, b: &RecordScore) -> Ordering {
    a.attempts
        .cmp(&b.attempts)
        .then_with(|| a.time_seconds.total_cmp(&b.time_seconds))
}

/// Whether `candidate` would take rank 1 ahead of `best`.
///
/// An empty leaderboard makes any finished game a new record. Equal scores
/// do not count as a new record.
pub fn is_new_record(candidate: &RecordScore, best: Option<&RecordScore>) -> bool {
    match best {
        None => true,
        Some(best) => rank_order(candidate, best) == Ordering::Less,
    }
}

/// Sort entries into leaderboard order, keeping earlier rows first on ties.
pub fn sort_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| rank_order(&a.score(), &b.score()));
}

/// Round elapsed seconds to the two decimals stored on the leaderboard.
pub fn round_time(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}
