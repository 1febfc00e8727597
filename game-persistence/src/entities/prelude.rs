pub use super::game_leaderboard::Entity as GameLeaderboard;
