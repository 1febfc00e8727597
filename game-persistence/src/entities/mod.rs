pub mod game_leaderboard;
pub mod prelude;
