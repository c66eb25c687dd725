//! CLI subcommand implementations.

pub mod import;
pub mod leaderboard;
pub mod log;
pub mod status;
pub mod streak;
pub mod user;
pub mod util;
pub mod workouts;
