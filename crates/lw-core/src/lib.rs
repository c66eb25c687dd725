//! Core domain logic for workout adherence and streaks.
//!
//! This crate contains the fundamental types and logic for:
//! - Week bucketing: mapping instants to Monday-anchored weeks in one reference timezone
//! - Adherence: per-week workout counts
//! - Streaks: consecutive qualifying weeks and the longest-streak watermark
//! - Leaderboard: ranking users by recency
//!
//! Storage is abstracted behind [`WorkoutStore`] and [`ProfileStore`];
//! [`StreakEngine`] ties them together.

pub mod adherence;
mod engine;
pub mod leaderboard;
mod profile;
mod progress;
pub mod store;
pub mod streak;
mod types;
pub mod week;
mod workout;

pub use adherence::WeeklyCounts;
pub use engine::{StreakEngine, StreakError};
pub use leaderboard::LeaderboardRow;
pub use profile::Profile;
pub use progress::{StreakSummary, WeeklyProgress};
pub use store::{LastWorkout, ProfileStore, WorkoutStore};
pub use types::{UserId, ValidationError, WeeklyGoal, WorkoutId};
pub use week::{ReferenceZone, WeekKey};
pub use workout::{InsertOutcome, NewWorkout, Workout, WorkoutSource};
