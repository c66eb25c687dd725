//! User profiles as seen by the streak engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{UserId, WeeklyGoal};

/// A user and the two fields the engine reads or writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    /// Unique handle, shown on the leaderboard.
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub weekly_goal: WeeklyGoal,
    /// Highest current streak ever recorded. Never decreases.
    pub longest_streak: u32,
    pub created_at: DateTime<Utc>,
}
