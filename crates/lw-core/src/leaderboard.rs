//! Cross-user leaderboard rows and ranking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// One leaderboard entry. Only users with at least one workout get a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub user_id: UserId,
    pub display_name: String,
    pub last_workout_at: DateTime<Utc>,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Orders rows most recently active first; ties go to the smaller user ID.
pub fn rank(rows: &mut [LeaderboardRow]) {
    rows.sort_by(|a, b| {
        b.last_workout_at
            .cmp(&a.last_workout_at)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}
