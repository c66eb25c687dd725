//! Read models for a single user's adherence.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{UserId, WeeklyGoal};
use crate::week::{ReferenceZone, WeekKey};

/// Workouts logged in the current week against the goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyProgress {
    pub count: u32,
    pub goal: WeeklyGoal,
    /// Monday 00:00 of the current week.
    pub week_start: DateTime<Utc>,
    /// Sunday 23:59:59.999 of the current week.
    pub week_end: DateTime<Utc>,
}

impl WeeklyProgress {
    pub(crate) fn new(zone: &ReferenceZone, week: WeekKey, count: u32, goal: WeeklyGoal) -> Self {
        let (week_start, next_week_start) = week.bounds(zone);
        Self {
            count,
            goal,
            week_start,
            week_end: next_week_start - Duration::milliseconds(1),
        }
    }

    /// Whether the current week already qualifies.
    pub fn is_met(&self) -> bool {
        self.goal.is_met_by(self.count)
    }

    /// Workouts still needed this week; zero once the goal is met.
    pub fn remaining(&self) -> u32 {
        u32::from(self.goal.value()).saturating_sub(self.count)
    }
}

/// Streak state and weekly progress for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub user_id: UserId,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub weekly_progress: WeeklyProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    #[test]
    fn week_end_is_last_millisecond_of_sunday() {
        let week = WeekKey::for_day(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        let progress = WeeklyProgress::new(&ReferenceZone::Utc, week, 1, WeeklyGoal::DEFAULT);
        assert_eq!(
            progress.week_start,
            "2024-03-04T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(
            progress.week_end,
            "2024-03-10T23:59:59.999Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn remaining_saturates_at_zero() {
        let week = WeekKey::for_day(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        let goal = WeeklyGoal::new(2).unwrap();
        let behind = WeeklyProgress::new(&ReferenceZone::Utc, week, 1, goal);
        assert_eq!(behind.remaining(), 1);
        assert!(!behind.is_met());

        let ahead = WeeklyProgress::new(&ReferenceZone::Utc, week, 4, goal);
        assert_eq!(ahead.remaining(), 0);
        assert!(ahead.is_met());
    }
}
