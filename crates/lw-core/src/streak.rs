//! Current streak calculation.
//!
//! A streak is the number of consecutive qualifying weeks ending at, and
//! including, the current week. A week qualifies when its workout count meets
//! the weekly goal.
//!
//! The walk is always anchored at the current week. A current week that has
//! not yet met the goal breaks the streak at 0, even if every earlier week
//! qualified; there is no skipping back to the last qualifying week.

use crate::adherence::{WeeklyCounts, count_for};
use crate::types::WeeklyGoal;
use crate::week::WeekKey;

/// Counts consecutive qualifying weeks walking backward from `current`.
pub fn current_streak(counts: &WeeklyCounts, goal: WeeklyGoal, current: WeekKey) -> u32 {
    if counts.is_empty() {
        return 0;
    }

    let mut streak = 0;
    let mut week = current;
    // Terminates: only finitely many weeks have a non-zero count.
    while goal.is_met_by(count_for(counts, week)) {
        streak += 1;
        week = week.previous();
    }
    streak
}
