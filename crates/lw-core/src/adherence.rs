//! Per-week workout counts.
//!
//! Counts are recomputed from the full workout history on every call. Weeks
//! without workouts are absent from the map; callers treat absence as zero.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::week::{ReferenceZone, WeekKey};

/// Workout counts keyed by week. Unordered.
pub type WeeklyCounts = HashMap<WeekKey, u32>;

/// Buckets workout instants into weeks and counts them.
pub fn weekly_counts<I>(zone: &ReferenceZone, instants: I) -> WeeklyCounts
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut counts = WeeklyCounts::new();
    for at in instants {
        *counts.entry(WeekKey::containing(zone, at)).or_default() += 1;
    }
    counts
}

/// Count for `week`, treating an absent week as zero.
pub fn count_for(counts: &WeeklyCounts, week: WeekKey) -> u32 {
    counts.get(&week).copied().unwrap_or(0)
}
