//! The streak engine: ingestion guard, streak queries, watermark upkeep and
//! the leaderboard, over any [`WorkoutStore`] + [`ProfileStore`].
//!
//! Every read takes an explicit reference instant `now` so results are
//! reproducible; callers pass `Utc::now()` in production.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::adherence::{self, WeeklyCounts};
use crate::leaderboard::{self, LeaderboardRow};
use crate::profile::Profile;
use crate::progress::{StreakSummary, WeeklyProgress};
use crate::store::{ProfileStore, WorkoutStore};
use crate::streak;
use crate::types::{UserId, WeeklyGoal};
use crate::week::{ReferenceZone, WeekKey};
use crate::workout::{InsertOutcome, NewWorkout, Workout, WorkoutSource};

/// Engine errors.
#[derive(Debug, Error)]
pub enum StreakError {
    /// The user already logged a workout on this calendar day.
    #[error("a workout is already logged for {user_id} on {day}")]
    DuplicateDay { user_id: UserId, day: NaiveDate },
    /// The user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    /// The underlying store failed.
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StreakError {
    fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }

    /// Whether this is the recoverable "already logged today" rejection.
    pub const fn is_duplicate_day(&self) -> bool {
        matches!(self, Self::DuplicateDay { .. })
    }
}

/// Streak computations bound to a store and a reference timezone.
pub struct StreakEngine<S> {
    store: S,
    zone: ReferenceZone,
}

impl<S> StreakEngine<S> {
    pub const fn new(store: S, zone: ReferenceZone) -> Self {
        Self { store, zone }
    }

    pub const fn zone(&self) -> &ReferenceZone {
        &self.zone
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S> StreakEngine<S>
where
    S: WorkoutStore + ProfileStore,
{
    /// Fast-path duplicate check: false iff the user already has a workout on
    /// the calendar day of `at`.
    ///
    /// Not atomic with the insert; the store's uniqueness constraint is what
    /// actually guarantees one workout per day.
    pub fn can_ingest(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<bool, StreakError> {
        let day = self.zone.calendar_day(at);
        let exists = self
            .store
            .has_workout_on(user_id, day)
            .map_err(StreakError::store)?;
        Ok(!exists)
    }

    /// Records a workout, then raises the user's longest streak if needed.
    ///
    /// `workout_at` defaults to `now`. Once the insert succeeds the workout is
    /// returned even if the watermark refresh fails.
    pub fn log_workout(
        &mut self,
        user_id: &UserId,
        workout_at: Option<DateTime<Utc>>,
        source: WorkoutSource,
        now: DateTime<Utc>,
    ) -> Result<Workout, StreakError> {
        let workout_at = workout_at.unwrap_or(now);
        if self.load_profile(user_id)?.is_none() {
            return Err(StreakError::UserNotFound(user_id.clone()));
        }

        let day = self.zone.calendar_day(workout_at);
        if !self.can_ingest(user_id, workout_at)? {
            debug!(%user_id, %day, "workout rejected by duplicate-day guard");
            return Err(StreakError::DuplicateDay {
                user_id: user_id.clone(),
                day,
            });
        }

        let new = NewWorkout {
            user_id: user_id.clone(),
            workout_at,
            day,
            source,
        };
        let id = match self
            .store
            .insert_workout(&new)
            .map_err(StreakError::store)?
        {
            InsertOutcome::Inserted(id) => id,
            InsertOutcome::DuplicateDay => {
                // Lost a race with a concurrent insert for the same day.
                debug!(%user_id, %day, "workout rejected by store uniqueness constraint");
                return Err(StreakError::DuplicateDay {
                    user_id: user_id.clone(),
                    day,
                });
            }
        };

        // Already stored; the next successful refresh catches the watermark up.
        if let Err(err) = self.refresh_longest_streak(user_id, now) {
            warn!(%user_id, error = %err, "longest streak refresh failed after insert");
        }
        info!(%user_id, workout_id = %id, %day, %source, "workout logged");

        Ok(Workout {
            id,
            user_id: new.user_id,
            workout_at,
            day,
            source,
        })
    }

    /// Workout counts per week for the user's whole history.
    pub fn weekly_counts(&self, user_id: &UserId) -> Result<WeeklyCounts, StreakError> {
        let workouts = self
            .store
            .workouts_for_user(user_id)
            .map_err(StreakError::store)?;
        Ok(adherence::weekly_counts(
            &self.zone,
            workouts.iter().map(|w| w.workout_at),
        ))
    }

    /// Consecutive qualifying weeks ending at the week containing `now`.
    pub fn current_streak(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<u32, StreakError> {
        let goal = goal_of(self.load_profile(user_id)?.as_ref(), user_id);
        self.streak_for_goal(user_id, goal, now)
    }

    /// Raises the stored longest streak to the current streak if it is higher.
    ///
    /// Returns whether the watermark moved. A no-op for users without a
    /// profile. Safe to retry.
    pub fn refresh_longest_streak(
        &mut self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, StreakError> {
        let Some(profile) = self.load_profile(user_id)? else {
            return Ok(false);
        };
        let current = self.streak_for_goal(user_id, profile.weekly_goal, now)?;
        if current <= profile.longest_streak {
            return Ok(false);
        }

        let raised = self
            .store
            .raise_longest_streak(user_id, current)
            .map_err(StreakError::store)?;
        if raised {
            debug!(%user_id, previous = profile.longest_streak, current, "longest streak raised");
        }
        Ok(raised)
    }

    /// Workouts in the week containing `now` against the user's goal.
    pub fn weekly_progress(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<WeeklyProgress, StreakError> {
        let goal = goal_of(self.load_profile(user_id)?.as_ref(), user_id);
        self.progress_for_goal(user_id, goal, now)
    }

    /// Current streak, longest streak and weekly progress together.
    pub fn streak_summary(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<StreakSummary, StreakError> {
        let profile = self.load_profile(user_id)?;
        let goal = goal_of(profile.as_ref(), user_id);
        Ok(StreakSummary {
            user_id: user_id.clone(),
            current_streak: self.streak_for_goal(user_id, goal, now)?,
            longest_streak: profile.as_ref().map_or(0, |p| p.longest_streak),
            weekly_progress: self.progress_for_goal(user_id, goal, now)?,
        })
    }

    /// All users with at least one workout, most recently active first.
    pub fn leaderboard(&self, now: DateTime<Utc>) -> Result<Vec<LeaderboardRow>, StreakError> {
        let latest = self
            .store
            .last_workout_per_user()
            .map_err(StreakError::store)?;

        let mut rows = Vec::with_capacity(latest.len());
        for entry in latest {
            let profile = self.load_profile(&entry.user_id)?;
            let goal = goal_of(profile.as_ref(), &entry.user_id);
            let current_streak = self.streak_for_goal(&entry.user_id, goal, now)?;
            let (display_name, longest_streak) = profile.map_or_else(
                || (entry.user_id.to_string(), 0),
                |p| (p.username, p.longest_streak),
            );
            rows.push(LeaderboardRow {
                user_id: entry.user_id,
                display_name,
                last_workout_at: entry.last_workout_at,
                current_streak,
                longest_streak,
            });
        }

        leaderboard::rank(&mut rows);
        Ok(rows)
    }

    /// Updates the user's weekly goal, clamping it to \[1, 7\].
    pub fn set_weekly_goal(
        &mut self,
        user_id: &UserId,
        requested: i64,
    ) -> Result<WeeklyGoal, StreakError> {
        let goal = WeeklyGoal::clamped(requested);
        if i64::from(goal) != requested {
            warn!(%user_id, requested, applied = %goal, "weekly goal clamped");
        }
        let updated = self
            .store
            .set_weekly_goal(user_id, goal)
            .map_err(StreakError::store)?;
        if !updated {
            return Err(StreakError::UserNotFound(user_id.clone()));
        }
        Ok(goal)
    }

    fn load_profile(&self, user_id: &UserId) -> Result<Option<Profile>, StreakError> {
        self.store.profile(user_id).map_err(StreakError::store)
    }

    fn streak_for_goal(
        &self,
        user_id: &UserId,
        goal: WeeklyGoal,
        now: DateTime<Utc>,
    ) -> Result<u32, StreakError> {
        let counts = self.weekly_counts(user_id)?;
        Ok(streak::current_streak(
            &counts,
            goal,
            WeekKey::containing(&self.zone, now),
        ))
    }

    fn progress_for_goal(
        &self,
        user_id: &UserId,
        goal: WeeklyGoal,
        now: DateTime<Utc>,
    ) -> Result<WeeklyProgress, StreakError> {
        let week = WeekKey::containing(&self.zone, now);
        let (start, end) = week.bounds(&self.zone);
        let workouts = self
            .store
            .workouts_in_range(user_id, start, end)
            .map_err(StreakError::store)?;
        let count = u32::try_from(workouts.len()).unwrap_or(u32::MAX);
        Ok(WeeklyProgress::new(&self.zone, week, count, goal))
    }
}

/// Goal for a user; a missing profile falls back to the default goal.
fn goal_of(profile: Option<&Profile>, user_id: &UserId) -> WeeklyGoal {
    profile.map_or_else(
        || {
            debug!(%user_id, "no profile found, using default weekly goal");
            WeeklyGoal::DEFAULT
        },
        |p| p.weekly_goal,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use crate::store::LastWorkout;
    use crate::types::WorkoutId;

    #[derive(Debug, Error)]
    #[error("store unavailable")]
    struct StoreDown;

    /// In-memory store. `blind_guard` makes `has_workout_on` always report
    /// false, simulating a concurrent request that passed the guard.
    /// `fail_raise` makes every watermark write fail.
    #[derive(Default)]
    struct MemoryStore {
        profiles: HashMap<UserId, Profile>,
        workouts: Vec<Workout>,
        blind_guard: bool,
        fail_raise: bool,
    }

    impl MemoryStore {
        fn with_user(mut self, id: &str, goal: i64, longest: u32) -> Self {
            let user_id = UserId::new(id).unwrap();
            self.profiles.insert(
                user_id.clone(),
                Profile {
                    id: user_id,
                    username: format!("{id}-name"),
                    first_name: "Test".to_string(),
                    last_name: "User".to_string(),
                    weekly_goal: WeeklyGoal::new(goal).unwrap(),
                    longest_streak: longest,
                    created_at: utc("2024-01-01T00:00:00Z"),
                },
            );
            self
        }
    }

    impl WorkoutStore for MemoryStore {
        type Error = StoreDown;

        fn insert_workout(&mut self, workout: &NewWorkout) -> Result<InsertOutcome, StoreDown> {
            let taken = self
                .workouts
                .iter()
                .any(|w| w.user_id == workout.user_id && w.day == workout.day);
            if taken {
                return Ok(InsertOutcome::DuplicateDay);
            }
            let id = WorkoutId::new(i64::try_from(self.workouts.len()).unwrap() + 1);
            self.workouts.push(Workout {
                id,
                user_id: workout.user_id.clone(),
                workout_at: workout.workout_at,
                day: workout.day,
                source: workout.source,
            });
            Ok(InsertOutcome::Inserted(id))
        }

        fn workouts_for_user(&self, user_id: &UserId) -> Result<Vec<Workout>, StoreDown> {
            Ok(self
                .workouts
                .iter()
                .filter(|w| &w.user_id == user_id)
                .cloned()
                .collect())
        }

        fn workouts_in_range(
            &self,
            user_id: &UserId,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<Workout>, StoreDown> {
            Ok(self
                .workouts
                .iter()
                .filter(|w| &w.user_id == user_id && w.workout_at >= start && w.workout_at < end)
                .cloned()
                .collect())
        }

        fn has_workout_on(&self, user_id: &UserId, day: NaiveDate) -> Result<bool, StoreDown> {
            if self.blind_guard {
                return Ok(false);
            }
            Ok(self
                .workouts
                .iter()
                .any(|w| &w.user_id == user_id && w.day == day))
        }

        fn last_workout_per_user(&self) -> Result<Vec<LastWorkout>, StoreDown> {
            let mut latest: HashMap<UserId, DateTime<Utc>> = HashMap::new();
            for w in &self.workouts {
                let entry = latest.entry(w.user_id.clone()).or_insert(w.workout_at);
                *entry = (*entry).max(w.workout_at);
            }
            Ok(latest
                .into_iter()
                .map(|(user_id, last_workout_at)| LastWorkout {
                    user_id,
                    last_workout_at,
                })
                .collect())
        }
    }

    impl ProfileStore for MemoryStore {
        type Error = StoreDown;

        fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreDown> {
            Ok(self.profiles.get(user_id).cloned())
        }

        fn raise_longest_streak(&mut self, user_id: &UserId, value: u32) -> Result<bool, StoreDown> {
            if self.fail_raise {
                return Err(StoreDown);
            }
            Ok(match self.profiles.get_mut(user_id) {
                Some(p) if value > p.longest_streak => {
                    p.longest_streak = value;
                    true
                }
                _ => false,
            })
        }

        fn set_weekly_goal(&mut self, user_id: &UserId, goal: WeeklyGoal) -> Result<bool, StoreDown> {
            Ok(self.profiles.get_mut(user_id).is_some_and(|p| {
                p.weekly_goal = goal;
                true
            }))
        }
    }

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn engine(store: MemoryStore) -> StreakEngine<MemoryStore> {
        StreakEngine::new(store, ReferenceZone::Utc)
    }

    fn log(engine: &mut StreakEngine<MemoryStore>, user: &str, at: &str) {
        engine
            .log_workout(&uid(user), Some(utc(at)), WorkoutSource::Manual, utc(at))
            .unwrap();
    }

    fn longest(engine: &StreakEngine<MemoryStore>, user: &str) -> u32 {
        engine.store().profiles[&uid(user)].longest_streak
    }

    // Week 1 = Mon 2024-02-26, week 2 = Mon 2024-03-04.
    const NOW_WEEK_2: &str = "2024-03-07T12:00:00Z";

    #[test]
    fn two_qualifying_weeks_give_streak_of_two() {
        let mut e = engine(MemoryStore::default().with_user("a", 3, 0));
        for at in [
            "2024-02-26T08:00:00Z",
            "2024-02-27T08:00:00Z",
            "2024-02-28T08:00:00Z",
            "2024-03-04T08:00:00Z",
            "2024-03-05T08:00:00Z",
            "2024-03-06T08:00:00Z",
        ] {
            log(&mut e, "a", at);
        }
        assert_eq!(e.current_streak(&uid("a"), utc(NOW_WEEK_2)).unwrap(), 2);
        assert_eq!(longest(&e, "a"), 2);
    }

    #[test]
    fn short_current_week_gives_zero() {
        let mut e = engine(MemoryStore::default().with_user("a", 3, 0));
        for at in [
            "2024-02-26T08:00:00Z",
            "2024-02-27T08:00:00Z",
            "2024-02-28T08:00:00Z",
            "2024-03-04T08:00:00Z",
            "2024-03-05T08:00:00Z",
        ] {
            log(&mut e, "a", at);
        }
        assert_eq!(e.current_streak(&uid("a"), utc(NOW_WEEK_2)).unwrap(), 0);
        // Week 1 alone qualified when it was the current week.
        assert_eq!(longest(&e, "a"), 1);
    }

    #[test]
    fn gap_week_resets_chain() {
        let mut e = engine(MemoryStore::default().with_user("b", 1, 0));
        for at in [
            "2024-02-12T08:00:00Z",
            "2024-02-19T08:00:00Z",
            "2024-03-04T08:00:00Z",
        ] {
            log(&mut e, "b", at);
        }
        assert_eq!(e.current_streak(&uid("b"), utc(NOW_WEEK_2)).unwrap(), 1);
        assert_eq!(longest(&e, "b"), 2);
    }

    #[test]
    fn no_workouts_means_zero_streak() {
        let e = engine(MemoryStore::default().with_user("a", 1, 0));
        assert_eq!(e.current_streak(&uid("a"), utc(NOW_WEEK_2)).unwrap(), 0);
    }

    #[test]
    fn second_workout_same_day_is_rejected() {
        let mut e = engine(MemoryStore::default().with_user("c", 3, 0));
        log(&mut e, "c", "2024-03-04T08:00:00Z");

        let err = e
            .log_workout(
                &uid("c"),
                Some(utc("2024-03-04T20:00:00Z")),
                WorkoutSource::Manual,
                utc("2024-03-04T20:00:00Z"),
            )
            .unwrap_err();
        assert!(err.is_duplicate_day());
        assert!(matches!(
            err,
            StreakError::DuplicateDay { ref day, .. } if *day == NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
        ));
        assert_eq!(e.store().workouts.len(), 1);
    }

    #[test]
    fn store_constraint_catches_guard_race() {
        let mut store = MemoryStore::default().with_user("c", 3, 0);
        store.blind_guard = true;
        let mut e = engine(store);
        log(&mut e, "c", "2024-03-04T08:00:00Z");

        let err = e
            .log_workout(
                &uid("c"),
                Some(utc("2024-03-04T20:00:00Z")),
                WorkoutSource::WearableSync,
                utc("2024-03-04T20:00:00Z"),
            )
            .unwrap_err();
        assert!(err.is_duplicate_day());
        assert_eq!(e.store().workouts.len(), 1);
    }

    #[test]
    fn same_day_for_different_users_is_fine() {
        let mut e = engine(
            MemoryStore::default()
                .with_user("a", 1, 0)
                .with_user("b", 1, 0),
        );
        log(&mut e, "a", "2024-03-04T08:00:00Z");
        log(&mut e, "b", "2024-03-04T08:00:00Z");
        assert_eq!(e.store().workouts.len(), 2);
    }

    #[test]
    fn can_ingest_reflects_calendar_day() {
        let mut e = engine(MemoryStore::default().with_user("a", 1, 0));
        log(&mut e, "a", "2024-03-04T08:00:00Z");
        assert!(!e.can_ingest(&uid("a"), utc("2024-03-04T23:59:00Z")).unwrap());
        assert!(e.can_ingest(&uid("a"), utc("2024-03-05T00:00:00Z")).unwrap());
        assert!(e.can_ingest(&uid("b"), utc("2024-03-04T08:00:00Z")).unwrap());
    }

    #[test]
    fn logging_for_unknown_user_fails() {
        let mut e = engine(MemoryStore::default());
        let err = e
            .log_workout(&uid("ghost"), None, WorkoutSource::Manual, utc(NOW_WEEK_2))
            .unwrap_err();
        assert!(matches!(err, StreakError::UserNotFound(_)));
        assert!(e.store().workouts.is_empty());
    }

    #[test]
    fn workout_time_defaults_to_now() {
        let mut e = engine(MemoryStore::default().with_user("a", 1, 0));
        let workout = e
            .log_workout(&uid("a"), None, WorkoutSource::Manual, utc(NOW_WEEK_2))
            .unwrap();
        assert_eq!(workout.workout_at, utc(NOW_WEEK_2));
        assert_eq!(workout.day, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
    }

    #[test]
    fn longest_streak_is_kept_when_current_is_lower() {
        let mut e = engine(MemoryStore::default().with_user("d", 1, 5));
        for at in [
            "2024-02-19T08:00:00Z",
            "2024-02-26T08:00:00Z",
            "2024-03-04T08:00:00Z",
        ] {
            log(&mut e, "d", at);
        }
        assert_eq!(e.current_streak(&uid("d"), utc(NOW_WEEK_2)).unwrap(), 3);
        assert_eq!(longest(&e, "d"), 5);
    }

    #[test]
    fn longest_streak_rises_to_new_high() {
        let mut e = engine(MemoryStore::default().with_user("d", 1, 5));
        for week in 0..7 {
            let day = NaiveDate::from_ymd_opt(2024, 1, 22).unwrap() + chrono::Duration::weeks(week);
            log(&mut e, "d", &format!("{day}T08:00:00Z"));
        }
        assert_eq!(longest(&e, "d"), 7);
    }

    #[test]
    fn stale_refresh_never_lowers_watermark() {
        let mut e = engine(MemoryStore::default().with_user("d", 1, 0));
        for at in ["2024-02-26T08:00:00Z", "2024-03-04T08:00:00Z"] {
            log(&mut e, "d", at);
        }
        assert_eq!(longest(&e, "d"), 2);

        // Refresh with a reference instant where the streak is already broken.
        let raised = e
            .refresh_longest_streak(&uid("d"), utc("2024-04-01T00:00:00Z"))
            .unwrap();
        assert!(!raised);
        assert_eq!(longest(&e, "d"), 2);

        // A late compare-and-set with a smaller value is a no-op.
        assert!(!e.store_mut().raise_longest_streak(&uid("d"), 1).unwrap());
        assert_eq!(longest(&e, "d"), 2);
    }

    #[test]
    fn refresh_is_idempotent() {
        let mut e = engine(MemoryStore::default().with_user("d", 1, 0));
        log(&mut e, "d", "2024-03-04T08:00:00Z");
        assert!(!e.refresh_longest_streak(&uid("d"), utc(NOW_WEEK_2)).unwrap());
        assert_eq!(longest(&e, "d"), 1);
    }

    #[test]
    fn weekly_progress_counts_current_week_only() {
        let mut e = engine(MemoryStore::default().with_user("a", 4, 0));
        for at in [
            "2024-03-03T23:59:59Z",
            "2024-03-04T00:00:00Z",
            "2024-03-06T08:00:00Z",
        ] {
            log(&mut e, "a", at);
        }
        let progress = e.weekly_progress(&uid("a"), utc(NOW_WEEK_2)).unwrap();
        assert_eq!(progress.count, 2);
        assert_eq!(progress.goal.value(), 4);
        assert_eq!(progress.week_start, utc("2024-03-04T00:00:00Z"));
        assert_eq!(progress.week_end, utc("2024-03-10T23:59:59.999Z"));
    }

    #[test]
    fn missing_profile_uses_default_goal() {
        let mut store = MemoryStore::default();
        for at in [
            "2024-03-04T08:00:00Z",
            "2024-03-05T08:00:00Z",
            "2024-03-06T08:00:00Z",
        ] {
            let workout_at = utc(at);
            store
                .insert_workout(&NewWorkout {
                    user_id: uid("orphan"),
                    workout_at,
                    day: workout_at.date_naive(),
                    source: WorkoutSource::Manual,
                })
                .unwrap();
        }
        let mut e = engine(store);

        let progress = e.weekly_progress(&uid("orphan"), utc(NOW_WEEK_2)).unwrap();
        assert_eq!(progress.goal, WeeklyGoal::DEFAULT);
        assert_eq!(e.current_streak(&uid("orphan"), utc(NOW_WEEK_2)).unwrap(), 1);
        assert!(!e.refresh_longest_streak(&uid("orphan"), utc(NOW_WEEK_2)).unwrap());

        let board = e.leaderboard(utc(NOW_WEEK_2)).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].display_name, "orphan");
        assert_eq!(board[0].longest_streak, 0);
        assert_eq!(board[0].current_streak, 1);
    }

    #[test]
    fn leaderboard_excludes_idle_users_and_orders_by_recency() {
        let mut e = engine(
            MemoryStore::default()
                .with_user("early", 1, 0)
                .with_user("late", 1, 0)
                .with_user("idle", 1, 9)
                .with_user("tied", 1, 0),
        );
        log(&mut e, "early", "2024-03-04T08:00:00Z");
        log(&mut e, "late", "2024-02-26T08:00:00Z");
        log(&mut e, "late", "2024-03-06T08:00:00Z");
        log(&mut e, "tied", "2024-03-04T08:00:00Z");

        let board = e.leaderboard(utc(NOW_WEEK_2)).unwrap();
        let names: Vec<&str> = board.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, ["late-name", "early-name", "tied-name"]);
        assert!(
            board
                .windows(2)
                .all(|pair| pair[0].last_workout_at >= pair[1].last_workout_at)
        );
        assert_eq!(board[0].current_streak, 2);
        assert_eq!(board[0].longest_streak, 2);
        assert_eq!(board[0].last_workout_at, utc("2024-03-06T08:00:00Z"));
    }

    #[test]
    fn streak_summary_combines_views() {
        let mut e = engine(MemoryStore::default().with_user("a", 2, 4));
        log(&mut e, "a", "2024-03-04T08:00:00Z");
        let summary = e.streak_summary(&uid("a"), utc(NOW_WEEK_2)).unwrap();
        assert_eq!(summary.current_streak, 0);
        assert_eq!(summary.longest_streak, 4);
        assert_eq!(summary.weekly_progress.count, 1);
        assert_eq!(summary.weekly_progress.remaining(), 1);
    }

    #[test]
    fn set_weekly_goal_clamps() {
        let mut e = engine(MemoryStore::default().with_user("a", 3, 0));
        assert_eq!(e.set_weekly_goal(&uid("a"), 12).unwrap().value(), 7);
        assert_eq!(e.set_weekly_goal(&uid("a"), 0).unwrap().value(), 1);
        assert_eq!(e.set_weekly_goal(&uid("a"), 5).unwrap().value(), 5);
        let progress = e.weekly_progress(&uid("a"), utc(NOW_WEEK_2)).unwrap();
        assert_eq!(progress.goal.value(), 5);
    }

    #[test]
    fn set_weekly_goal_for_unknown_user_fails() {
        let mut e = engine(MemoryStore::default());
        assert!(matches!(
            e.set_weekly_goal(&uid("ghost"), 3),
            Err(StreakError::UserNotFound(_))
        ));
    }

    #[test]
    fn goal_change_applies_to_whole_history() {
        let mut e = engine(MemoryStore::default().with_user("a", 1, 0));
        for at in [
            "2024-02-26T08:00:00Z",
            "2024-03-04T08:00:00Z",
            "2024-03-05T08:00:00Z",
        ] {
            log(&mut e, "a", at);
        }
        assert_eq!(e.current_streak(&uid("a"), utc(NOW_WEEK_2)).unwrap(), 2);
        e.set_weekly_goal(&uid("a"), 2).unwrap();
        assert_eq!(e.current_streak(&uid("a"), utc(NOW_WEEK_2)).unwrap(), 1);
    }

    #[test]
    fn weeks_follow_reference_zone() {
        let store = MemoryStore::default().with_user("a", 1, 0);
        let mut e = StreakEngine::new(store, "+05:00".parse().unwrap());
        // Sunday 20:00 UTC is Monday 01:00 at +05:00.
        log(&mut e, "a", "2024-03-03T20:00:00Z");
        let progress = e.weekly_progress(&uid("a"), utc(NOW_WEEK_2)).unwrap();
        assert_eq!(progress.count, 1);
        assert_eq!(progress.week_start, utc("2024-03-03T19:00:00Z"));
    }

    #[test]
    fn failed_refresh_still_returns_stored_workout() {
        let mut store = MemoryStore::default().with_user("a", 1, 0);
        store.fail_raise = true;
        let mut e = engine(store);

        let workout = e
            .log_workout(
                &uid("a"),
                Some(utc("2024-02-26T08:00:00Z")),
                WorkoutSource::Manual,
                utc("2024-02-26T08:00:00Z"),
            )
            .unwrap();
        assert_eq!(workout.day, NaiveDate::from_ymd_opt(2024, 2, 26).unwrap());
        assert_eq!(e.store().workouts.len(), 1);
        assert_eq!(longest(&e, "a"), 0);

        e.store_mut().fail_raise = false;
        log(&mut e, "a", "2024-03-04T08:00:00Z");
        assert_eq!(longest(&e, "a"), 2);
    }
}
