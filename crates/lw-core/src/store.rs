//! Storage collaborators consumed by the engine.
//!
//! These traits let the engine run against the `SQLite` store in `lw-db` or
//! against in-memory fixtures in tests.

use chrono::{DateTime, NaiveDate, Utc};

use crate::profile::Profile;
use crate::types::{UserId, WeeklyGoal};
use crate::workout::{InsertOutcome, NewWorkout, Workout};

/// Latest workout instant for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastWorkout {
    pub user_id: UserId,
    pub last_workout_at: DateTime<Utc>,
}

/// Append-only workout event collection.
pub trait WorkoutStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Inserts a workout.
    ///
    /// Implementations must enforce uniqueness of `(user_id, day)` atomically
    /// and report a conflict as [`InsertOutcome::DuplicateDay`].
    fn insert_workout(&mut self, workout: &NewWorkout) -> Result<InsertOutcome, Self::Error>;

    /// All workouts for a user, oldest first.
    fn workouts_for_user(&self, user_id: &UserId) -> Result<Vec<Workout>, Self::Error>;

    /// Workouts for a user with `start <= workout_at < end`, oldest first.
    fn workouts_in_range(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Workout>, Self::Error>;

    /// Whether the user already has a workout on `day`.
    fn has_workout_on(&self, user_id: &UserId, day: NaiveDate) -> Result<bool, Self::Error>;

    /// Latest workout instant for every user with at least one workout.
    fn last_workout_per_user(&self) -> Result<Vec<LastWorkout>, Self::Error>;
}

/// User profile collection.
pub trait ProfileStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, Self::Error>;

    /// Sets `longest_streak = value` only if `value` is strictly greater than
    /// the stored value at write time. Returns whether a write happened.
    ///
    /// Must be a single atomic compare-and-set so concurrent callers can never
    /// lower the watermark, and retries are no-ops.
    fn raise_longest_streak(&mut self, user_id: &UserId, value: u32) -> Result<bool, Self::Error>;

    /// Returns `false` if the user does not exist.
    fn set_weekly_goal(&mut self, user_id: &UserId, goal: WeeklyGoal)
    -> Result<bool, Self::Error>;
}
