//! Workout events and their sources.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{UserId, ValidationError, WorkoutId};

/// Where a workout event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkoutSource {
    /// Logged by hand.
    #[default]
    Manual,
    /// Pushed by an external device or health platform.
    ExternalDevice,
    /// Synced from a wearable.
    WearableSync,
}

impl WorkoutSource {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::ExternalDevice => "external_device",
            Self::WearableSync => "wearable_sync",
        }
    }
}

impl fmt::Display for WorkoutSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkoutSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "external_device" | "external-device" | "apple_health" => Ok(Self::ExternalDevice),
            "wearable_sync" | "wearable-sync" | "watch" => Ok(Self::WearableSync),
            _ => Err(ValidationError::InvalidWorkoutSource {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for WorkoutSource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WorkoutSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A stored workout event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub user_id: UserId,
    /// When the workout happened.
    pub workout_at: DateTime<Utc>,
    /// Calendar day of `workout_at` in the engine's reference timezone.
    pub day: NaiveDate,
    pub source: WorkoutSource,
}

/// A workout ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkout {
    pub user_id: UserId,
    pub workout_at: DateTime<Utc>,
    pub day: NaiveDate,
    pub source: WorkoutSource,
}

/// Result of handing a workout to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(WorkoutId),
    /// The store already holds a workout for this user on this day.
    DuplicateDay,
}
