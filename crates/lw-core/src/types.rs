//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The weekly goal was outside the allowed range.
    #[error(
        "weekly goal must be between {min} and {max}, got {value}",
        min = WeeklyGoal::MIN.value(),
        max = WeeklyGoal::MAX.value()
    )]
    WeeklyGoalOutOfRange { value: i64 },

    /// Unknown workout source value.
    #[error("invalid workout source: {value}")]
    InvalidWorkoutSource { value: String },

    /// Unparseable reference timezone.
    #[error("invalid timezone: {value} (expected 'local', 'utc', or an offset like '+02:00')")]
    InvalidTimeZone { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated user identifier.
    ///
    /// User IDs are opaque, non-empty and immutable. The storage layer issues
    /// UUIDs, but any non-empty string is accepted so fixtures stay readable.
    UserId, "user ID"
);

/// Store-assigned workout identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(i64);

impl WorkoutId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimum number of workouts per week for that week to count toward a streak.
///
/// Always within \[1, 7\]: one workout per calendar day caps a week at seven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeeklyGoal(u8);

impl WeeklyGoal {
    /// The smallest allowed goal.
    pub const MIN: Self = Self(1);

    /// The largest allowed goal.
    pub const MAX: Self = Self(7);

    /// Goal assigned to users who never set one.
    pub const DEFAULT: Self = Self(3);

    /// Creates a goal after validation.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        match u8::try_from(value) {
            Ok(v) if (Self::MIN.0..=Self::MAX.0).contains(&v) => Ok(Self(v)),
            _ => Err(ValidationError::WeeklyGoalOutOfRange { value }),
        }
    }

    /// Creates a goal, clamping to \[1, 7\].
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "value is clamped into 1..=7 first"
        )]
        let v = value.clamp(i64::from(Self::MIN.0), i64::from(Self::MAX.0)) as u8;
        Self(v)
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether a week with `count` workouts meets this goal.
    #[must_use]
    pub fn is_met_by(self, count: u32) -> bool {
        count >= u32::from(self.0)
    }
}

impl Default for WeeklyGoal {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for WeeklyGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for WeeklyGoal {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WeeklyGoal> for i64 {
    fn from(goal: WeeklyGoal) -> Self {
        Self::from(goal.0)
    }
}

impl Serialize for WeeklyGoal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WeeklyGoal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}
