use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Category of an exercise in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Strength,
    Cardio,
    Flexibility,
    Balance,
    Sports,
    Other,
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Strength => "strength",
            Self::Cardio => "cardio",
            Self::Flexibility => "flexibility",
            Self::Balance => "balance",
            Self::Sports => "sports",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for ExerciseCategory {
    type Err = ExerciseCategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strength" => Ok(Self::Strength),
            "cardio" => Ok(Self::Cardio),
            "flexibility" => Ok(Self::Flexibility),
            "balance" => Ok(Self::Balance),
            "sports" => Ok(Self::Sports),
            "other" => Ok(Self::Other),
            other => Err(ExerciseCategoryParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ExerciseCategory`] string.
#[derive(Debug, Clone)]
pub struct ExerciseCategoryParseError(pub String);

impl fmt::Display for ExerciseCategoryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid exercise category: {:?}", self.0)
    }
}

impl std::error::Error for ExerciseCategoryParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

/// A generated weekly workout plan owned by a user.
///
/// `routine_json` holds the weekday -> workout mapping produced by the
/// generator, stored as JSONB.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goals: String,
    pub routine_json: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// An entry in the exercise catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub category: ExerciseCategory,
    pub description: Option<String>,
}

/// A logged workout session.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// A logged running session.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Run {
    pub id: Uuid,
    pub user_id: Uuid,
    pub distance_km: f64,
    pub duration_seconds: i32,
    pub date: DateTime<Utc>,
}

impl Run {
    /// Average pace in minutes per kilometre.
    pub fn pace_min_per_km(&self) -> f64 {
        f64::from(self.duration_seconds) / self.distance_km / 60.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
