//! Weekly schedule generation.
//!
//! A table-driven mapping from a goal and day counts to a weekday -> workout
//! assignment. This module contains pure logic (no I/O, no shared state) and
//! may be called from any number of request handlers concurrently.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Description given to days filled from the rest budget.
pub const REST_DAY: &str = "Rest Day";

const LIFT_WORKOUTS: [&str; 5] = [
    "Upper Body - Chest & Triceps",
    "Lower Body - Legs & Glutes",
    "Back & Biceps",
    "Shoulders & Core",
    "Full Body Strength",
];

const RUN_WORKOUTS: [&str; 6] = [
    "Run 5km - Tempo Pace",
    "Run 8km - Easy Pace",
    "Interval Training - 400m Repeats",
    "Run 10km - Long Run",
    "Hill Sprints - Speed Work",
    "Run 6km - Recovery Run",
];

const LIFT_SUPPORT_WORKOUTS: [&str; 3] = [
    "Lower Body Strength - Legs",
    "Core & Stability",
    "Upper Body Maintenance",
];

const BALANCED_WORKOUTS: [&str; 7] = [
    "Full Body Workout",
    "Run 5km",
    "Upper Body Strength",
    "Run 3km - Easy",
    "Lower Body Strength",
    "Active Recovery - Yoga/Stretching",
    "Sports or Cross-Training",
];

/// First distance of the recovery runs added to a muscle-building week.
const RECOVERY_RUN_START_KM: usize = 3;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Day of the week, ordered Monday first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Every weekday in schedule order.
    pub const ALL: [Weekday; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = WeekdayParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|day| day.name() == s)
            .ok_or_else(|| WeekdayParseError(s.to_owned()))
    }
}

/// Error returned when parsing an invalid [`Weekday`] string.
#[derive(Debug, Clone)]
pub struct WeekdayParseError(pub String);

impl fmt::Display for WeekdayParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid weekday: {:?}", self.0)
    }
}

impl std::error::Error for WeekdayParseError {}

/// Training goal, resolved once from the caller's free-text label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    /// Lifting first, recovery runs on the remaining days.
    BuildMuscle,
    /// Running first, supporting strength work on the remaining days.
    RunFaster,
    /// Any other label: a balanced rotation that ignores run/lift counts.
    Other,
}

impl Goal {
    /// Resolve a label case-insensitively. Unknown labels map to
    /// [`Goal::Other`]; this never fails.
    pub fn resolve(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "build muscle" => Self::BuildMuscle,
            "run faster" => Self::RunFaster,
            _ => Self::Other,
        }
    }
}

/// Day counts requested for a week.
///
/// Callers are expected to ensure `run_days + lift_days <= days_per_week`;
/// [`generate`] does not re-check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayConstraints {
    pub days_per_week: u8,
    pub run_days: u8,
    pub lift_days: u8,
}

impl DayConstraints {
    pub fn new(days_per_week: u8, run_days: u8, lift_days: u8) -> Self {
        Self {
            days_per_week,
            run_days,
            lift_days,
        }
    }

    /// Number of weekdays that may be marked [`REST_DAY`].
    pub fn rest_budget(&self) -> u8 {
        7u8.saturating_sub(self.days_per_week)
    }
}

/// Weekday -> workout description, iterated Monday first.
///
/// A weekday may be absent when the requested counts and the rest budget do
/// not cover the whole week.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule(BTreeMap<Weekday, String>);

impl Schedule {
    pub fn get(&self, day: Weekday) -> Option<&str> {
        self.0.get(&day).map(String::as_str)
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains_key(&day)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &str)> {
        self.0.iter().map(|(day, workout)| (*day, workout.as_str()))
    }

    /// Assign `table[i mod len]` to the first `count` weekdays.
    fn fill_leading(&mut self, count: u8, table: &[&str]) {
        for (i, day) in Weekday::ALL.iter().take(usize::from(count)).enumerate() {
            self.0.insert(*day, table[i % table.len()].to_owned());
        }
    }

    /// Walk the week in order and give up to `limit` unassigned weekdays the
    /// description produced for their 0-based fill index.
    fn fill_open(&mut self, limit: usize, mut describe: impl FnMut(usize) -> String) {
        let mut filled = 0;
        for day in Weekday::ALL {
            if filled >= limit {
                break;
            }
            if !self.0.contains_key(&day) {
                self.0.insert(day, describe(filled));
                filled += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Build the weekly schedule for `goal` under `days`.
///
/// Deterministic and total: inputs outside the documented ranges produce a
/// partially filled schedule rather than an error.
pub fn generate(goal: Goal, days: DayConstraints) -> Schedule {
    let mut schedule = Schedule::default();

    match goal {
        Goal::BuildMuscle => {
            schedule.fill_leading(days.lift_days.min(days.days_per_week), &LIFT_WORKOUTS);
            schedule.fill_open(usize::from(days.run_days), |k| {
                format!("Run {}km - Recovery Pace", RECOVERY_RUN_START_KM + k)
            });
        }
        Goal::RunFaster => {
            schedule.fill_leading(days.run_days.min(days.days_per_week), &RUN_WORKOUTS);
            schedule.fill_open(usize::from(days.lift_days), |k| {
                LIFT_SUPPORT_WORKOUTS[k % LIFT_SUPPORT_WORKOUTS.len()].to_owned()
            });
        }
        Goal::Other => schedule.fill_leading(days.days_per_week, &BALANCED_WORKOUTS),
    }

    schedule.fill_open(usize::from(days.rest_budget()), |_| REST_DAY.to_owned());
    schedule
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
