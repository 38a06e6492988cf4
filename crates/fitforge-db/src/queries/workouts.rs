//! Database query functions for the `workouts` log.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::Workout;

/// Record a workout session for a user.
pub async fn insert_workout(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    date: DateTime<Utc>,
    notes: Option<&str>,
) -> Result<Workout> {
    let workout = sqlx::query_as::<_, Workout>(
        "INSERT INTO workouts (user_id, date, notes) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(date)
    .bind(notes)
    .fetch_one(executor)
    .await
    .context("failed to insert workout")?;

    Ok(workout)
}

/// List a user's workouts, most recent first.
pub async fn list_workouts_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Workout>> {
    let workouts = sqlx::query_as::<_, Workout>(
        "SELECT * FROM workouts WHERE user_id = $1 ORDER BY date DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list workouts")?;

    Ok(workouts)
}

/// Delete every logged workout.
pub async fn delete_all_workouts(executor: impl PgExecutor<'_>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM workouts")
        .execute(executor)
        .await
        .context("failed to delete workouts")?;

    Ok(result.rows_affected())
}
