//! Database query functions for the `runs` log.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::Run;

/// Record a run for a user. Distance and duration must be positive; the
/// table's CHECK constraints reject anything else.
pub async fn insert_run(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    distance_km: f64,
    duration_seconds: i32,
    date: DateTime<Utc>,
) -> Result<Run> {
    let run = sqlx::query_as::<_, Run>(
        "INSERT INTO runs (user_id, distance_km, duration_seconds, date) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(distance_km)
    .bind(duration_seconds)
    .bind(date)
    .fetch_one(executor)
    .await
    .context("failed to insert run")?;

    Ok(run)
}

/// List a user's runs, most recent first.
pub async fn list_runs_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Run>> {
    let runs =
        sqlx::query_as::<_, Run>("SELECT * FROM runs WHERE user_id = $1 ORDER BY date DESC")
            .bind(user_id)
            .fetch_all(pool)
            .await
            .context("failed to list runs")?;

    Ok(runs)
}

/// Delete every logged run.
pub async fn delete_all_runs(executor: impl PgExecutor<'_>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM runs")
        .execute(executor)
        .await
        .context("failed to delete runs")?;

    Ok(result.rows_affected())
}
