//! Database query functions for the `plans` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Plan;

/// Insert a new plan row. Returns the inserted plan with server-generated
/// defaults (id, created_at).
pub async fn insert_plan(
    pool: &PgPool,
    user_id: Uuid,
    goals: &str,
    routine_json: &serde_json::Value,
) -> Result<Plan> {
    let plan = sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (user_id, goals, routine_json) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(goals)
    .bind(routine_json)
    .fetch_one(pool)
    .await
    .context("failed to insert plan")?;

    Ok(plan)
}

/// Fetch a plan by its ID, regardless of owner.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// List a user's plans, ordered by creation time (newest first).
pub async fn list_plans_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Plan>> {
    let plans = sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE user_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list plans")?;

    Ok(plans)
}

/// Delete a plan by ID. Returns the number of rows removed (0 or 1).
pub async fn delete_plan(pool: &PgPool, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM plans WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete plan")?;

    Ok(result.rows_affected())
}
