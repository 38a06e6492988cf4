//! Database query functions for the `exercises` catalog.

use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool};

use crate::models::{Exercise, ExerciseCategory};

/// Insert a catalog entry.
pub async fn insert_exercise(
    executor: impl PgExecutor<'_>,
    name: &str,
    category: ExerciseCategory,
    description: Option<&str>,
) -> Result<Exercise> {
    let exercise = sqlx::query_as::<_, Exercise>(
        "INSERT INTO exercises (name, category, description) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(name)
    .bind(category)
    .bind(description)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert exercise {name:?}"))?;

    Ok(exercise)
}

/// List the catalog, optionally restricted to one category, ordered by name.
pub async fn list_exercises(
    pool: &PgPool,
    category: Option<ExerciseCategory>,
) -> Result<Vec<Exercise>> {
    let exercises = match category {
        Some(category) => {
            sqlx::query_as::<_, Exercise>(
                "SELECT * FROM exercises WHERE category = $1 ORDER BY name",
            )
            .bind(category)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Exercise>("SELECT * FROM exercises ORDER BY name")
                .fetch_all(pool)
                .await
        }
    }
    .context("failed to list exercises")?;

    Ok(exercises)
}

/// Delete the whole catalog.
pub async fn delete_all_exercises(executor: impl PgExecutor<'_>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM exercises")
        .execute(executor)
        .await
        .context("failed to delete exercises")?;

    Ok(result.rows_affected())
}
