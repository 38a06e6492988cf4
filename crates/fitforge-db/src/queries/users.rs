//! Database query functions for the `users` table.

use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::User;

/// Insert a new user row. Returns the inserted user with server-generated
/// defaults (id, created_at).
///
/// The `email` column is unique; inserting a duplicate surfaces the
/// underlying `sqlx::Error` (reachable through `downcast_ref`) so callers
/// can distinguish a conflict from other failures.
pub async fn insert_user(
    executor: impl PgExecutor<'_>,
    name: &str,
    email: &str,
    hashed_password: &str,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, hashed_password) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(hashed_password)
    .fetch_one(executor)
    .await
    .context("failed to insert user")?;

    Ok(user)
}

/// Fetch a user by ID.
pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// Fetch a user by email address (exact match).
pub async fn get_user_by_email(
    executor: impl PgExecutor<'_>,
    email: &str,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(executor)
        .await
        .context("failed to fetch user by email")?;

    Ok(user)
}

/// Return the earliest-registered user, if any.
pub async fn first_user(pool: &PgPool) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at, id LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("failed to fetch first user")?;

    Ok(user)
}

/// Count all registered users.
pub async fn count_users(executor: impl PgExecutor<'_>) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(executor)
        .await
        .context("failed to count users")?;

    Ok(count)
}

/// Delete every user. Owned plans, workouts and runs cascade.
pub async fn delete_all_users(executor: impl PgExecutor<'_>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM users")
        .execute(executor)
        .await
        .context("failed to delete users")?;

    Ok(result.rows_affected())
}
