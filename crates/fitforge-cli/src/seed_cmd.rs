//! `fitforge seed`: demo data for local development.

use anyhow::{Context, Result, bail};
use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use fitforge_core::auth;
use fitforge_db::models::{ExerciseCategory, User};
use fitforge_db::queries::{exercises, runs, users, workouts};

pub const DEMO_NAME: &str = "John Doe";
pub const DEMO_EMAIL: &str = "john.doe@example.com";
pub const DEMO_PASSWORD: &str = "password123";

/// What a seed run did.
#[derive(Debug, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Users already existed and `--force` was not given.
    Skipped { existing_users: i64 },
    Seeded,
}

pub async fn run_seed(pool: &PgPool, force: bool, clear: bool, yes: bool) -> Result<()> {
    if clear {
        if !yes {
            bail!("--clear deletes every user, plan, workout, run and exercise; re-run with --yes to confirm");
        }
        clear_all(pool).await?;
        println!("Database cleared.");
        return Ok(());
    }

    match seed(pool, force).await? {
        SeedOutcome::Skipped { existing_users } => {
            println!("Database already contains {existing_users} user(s).");
            println!("  Use --force to add demo data anyway.");
            println!("  Use --clear --yes to delete existing data first.");
        }
        SeedOutcome::Seeded => {
            println!("Demo data created.");
            println!("  Login: {DEMO_EMAIL} / {DEMO_PASSWORD}");
            println!();
            println!("Summary:");
            for (table, count) in fitforge_db::pool::table_counts(pool).await? {
                println!("  {table}: {count} rows");
            }
        }
    }
    Ok(())
}

/// Insert the demo user, two catalog exercises, a workout from yesterday and
/// a run from two days ago.
///
/// Everything runs in one transaction: a failure part way through leaves the
/// database as it was. With `force`, an existing demo user is reused rather
/// than duplicated.
pub async fn seed(pool: &PgPool, force: bool) -> Result<SeedOutcome> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let existing_users = users::count_users(&mut *tx).await?;
    if existing_users > 0 && !force {
        return Ok(SeedOutcome::Skipped { existing_users });
    }

    let user = demo_user(&mut tx).await?;

    exercises::insert_exercise(
        &mut *tx,
        "Bench Press",
        ExerciseCategory::Strength,
        Some(
            "A strength training exercise for the chest, shoulders, and triceps. \
             Lie on a bench and press a weighted barbell upward.",
        ),
    )
    .await?;
    exercises::insert_exercise(
        &mut *tx,
        "5K Run",
        ExerciseCategory::Cardio,
        Some("A 5-kilometer running workout for cardiovascular endurance and stamina building."),
    )
    .await?;

    let now = Utc::now();
    let workout = workouts::insert_workout(
        &mut *tx,
        user.id,
        now - Duration::days(1),
        Some("Great chest day! Increased weight by 5 lbs on bench press. Felt strong and energized."),
    )
    .await?;
    let run = runs::insert_run(&mut *tx, user.id, 5.2, 1680, now - Duration::days(2)).await?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        user_id = %user.id,
        workout_id = %workout.id,
        run_id = %run.id,
        pace_min_per_km = run.pace_min_per_km(),
        "demo data seeded"
    );
    Ok(SeedOutcome::Seeded)
}

async fn demo_user(tx: &mut Transaction<'_, Postgres>) -> Result<User> {
    if let Some(user) = users::get_user_by_email(&mut **tx, DEMO_EMAIL).await? {
        return Ok(user);
    }
    let hashed = auth::hash_password(DEMO_PASSWORD)?;
    users::insert_user(&mut **tx, DEMO_NAME, DEMO_EMAIL, &hashed).await
}

/// Delete all application data in one transaction. Plans go with their users.
pub async fn clear_all(pool: &PgPool) -> Result<()> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let runs = runs::delete_all_runs(&mut *tx).await?;
    let workouts = workouts::delete_all_workouts(&mut *tx).await?;
    let exercises = exercises::delete_all_exercises(&mut *tx).await?;
    let users = users::delete_all_users(&mut *tx).await?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(runs, workouts, exercises, users, "database cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitforge_test_utils::{create_test_db, drop_test_db};

    #[tokio::test]
    async fn seed_populates_empty_database() {
        let (pool, db_name) = create_test_db().await;

        assert_eq!(seed(&pool, false).await.unwrap(), SeedOutcome::Seeded);

        let user = users::get_user_by_email(&pool, DEMO_EMAIL)
            .await
            .unwrap()
            .expect("demo user should exist");
        assert_eq!(user.name, DEMO_NAME);
        assert!(auth::verify_password(DEMO_PASSWORD, &user.hashed_password).unwrap());

        let catalog = exercises::list_exercises(&pool, None).await.unwrap();
        assert_eq!(catalog.len(), 2);
        let cardio = exercises::list_exercises(&pool, Some(ExerciseCategory::Cardio))
            .await
            .unwrap();
        assert_eq!(cardio[0].name, "5K Run");

        let logged_runs = runs::list_runs_for_user(&pool, user.id).await.unwrap();
        assert_eq!(logged_runs.len(), 1);
        assert_eq!(logged_runs[0].duration_seconds, 1680);
        assert_eq!(
            workouts::list_workouts_for_user(&pool, user.id)
                .await
                .unwrap()
                .len(),
            1
        );

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn seed_refuses_existing_users_without_force() {
        let (pool, db_name) = create_test_db().await;
        seed(&pool, false).await.unwrap();

        assert_eq!(
            seed(&pool, false).await.unwrap(),
            SeedOutcome::Skipped { existing_users: 1 }
        );

        // Forcing reuses the demo user and adds another round of log data.
        assert_eq!(seed(&pool, true).await.unwrap(), SeedOutcome::Seeded);
        assert_eq!(users::count_users(&pool).await.unwrap(), 1);
        assert_eq!(exercises::list_exercises(&pool, None).await.unwrap().len(), 4);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn clear_requires_confirmation_and_empties_tables() {
        let (pool, db_name) = create_test_db().await;
        seed(&pool, false).await.unwrap();

        let err = run_seed(&pool, false, true, false).await.unwrap_err();
        assert!(err.to_string().contains("--yes"));
        assert_eq!(users::count_users(&pool).await.unwrap(), 1);

        run_seed(&pool, false, true, true).await.unwrap();
        for (table, count) in fitforge_db::pool::table_counts(&pool).await.unwrap() {
            assert_eq!(count, 0, "{table} should be empty");
        }

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn failed_seed_leaves_no_partial_data() {
        let (pool, db_name) = create_test_db().await;

        // Reject every run so the last insert of the seed fails.
        sqlx::query("ALTER TABLE runs ADD CONSTRAINT runs_closed CHECK (duration_seconds < 0)")
            .execute(&pool)
            .await
            .unwrap();

        let err = seed(&pool, false).await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to insert run"));

        assert_eq!(users::count_users(&pool).await.unwrap(), 0);
        for (table, count) in fitforge_db::pool::table_counts(&pool).await.unwrap() {
            assert_eq!(count, 0, "{table} should be empty");
        }

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn failed_clear_keeps_all_data() {
        let (pool, db_name) = create_test_db().await;
        seed(&pool, false).await.unwrap();

        // Block user deletion so clearing fails after the log tables are emptied.
        sqlx::query(
            "CREATE FUNCTION reject_delete() RETURNS trigger AS $$ \
             BEGIN RAISE EXCEPTION 'users are locked'; END \
             $$ LANGUAGE plpgsql",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TRIGGER users_locked BEFORE DELETE ON users \
             FOR EACH ROW EXECUTE FUNCTION reject_delete()",
        )
        .execute(&pool)
        .await
        .unwrap();

        assert!(clear_all(&pool).await.is_err());

        let user = users::get_user_by_email(&pool, DEMO_EMAIL)
            .await
            .unwrap()
            .expect("demo user should survive");
        assert_eq!(runs::list_runs_for_user(&pool, user.id).await.unwrap().len(), 1);
        assert_eq!(exercises::list_exercises(&pool, None).await.unwrap().len(), 2);

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
