//! Integration tests for the plan service against a real database.

use uuid::Uuid;

use fitforge_core::plan::{PlanRequest, PlanServiceError, Weekday, service};
use fitforge_db::queries::users;
use fitforge_test_utils::{create_test_db, drop_test_db};

async fn insert_user(pool: &sqlx::PgPool, email: &str) -> Uuid {
    users::insert_user(pool, "Athlete", email, "hash")
        .await
        .expect("insert_user should succeed")
        .id
}

fn request(goal: &str, days_per_week: u8, run_days: u8, lift_days: u8) -> PlanRequest {
    PlanRequest {
        goal: goal.to_string(),
        days_per_week,
        run_days,
        lift_days,
    }
}

#[tokio::test]
async fn create_plan_stores_generated_schedule() {
    let (pool, db_name) = create_test_db().await;
    let user_id = insert_user(&pool, "lifter@example.com").await;

    let plan = service::create_plan(&pool, user_id, &request("build muscle", 5, 2, 3))
        .await
        .expect("create_plan should succeed");

    assert_eq!(plan.user_id, user_id);
    assert_eq!(plan.goals, "build muscle - 5 days/week (3 lift, 2 run)");

    let schedule = &plan.routine_json;
    assert_eq!(schedule.len(), 7);
    assert_eq!(schedule.get(Weekday::Monday), Some("Upper Body - Chest & Triceps"));
    assert_eq!(schedule.get(Weekday::Friday), Some("Run 4km - Recovery Pace"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn create_plan_rejects_too_many_days_without_storing() {
    let (pool, db_name) = create_test_db().await;
    let user_id = insert_user(&pool, "eager@example.com").await;

    let err = service::create_plan(&pool, user_id, &request("run faster", 3, 3, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanServiceError::TooManyDays { .. }));

    let plans = service::list_plans(&pool, user_id).await.unwrap();
    assert!(plans.is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn list_plans_is_scoped_and_newest_first() {
    let (pool, db_name) = create_test_db().await;
    let alice = insert_user(&pool, "alice@example.com").await;
    let bob = insert_user(&pool, "bob@example.com").await;

    let first = service::create_plan(&pool, alice, &request("run faster", 3, 3, 0))
        .await
        .unwrap();
    let second = service::create_plan(&pool, alice, &request("balance", 4, 0, 0))
        .await
        .unwrap();
    service::create_plan(&pool, bob, &request("build muscle", 2, 0, 2))
        .await
        .unwrap();

    let plans = service::list_plans(&pool, alice).await.unwrap();
    let ids: Vec<Uuid> = plans.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn ownership_is_enforced() {
    let (pool, db_name) = create_test_db().await;
    let owner = insert_user(&pool, "owner@example.com").await;
    let intruder = insert_user(&pool, "intruder@example.com").await;

    let plan = service::create_plan(&pool, owner, &request("balance", 3, 0, 0))
        .await
        .unwrap();

    let fetched = service::get_owned_plan(&pool, owner, plan.id).await.unwrap();
    assert_eq!(fetched.id, plan.id);
    // Read back from JSONB, the routine still iterates Monday first.
    assert_eq!(fetched.routine_json, plan.routine_json);
    let json = serde_json::to_string(&fetched.routine_json).unwrap();
    assert!(json.starts_with("{\"Monday\":"));

    let err = service::get_owned_plan(&pool, intruder, plan.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Not authorized to view this plan");

    let err = service::delete_owned_plan(&pool, intruder, plan.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Not authorized to delete this plan");

    service::delete_owned_plan(&pool, owner, plan.id)
        .await
        .expect("owner may delete");

    let err = service::get_owned_plan(&pool, owner, plan.id)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanServiceError::NotFound(id) if id == plan.id));

    let err = service::delete_owned_plan(&pool, owner, plan.id)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanServiceError::NotFound(id) if id == plan.id));
    assert_eq!(err.to_string(), "Plan not found");

    pool.close().await;
    drop_test_db(&db_name).await;
}
