//! Plan service layer.
//!
//! Validates a plan request, runs the generator, and stores the result for
//! the requesting user. Ownership checks for reading and deleting plans live
//! here so every caller enforces them the same way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use fitforge_db::models::Plan;
use fitforge_db::queries::plans as plan_queries;

use super::generate::{DayConstraints, Goal, Schedule, generate};
use crate::validation;

/// Errors surfaced by plan operations.
#[derive(Debug, thiserror::Error)]
pub enum PlanServiceError {
    /// A field is out of range.
    #[error("{0}")]
    Validation(String),

    /// More run and lift days were requested than training days.
    #[error(
        "Total workout days (run_days: {run} + lift_days: {lift}) cannot exceed days_per_week: {days}"
    )]
    TooManyDays { run: u8, lift: u8, days: u8 },

    #[error("Plan not found")]
    NotFound(Uuid),

    /// The plan exists but belongs to another user. Carries the attempted
    /// action ("view" or "delete").
    #[error("Not authorized to {0} this plan")]
    Forbidden(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// A stored plan with its schedule decoded.
///
/// JSONB does not keep key order, so the routine is re-typed on the way out
/// to serialize Monday first.
#[derive(Debug, Clone, Serialize)]
pub struct StoredPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goals: String,
    pub routine_json: Schedule,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<Plan> for StoredPlan {
    type Error = PlanServiceError;

    fn try_from(plan: Plan) -> Result<Self, Self::Error> {
        let routine_json = serde_json::from_value(plan.routine_json).map_err(|e| {
            anyhow::Error::from(e).context(format!("plan {} has a malformed routine", plan.id))
        })?;
        Ok(Self {
            id: plan.id,
            user_id: plan.user_id,
            goals: plan.goals,
            routine_json,
            created_at: plan.created_at,
        })
    }
}

/// A request to generate a weekly plan.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlanRequest {
    /// Free-text goal label; "build muscle" and "run faster" are recognised.
    pub goal: String,
    #[validate(range(min = 1, max = 7, message = "must be between 1 and 7"))]
    pub days_per_week: u8,
    #[validate(range(max = 7, message = "must be between 0 and 7"))]
    pub run_days: u8,
    #[validate(range(max = 7, message = "must be between 0 and 7"))]
    pub lift_days: u8,
}

/// Check field ranges and the day-sum rule, returning the generator input.
pub fn validate_request(request: &PlanRequest) -> Result<DayConstraints, PlanServiceError> {
    request
        .validate()
        .map_err(|e| PlanServiceError::Validation(validation::describe(&e)))?;

    // Both counts are <= 7 here, so the sum cannot overflow.
    if request.run_days + request.lift_days > request.days_per_week {
        return Err(PlanServiceError::TooManyDays {
            run: request.run_days,
            lift: request.lift_days,
            days: request.days_per_week,
        });
    }

    Ok(DayConstraints::new(
        request.days_per_week,
        request.run_days,
        request.lift_days,
    ))
}

/// Human-readable summary stored in the plan's `goals` column.
pub fn goals_summary(request: &PlanRequest) -> String {
    format!(
        "{} - {} days/week ({} lift, {} run)",
        request.goal, request.days_per_week, request.lift_days, request.run_days
    )
}

/// Validate `request`, generate the schedule, and persist it for `user_id`.
pub async fn create_plan(
    pool: &PgPool,
    user_id: Uuid,
    request: &PlanRequest,
) -> Result<StoredPlan, PlanServiceError> {
    let constraints = validate_request(request)?;
    let schedule = generate(Goal::resolve(&request.goal), constraints);

    let routine = serde_json::to_value(&schedule).map_err(anyhow::Error::from)?;
    let plan =
        plan_queries::insert_plan(pool, user_id, &goals_summary(request), &routine).await?;

    info!(
        plan_id = %plan.id,
        user_id = %user_id,
        days = schedule.len(),
        "plan generated"
    );
    Ok(StoredPlan {
        id: plan.id,
        user_id: plan.user_id,
        goals: plan.goals,
        routine_json: schedule,
        created_at: plan.created_at,
    })
}

/// All plans owned by `user_id`, newest first.
pub async fn list_plans(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<StoredPlan>, PlanServiceError> {
    plan_queries::list_plans_for_user(pool, user_id)
        .await?
        .into_iter()
        .map(StoredPlan::try_from)
        .collect()
}

/// Fetch a plan, requiring that `user_id` owns it.
pub async fn get_owned_plan(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<StoredPlan, PlanServiceError> {
    fetch_owned(pool, user_id, plan_id, "view").await?.try_into()
}

/// Delete a plan, requiring that `user_id` owns it.
pub async fn delete_owned_plan(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<(), PlanServiceError> {
    fetch_owned(pool, user_id, plan_id, "delete").await?;
    // A concurrent delete can remove the row after the ownership check.
    if plan_queries::delete_plan(pool, plan_id).await? == 0 {
        return Err(PlanServiceError::NotFound(plan_id));
    }

    info!(plan_id = %plan_id, user_id = %user_id, "plan deleted");
    Ok(())
}

async fn fetch_owned(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    action: &'static str,
) -> Result<Plan, PlanServiceError> {
    let plan = plan_queries::get_plan(pool, plan_id)
        .await?
        .ok_or(PlanServiceError::NotFound(plan_id))?;

    if plan.user_id != user_id {
        return Err(PlanServiceError::Forbidden(action));
    }
    Ok(plan)
}
