//! Weekly workout plans: pure schedule generation and the service layer
//! that validates requests and persists the result.

pub mod generate;
pub mod service;

pub use generate::{DayConstraints, Goal, REST_DAY, Schedule, Weekday, generate};
pub use service::{
    PlanRequest, PlanServiceError, StoredPlan, create_plan, delete_owned_plan, get_owned_plan,
    goals_summary, list_plans, validate_request,
};
