//! `fitforge plan` subcommands.

use anyhow::Result;

use fitforge_core::plan::{self, Goal, PlanRequest, Schedule, Weekday};

use crate::PlanCommands;

pub fn run_plan_command(command: PlanCommands) -> Result<()> {
    match command {
        PlanCommands::Preview {
            goal,
            days_per_week,
            run_days,
            lift_days,
        } => {
            let request = PlanRequest {
                goal,
                days_per_week,
                run_days,
                lift_days,
            };
            print!("{}", preview(&request)?);
        }
    }
    Ok(())
}

/// Validate `request` and render the generated week as text.
pub fn preview(request: &PlanRequest) -> Result<String> {
    let constraints = plan::validate_request(request)?;
    let schedule = plan::generate(Goal::resolve(&request.goal), constraints);

    let mut out = format!("Plan: {}\n\n", plan::goals_summary(request));
    out.push_str(&render_schedule(&schedule));
    Ok(out)
}

/// One line per weekday in order; days the generator left open show `-`.
pub fn render_schedule(schedule: &Schedule) -> String {
    Weekday::ALL
        .iter()
        .map(|day| format!("  {:<10} {}\n", day.name(), schedule.get(*day).unwrap_or("-")))
        .collect()
}
