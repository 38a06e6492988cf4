pub mod exercises;
pub mod plans;
pub mod runs;
pub mod users;
pub mod workouts;
