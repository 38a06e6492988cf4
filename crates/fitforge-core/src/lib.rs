pub mod account;
pub mod auth;
pub mod plan;
pub mod validation;
