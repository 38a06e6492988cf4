//! Credential handling: password hashing and bearer access tokens.

pub mod password;
pub mod token;

pub use password::{PasswordError, hash_password, verify_password};
pub use token::{Claims, TokenConfig, TokenError, issue_token, validate_token};
