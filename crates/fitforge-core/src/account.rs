//! Account registration, login, and bearer-token authentication.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use validator::Validate;

use fitforge_db::models::User;
use fitforge_db::queries::users as user_queries;

use crate::auth::{self, PasswordError, TokenConfig, TokenError};
use crate::validation;

/// Errors surfaced by account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered")]
    EmailTaken,

    /// Unknown email or wrong password; deliberately indistinguishable.
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Invalid authentication credentials")]
    InvalidToken(#[source] TokenError),

    /// The token is valid but its user no longer exists.
    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<PasswordError> for AccountError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.into())
    }
}

/// Registration payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 100, message = "must be between 8 and 100 characters"))]
    pub password: String,
}

/// Login payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginUser {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub password: String,
}

/// Create an account and issue its first access token.
pub async fn register(
    pool: &PgPool,
    tokens: &TokenConfig,
    input: &RegisterUser,
) -> Result<(User, String), AccountError> {
    input
        .validate()
        .map_err(|e| AccountError::Validation(validation::describe(&e)))?;

    if user_queries::get_user_by_email(pool, &input.email)
        .await?
        .is_some()
    {
        return Err(AccountError::EmailTaken);
    }

    let hashed = auth::hash_password(&input.password)?;
    // A concurrent registration can still win the race; the unique index
    // decides.
    let user = user_queries::insert_user(pool, &input.name, &input.email, &hashed)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AccountError::EmailTaken
            } else {
                AccountError::Internal(err)
            }
        })?;

    let token = issue(tokens, &user)?;
    info!(user_id = %user.id, "user registered");
    Ok((user, token))
}

/// Verify credentials and issue an access token.
pub async fn login(
    pool: &PgPool,
    tokens: &TokenConfig,
    input: &LoginUser,
) -> Result<(User, String), AccountError> {
    input
        .validate()
        .map_err(|e| AccountError::Validation(validation::describe(&e)))?;

    let Some(user) = user_queries::get_user_by_email(pool, &input.email).await? else {
        return Err(AccountError::InvalidCredentials);
    };

    if !auth::verify_password(&input.password, &user.hashed_password)? {
        warn!(user_id = %user.id, "login rejected: wrong password");
        return Err(AccountError::InvalidCredentials);
    }

    let token = issue(tokens, &user)?;
    info!(user_id = %user.id, "user logged in");
    Ok((user, token))
}

/// Resolve a bearer token to its user.
pub async fn authenticate(
    pool: &PgPool,
    tokens: &TokenConfig,
    token: &str,
) -> Result<User, AccountError> {
    let user_id = auth::validate_token(tokens, token).map_err(AccountError::InvalidToken)?;
    user_queries::get_user(pool, user_id)
        .await?
        .ok_or(AccountError::UserNotFound)
}

fn issue(tokens: &TokenConfig, user: &User) -> Result<String, AccountError> {
    auth::issue_token(tokens, user.id).map_err(|e| AccountError::Internal(e.into()))
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}
