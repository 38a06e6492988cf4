use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use fitforge_core::account::{self, AccountError, LoginUser, RegisterUser};
use fitforge_core::auth::TokenConfig;
use fitforge_core::plan::{self, PlanRequest, PlanServiceError, StoredPlan};
use fitforge_db::models::User;
use fitforge_db::pool;
use fitforge_db::queries::users as user_db;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
    /// Adds `WWW-Authenticate: Bearer` to the response.
    challenge: bool,
}

impl AppError {
    fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            challenge: false,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            challenge: true,
            ..Self::new(StatusCode::UNAUTHORIZED, msg)
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(err: anyhow::Error) -> Self {
        error!(error = %format!("{err:#}"), "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({ "detail": self.message });
        let mut response = (self.status, Json(body)).into_response();
        if self.challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(msg) => Self::unprocessable(msg),
            AccountError::EmailTaken => Self::bad_request(err.to_string()),
            AccountError::InvalidCredentials
            | AccountError::InvalidToken(_)
            | AccountError::UserNotFound => Self::unauthorized(err.to_string()),
            AccountError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<PlanServiceError> for AppError {
    fn from(err: PlanServiceError) -> Self {
        match err {
            PlanServiceError::Validation(msg) => Self::unprocessable(msg),
            PlanServiceError::TooManyDays { .. } => Self::bad_request(err.to_string()),
            PlanServiceError::NotFound(_) => Self::not_found(err.to_string()),
            PlanServiceError::Forbidden(_) => Self::forbidden(err.to_string()),
            PlanServiceError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}

// ---------------------------------------------------------------------------
// State and authentication
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: Arc<TokenConfig>,
}

impl AppState {
    pub fn new(pool: PgPool, tokens: TokenConfig) -> Self {
        Self {
            pool,
            tokens: Arc::new(tokens),
        }
    }
}

/// The user identified by the request's bearer token.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| AppError::unauthorized("Not authenticated"))?;

        let user = account::authenticate(&state.pool, &state.tokens, token).await?;
        Ok(Self(user))
    }
}

/// Extract the credentials from an `Authorization: Bearer <token>` value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: User,
    pub access_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

const TOKEN_TYPE: &str = "bearer";

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/test", get(db_test))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/plans/generate-plan", post(generate_plan))
        .route("/api/plans/my-plans", get(my_plans))
        .route("/api/plans/{plan_id}", get(get_plan).delete(delete_plan))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured browser origins. Credentials are allowed, so
/// methods and headers mirror the preflight request instead of using `*`.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(
    state: AppState,
    allowed_origins: &[String],
    bind: &str,
    port: u16,
) -> Result<()> {
    let app = build_router(state, allowed_origins);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("fitforge serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("fitforge serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "message": "FitForge Backend API",
        "health": "/api/health",
        "test": "/api/test",
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = match pool::ping(&state.pool).await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {e:#}"),
    };
    Json(json!({ "status": "ok", "database": database }))
}

/// Database smoke test: user count plus the earliest user. Failures are
/// reported in the body with a 200 status.
async fn db_test(State(state): State<AppState>) -> Json<serde_json::Value> {
    let result = async {
        let count = user_db::count_users(&state.pool).await?;
        let first = user_db::first_user(&state.pool).await?;
        anyhow::Ok((count, first))
    }
    .await;

    match result {
        Ok((count, first)) => {
            info!(users = count, "test endpoint queried database");
            Json(json!({
                "ok": true,
                "db_user_count": count,
                "first_user": first.map(|u| json!({ "id": u.id, "name": u.name, "email": u.email })),
            }))
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "test endpoint failed");
            Json(json!({
                "ok": false,
                "error": format!("{e:#}"),
                "db_user_count": 0,
                "first_user": null,
            }))
        }
    }
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let Json(input) = payload?;
    let (user, access_token) = account::register(&state.pool, &state.tokens, &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user,
            access_token,
            token_type: TOKEN_TYPE,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginUser>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(input) = payload?;
    let (_, access_token) = account::login(&state.pool, &state.tokens, &input).await?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE,
    }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn generate_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredPlan>), AppError> {
    let Json(request) = payload?;
    let plan = plan::create_plan(&state.pool, user.id, &request).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn my_plans(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<StoredPlan>>, AppError> {
    Ok(Json(plan::list_plans(&state.pool, user.id).await?))
}

async fn get_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    plan_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<StoredPlan>, AppError> {
    let Path(plan_id) = plan_id?;
    Ok(Json(
        plan::get_owned_plan(&state.pool, user.id, plan_id).await?,
    ))
}

async fn delete_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    plan_id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(plan_id) = plan_id?;
    plan::delete_owned_plan(&state.pool, user.id, plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
