//! Registration, login sessions and the caller's profile.

use axum::Json;
use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use auth::TokenPair;
use chrono::{DateTime, Utc};
use common::{Context, SessionId, UserId};
use domain::Aggregate;
use domain::user::{ClientInfo, RegisterUser, User};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::{BearerToken, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// A user as seen over HTTP. Never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub role: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().clone(),
            email: user.email().to_string(),
            role: user.role().map(|r| r.name().to_string()),
            is_active: user.is_active(),
            last_login_at: user.last_login_at(),
            created_at: user.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub session_id: SessionId,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let forwarded = header("x-forwarded-for");
    ClientInfo {
        ip_address: forwarded.split(',').next().unwrap_or_default().trim().to_string(),
        user_agent: header(USER_AGENT.as_str()),
    }
}

/// POST /auth/register
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterUser>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let result = state.users.register(&Context::background(), req).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&result.aggregate))))
}

/// POST /auth/login
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let result = state
        .users
        .login(
            &Context::background(),
            &req.email,
            &req.password,
            client_info(&headers),
        )
        .await?;
    Ok(Json(LoginResponse {
        user: UserResponse::from(&result.user),
        session_id: result.session_id,
        tokens: result.tokens,
    }))
}

/// POST /auth/refresh
#[tracing::instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let tokens = state
        .users
        .refresh(&Context::background(), &req.refresh_token)
        .await?;
    Ok(Json(tokens))
}

/// POST /auth/logout
#[tracing::instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, ApiError> {
    state.users.logout(&Context::background(), &token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me
#[tracing::instrument(skip_all)]
pub async fn me(CurrentUser(caller): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&caller.user))
}
