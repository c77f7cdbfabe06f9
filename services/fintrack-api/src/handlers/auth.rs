//! Account and session handlers (register, login, refresh, logout)
//!
//! Every body is a sealed envelope; the route supplies only the payload shape.

use axum::extract::State;
use axum::Json;
use fintrack_auth_core::TokenPair;
use fintrack_axum::{RequireAuth, Sealed};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

fn require(field: &'static str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::missing_field(field));
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    Sealed(req): Sealed<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    require("name", &req.name)?;
    require("email", &req.email)?;
    require("password", &req.password)?;

    state
        .auth
        .register(req.name.trim(), req.email.trim(), &req.password)
        .await?;

    Ok(Json(RegisterResponse {}))
}

/// POST /api/login
///
/// Exchange email and password for an access/refresh token pair
pub async fn login(
    State(state): State<AppState>,
    Sealed(req): Sealed<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    require("email", &req.email)?;
    require("password", &req.password)?;

    let pair = state.auth.login(req.email.trim(), &req.password).await?;
    Ok(Json(pair))
}

/// POST /api/refresh-token
///
/// Rotate a refresh token; the presented token is dead afterwards
pub async fn refresh(
    State(state): State<AppState>,
    Sealed(req): Sealed<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    require("refresh_token", &req.refresh_token)?;

    let pair = state.auth.refresh(&req.refresh_token).await?;
    Ok(Json(pair))
}

/// POST /api/logout
///
/// Revoke one of the caller's own sessions
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Sealed(req): Sealed<LogoutRequest>,
) -> ApiResult<Json<LogoutResponse>> {
    require("refresh_token", &req.refresh_token)?;

    state.auth.logout(&identity, &req.refresh_token).await?;
    tracing::info!(user_id = %identity.user_id, "User logged out");

    Ok(Json(LogoutResponse { success: true }))
}
