//! User profile handlers

use axum::extract::State;
use axum::Json;
use fintrack_auth_core::UserProfile;
use fintrack_axum::RequireAuth;

use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/user/info
pub async fn info(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> ApiResult<Json<UserProfile>> {
    let profile = state.auth.user_info(&identity).await?;
    Ok(Json(profile))
}
