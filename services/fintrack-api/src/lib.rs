//! FinTrack API
//!
//! HTTP surface for registration, login and token rotation. Request bodies
//! arrive as sealed envelopes; gated routes sit behind the session layer.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use fintrack_axum::SessionLayer;
use tower_http::trace::TraceLayer;

pub use config::{Config, ConfigError, Storage};
pub use error::{ApiError, ApiResult};
pub use state::{AppState, AuthServiceImpl};

/// Build the full route table
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/refresh-token", post(handlers::refresh));

    let gated = Router::new()
        .route("/api/logout", post(handlers::logout))
        .route("/api/user/info", post(handlers::user_info))
        .layer(SessionLayer::new(state.auth.gate().clone()));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .merge(public)
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
