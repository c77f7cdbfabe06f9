//! FinTrack Axum Integration
//!
//! Axum middleware and extractors for the FinTrack session gate and sealed
//! request envelopes.
//!
//! # Overview
//!
//! - **Middleware**: [`SessionLayer`] verifies the access token on every request
//! - **Extractors**: [`RequireAuth`], [`MaybeAuth`], [`RequireAdmin`] read the
//!   verified identity; [`Sealed`] opens an envelope body into a typed payload
//! - **Rejections**: [`AuthRejection`] renders auth errors as JSON
//!
//! # Quick Start
//!
//! ```ignore
//! use fintrack_axum::{RequireAuth, SessionLayer};
//! use axum::{Router, routing::post};
//!
//! async fn info(auth: RequireAuth) -> String {
//!     format!("Hello, user {}!", auth.user_id)
//! }
//!
//! let app = Router::new()
//!     .route("/api/user/info", post(info))
//!     .layer(SessionLayer::new(gate));
//! ```

pub mod context;
pub mod error;
pub mod extractors;
pub mod layer;

// Re-export primary types
pub use context::{identity_from, AuthContextExt};
pub use error::{AuthRejection, BAD_ENVELOPE};
pub use extractors::{MaybeAuth, RequireAdmin, RequireAuth, Sealed};
pub use layer::{SessionConfig, SessionFuture, SessionLayer, SessionService};
