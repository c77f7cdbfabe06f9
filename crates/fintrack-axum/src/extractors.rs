//! Axum extractors for authentication and sealed request bodies.
//!
//! Identity extractors read what [`SessionLayer`](crate::SessionLayer)
//! stored in the request extensions.
//!
//! # Usage
//!
//! ```ignore
//! use fintrack_axum::{RequireAuth, Sealed};
//!
//! #[derive(serde::Deserialize)]
//! struct Logout { refresh_token: String }
//!
//! async fn logout(auth: RequireAuth, Sealed(body): Sealed<Logout>) -> String {
//!     format!("{} logs out", auth.user_id)
//! }
//! ```

use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRef, FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use fintrack_auth_core::{AuthError, Envelope, EnvelopeOpener};
use fintrack_types::Identity;
use serde::de::DeserializeOwned;

use crate::context::identity_from;
use crate::error::AuthRejection;

/// Extractor that requires authentication.
///
/// Returns 401 `MISSING_CREDENTIAL` if no identity is present.
#[derive(Debug, Clone, Copy)]
pub struct RequireAuth(pub Identity);

impl Deref for RequireAuth {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from(&parts.extensions)
            .map(Self)
            .ok_or_else(|| AuthError::MissingCredential.into())
    }
}

/// Extractor for optional authentication.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuth(pub Option<Identity>);

impl Deref for MaybeAuth {
    type Target = Option<Identity>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(identity_from(&parts.extensions)))
    }
}

/// Extractor that requires the admin role.
///
/// Returns 403 `IDENTITY_MISMATCH` if the caller is not an admin.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub Identity);

impl Deref for RequireAdmin {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(identity) = RequireAuth::from_request_parts(parts, state).await?;
        fintrack_auth_core::require_admin(&identity)?;
        Ok(Self(identity))
    }
}

/// Request body sealed in an [`Envelope`], opened and decoded as `T`.
///
/// The state must provide an `Arc<EnvelopeOpener>` via [`FromRef`].
/// Must be the last extractor of a handler since it consumes the body.
#[derive(Debug, Clone)]
pub struct Sealed<T>(pub T);

impl<T> Deref for Sealed<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for Sealed<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
    Arc<EnvelopeOpener>: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let opener = Arc::<EnvelopeOpener>::from_ref(state);
        let opaque = opener.config().opaque_errors;

        let body = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::debug!("Failed to read envelope body: {}", e);
            AuthRejection::new(AuthError::PayloadDecodeError("unreadable body".to_string()))
                .opaque(opaque)
        })?;

        let envelope: Envelope = serde_json::from_slice(&body).map_err(|e| {
            tracing::debug!("Request body is not an envelope: {}", e);
            AuthRejection::new(AuthError::PayloadDecodeError(format!("invalid envelope: {e}")))
                .opaque(opaque)
        })?;

        opener
            .open_as::<T>(&envelope)
            .map(Self)
            .map_err(|e| AuthRejection::new(e).opaque(opaque))
    }
}
