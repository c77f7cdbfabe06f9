//! Session gate: access-token verification for incoming requests
//!
//! Stateless. Only the token's signature, expiry and kind are checked; the
//! token store is not consulted.

use std::sync::Arc;

use fintrack_types::Identity;

use crate::token::{TokenKind, TokenSigner};
use crate::AuthError;

/// Verifies the `Authorization` credential of a request
#[derive(Debug, Clone)]
pub struct SessionGate {
    signer: Arc<TokenSigner>,
}

impl SessionGate {
    pub fn new(signer: Arc<TokenSigner>) -> Self {
        Self { signer }
    }

    /// Resolve the caller's identity from a raw `Authorization` header value
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let token = extract_token(authorization).ok_or(AuthError::MissingCredential)?;

        let claims = self.signer.verify(token)?;
        if claims.typ != TokenKind::Access {
            tracing::debug!(user_id = %claims.user_id, "Refresh token presented as access token");
            return Err(AuthError::IdentityMismatch);
        }

        Ok(claims.identity())
    }
}

/// Accept both a bare token and `Bearer <token>`
pub fn extract_token(authorization: Option<&str>) -> Option<&str> {
    let value = authorization?.trim();
    let mut parts = value.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or_default();
    // A lone scheme word carries no credential
    let token = if first.eq_ignore_ascii_case("bearer") {
        parts.next().unwrap_or_default().trim()
    } else {
        value
    };
    (!token.is_empty()).then_some(token)
}

/// Require the admin role
pub fn require_admin(identity: &Identity) -> Result<(), AuthError> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(AuthError::IdentityMismatch)
    }
}
