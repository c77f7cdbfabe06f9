//! Authenticated identity carried in request extensions.

use axum::http::Extensions;
use fintrack_types::Identity;

/// Extension key for storing the verified identity in request extensions.
#[derive(Debug, Clone, Copy)]
pub struct AuthContextExt(pub Identity);

/// Read the identity the session layer stored, if any
pub fn identity_from(extensions: &Extensions) -> Option<Identity> {
    extensions.get::<AuthContextExt>().map(|ext| ext.0)
}
