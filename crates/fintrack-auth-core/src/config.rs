//! Configuration types for the auth core

use std::time::Duration;

use crate::password::PasswordParams;

/// Token issuance configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 secret shared by access and refresh tokens (at least 32 bytes)
    pub jwt_secret: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime, also the lifetime of the persisted record
    pub refresh_token_ttl: Duration,
    /// Argon2id cost parameters for stored passwords
    pub password: PasswordParams,
}

impl AuthConfig {
    /// Create a new auth config
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_token_ttl: Duration::from_secs(2 * 60 * 60), // 2 hours
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
            password: PasswordParams::default(),
        }
    }

    /// Set access token lifetime
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Set refresh token lifetime
    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    /// Set password hashing parameters
    pub fn with_password_params(mut self, params: PasswordParams) -> Self {
        self.password = params;
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("password", &self.password)
            .finish_non_exhaustive()
    }
}

/// Request envelope configuration
#[derive(Debug, Clone)]
pub struct EnvelopeConfig {
    /// Maximum distance between the envelope timestamp and now (inclusive)
    pub replay_window: Duration,
    /// Report every envelope failure as one generic error
    pub opaque_errors: bool,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            replay_window: Duration::from_secs(60),
            opaque_errors: false,
        }
    }
}

impl EnvelopeConfig {
    /// Set replay window
    pub fn with_replay_window(mut self, window: Duration) -> Self {
        self.replay_window = window;
        self
    }

    /// Enable or disable opaque envelope errors
    pub fn with_opaque_errors(mut self, opaque: bool) -> Self {
        self.opaque_errors = opaque;
        self
    }
}
