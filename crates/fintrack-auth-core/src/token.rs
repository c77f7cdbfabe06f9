//! Access and refresh tokens (HS256 JWT)

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use fintrack_types::{Identity, Role, UserId};
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::crypto::SigningSecret;
use crate::{AuthConfig, AuthError};

/// Which half of a pair a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub role: Role,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
    /// Random token id, keeps tokens minted in the same second distinct
    pub jti: String,
    pub typ: TokenKind,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity::new(self.user_id, self.role)
    }

    /// Expired once `now` is strictly past `exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }
}

/// Access/refresh pair as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// A minted pair plus the expiry to persist with its record
#[derive(Debug, Clone)]
pub struct MintedPair {
    pub pair: TokenPair,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Signs and verifies tokens with one shared HMAC secret
pub struct TokenSigner {
    secret: SigningSecret,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenSigner {
    /// Create a signer from config
    ///
    /// # Errors
    /// Returns `Configuration` if the secret is shorter than 32 bytes.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        let secret = SigningSecret::new(&config.jwt_secret)
            .map_err(|e| AuthError::Configuration(e.to_string()))?;
        Ok(Self {
            secret,
            access_ttl: to_chrono(config.access_token_ttl),
            refresh_ttl: to_chrono(config.refresh_token_ttl),
            clock,
        })
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Sign a single token of the given kind
    pub fn sign(&self, identity: &Identity, kind: TokenKind) -> Result<(String, Claims), AuthError> {
        let now = self.clock.now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            user_id: identity.user_id,
            role: identity.role,
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(ttl)
                .ok_or_else(|| AuthError::Configuration("token lifetime out of range".to_string()))?
                .timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            typ: kind,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, self.secret.encoding_key())
            .map_err(|e| {
                tracing::error!("Failed to sign token: {}", e);
                AuthError::Internal("failed to sign token".to_string())
            })?;

        Ok((token, claims))
    }

    /// Mint an access/refresh pair for one identity
    pub fn mint_pair(&self, identity: &Identity) -> Result<MintedPair, AuthError> {
        let (access_token, _) = self.sign(identity, TokenKind::Access)?;
        let (refresh_token, refresh_claims) = self.sign(identity, TokenKind::Refresh)?;

        let refresh_expires_at = DateTime::from_timestamp(refresh_claims.exp, 0)
            .ok_or_else(|| AuthError::Internal("refresh expiry out of range".to_string()))?;

        Ok(MintedPair {
            pair: TokenPair {
                access_token,
                refresh_token,
            },
            refresh_expires_at,
        })
    }

    /// Verify signature and expiry; the caller checks [`Claims::typ`]
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock below
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, self.secret.decoding_key(), &validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {}", e);
                AuthError::InvalidToken
            })?
            .claims;

        if claims.is_expired_at(self.clock.now()) {
            tracing::debug!(user_id = %claims.user_id, "Token expired");
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &self.secret)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

fn to_chrono(ttl: std::time::Duration) -> Duration {
    Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(i64::from(u32::MAX)))
}
