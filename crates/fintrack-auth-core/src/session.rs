//! Refresh-token sessions: issuance, rotation and revocation
//!
//! Each issued pair is backed by one token record. The record, not the
//! refresh token's embedded expiry, decides whether the token may still be
//! rotated, so deleting it revokes the session.

use std::sync::Arc;

use fintrack_db::{CreateToken, DbError, TokenRepository, TokenRow};
use fintrack_types::{Identity, UserId};

use crate::token::{MintedPair, TokenKind, TokenPair, TokenSigner};
use crate::AuthError;

/// Session manager handles pair issuance, rotation and revocation
pub struct SessionManager<R: TokenRepository + ?Sized> {
    signer: Arc<TokenSigner>,
    repo: Arc<R>,
}

impl<R: TokenRepository + ?Sized> Clone for SessionManager<R> {
    fn clone(&self) -> Self {
        Self {
            signer: Arc::clone(&self.signer),
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: TokenRepository + ?Sized> SessionManager<R> {
    pub fn new(signer: Arc<TokenSigner>, repo: Arc<R>) -> Self {
        Self { signer, repo }
    }

    pub fn signer(&self) -> &Arc<TokenSigner> {
        &self.signer
    }

    /// Mint a pair for `identity` and persist its record
    pub async fn issue(&self, identity: Identity) -> Result<TokenPair, AuthError> {
        let minted = self.signer.mint_pair(&identity)?;

        self.repo
            .create(record_for(identity.user_id, &minted))
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => {
                    tracing::error!(user_id = %identity.user_id, "Refresh token collision");
                    AuthError::Internal("failed to issue session".to_string())
                }
                other => other.into(),
            })?;

        tracing::debug!(user_id = %identity.user_id, "Issued token pair");
        Ok(minted.pair)
    }

    /// Exchange a refresh token for a new pair, retiring the presented one
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.signer.verify(refresh_token)?;
        if claims.typ != TokenKind::Refresh {
            tracing::debug!(user_id = %claims.user_id, "Access token presented for rotation");
            return Err(AuthError::InvalidToken);
        }

        let now = self.signer.clock().now();
        let record = self
            .repo
            .find_live_by_refresh_token(refresh_token, now)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    user_id = %claims.user_id,
                    "Refresh token has no live record (reused, revoked or expired)"
                );
                AuthError::RefreshTokenExpired
            })?;

        if record.user_id() != claims.user_id {
            tracing::warn!(
                claims_user = %claims.user_id,
                record_user = %record.user_id(),
                "Refresh token record belongs to another user"
            );
            return Err(AuthError::IdentityMismatch);
        }

        let identity = claims.identity();
        let minted = self.signer.mint_pair(&identity)?;

        let rotated = self
            .repo
            .rotate(refresh_token, now, record_for(identity.user_id, &minted))
            .await?;

        match rotated {
            Some(_) => {
                tracing::debug!(user_id = %identity.user_id, "Rotated refresh token");
                Ok(minted.pair)
            }
            None => {
                tracing::warn!(user_id = %identity.user_id, "Lost concurrent rotation");
                Err(AuthError::RefreshTokenExpired)
            }
        }
    }

    /// Find the live record for a refresh token
    pub async fn find_live(&self, refresh_token: &str) -> Result<Option<TokenRow>, AuthError> {
        let now = self.signer.clock().now();
        Ok(self.repo.find_live_by_refresh_token(refresh_token, now).await?)
    }

    /// Revoke one session. Returns whether a live record existed.
    pub async fn revoke(&self, refresh_token: &str) -> Result<bool, AuthError> {
        let revoked = self.repo.revoke_by_refresh_token(refresh_token).await?;
        if revoked {
            tracing::debug!("Revoked refresh token");
        }
        Ok(revoked)
    }

    /// Revoke every session of a user
    pub async fn revoke_all(&self, user_id: UserId) -> Result<u64, AuthError> {
        let count = self.repo.revoke_all_for_user(user_id).await?;
        tracing::info!(user_id = %user_id, count, "Revoked all sessions");
        Ok(count)
    }

    /// Live sessions of a user, newest first
    pub async fn list(&self, user_id: UserId) -> Result<Vec<TokenRow>, AuthError> {
        Ok(self.repo.find_by_user_id(user_id).await?)
    }

    /// Hard-delete expired and revoked records
    pub async fn purge(&self) -> Result<u64, AuthError> {
        let now = self.signer.clock().now();
        let count = self.repo.purge(now).await?;
        tracing::info!(count, "Purged token records");
        Ok(count)
    }
}

impl<R: TokenRepository + ?Sized> std::fmt::Debug for SessionManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

fn record_for(user_id: UserId, minted: &MintedPair) -> CreateToken {
    CreateToken {
        user_id,
        access_token: minted.pair.access_token.clone(),
        refresh_token: minted.pair.refresh_token.clone(),
        expires_at: minted.refresh_expires_at,
    }
}
