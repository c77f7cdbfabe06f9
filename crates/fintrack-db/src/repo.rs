//! Repository traits
//!
//! Define async repository interfaces for database operations.
//! Every operation that compares against "now" takes it explicitly so the
//! caller's clock is the single time source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fintrack_types::UserId;

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a live user by ID
    async fn find_by_id(&self, id: UserId) -> DbResult<Option<UserRow>>;

    /// Find a live user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Create a new user
    ///
    /// Returns `DbError::Conflict` if the email is already registered.
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub role: String,
}

/// Issued token repository trait
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a newly issued token pair
    ///
    /// Returns `DbError::Conflict` if the refresh token is already live.
    async fn create(&self, token: CreateToken) -> DbResult<TokenRow>;

    /// Find the live record for a refresh token (not deleted, `expires_at > now`)
    async fn find_live_by_refresh_token(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<TokenRow>>;

    /// Atomically retire the live record for `refresh_token` and insert `replacement`.
    ///
    /// Returns `None` without inserting anything when no live record matched,
    /// which is also what a caller that lost a concurrent rotation sees.
    async fn rotate(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
        replacement: CreateToken,
    ) -> DbResult<Option<TokenRow>>;

    /// Soft-delete the live record for a refresh token. Returns whether one existed.
    async fn revoke_by_refresh_token(&self, refresh_token: &str) -> DbResult<bool>;

    /// Soft-delete every live record for a user
    async fn revoke_all_for_user(&self, user_id: UserId) -> DbResult<u64>;

    /// Find all live records for a user
    async fn find_by_user_id(&self, user_id: UserId) -> DbResult<Vec<TokenRow>>;

    /// Hard-delete records that are expired or soft-deleted
    async fn purge(&self, now: DateTime<Utc>) -> DbResult<u64>;
}

/// Create token input
#[derive(Debug, Clone)]
pub struct CreateToken {
    pub user_id: UserId,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}
