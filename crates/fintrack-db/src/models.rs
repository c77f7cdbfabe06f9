//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use fintrack_types::{Role, UserId};
use sqlx::FromRow;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Argon2id digest, unpadded standard base64
    pub password_hash: String,
    /// Random salt, unpadded standard base64
    pub salt: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Issued token pair row from the database
///
/// One row per login or rotation. A row is never updated in place apart
/// from being soft-deleted when its refresh token is rotated or revoked.
#[derive(Debug, Clone, FromRow)]
pub struct TokenRow {
    pub id: i64,
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }

    /// Parse the stored role, falling back to the least-privileged role
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_else(|_| {
            tracing::warn!(user_id = self.id, role = %self.role, "Unknown role in users table");
            Role::User
        })
    }
}

impl TokenRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.user_id)
    }

    /// Whether the record can still be used for rotation at `now`
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.is_none() && self.expires_at > now
    }
}
