//! In-memory repository implementations
//!
//! Used by tests and by the API service when started with `STORAGE=memory`.
//! Semantics match the PostgreSQL repositories, including soft deletes and
//! the atomicity of [`TokenRepository::rotate`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fintrack_types::UserId;

use crate::error::{DbError, DbResult};
use crate::models::{TokenRow, UserRow};
use crate::repo::{CreateToken, CreateUser, TokenRepository, UserRepository};

/// In-memory user repository
#[derive(Default, Clone)]
pub struct MemoryUserRepository {
    users: Arc<DashMap<i64, UserRow>>,
    by_email: Arc<DashMap<String, i64>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> DbResult<Option<UserRow>> {
        Ok(self
            .users
            .get(&id.get())
            .map(|r| r.value().clone())
            .filter(|u| u.deleted_at.is_none()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        let Some(id) = self.by_email.get(email).map(|r| *r.value()) else {
            return Ok(None);
        };
        self.find_by_id(UserId(id)).await
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(DbError::Conflict("users_email_live_idx".to_string())),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                let now = Utc::now();
                let row = UserRow {
                    id,
                    name: user.name,
                    email: user.email,
                    password_hash: user.password_hash,
                    salt: user.salt,
                    role: user.role,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                };
                self.users.insert(id, row.clone());
                slot.insert(id);
                Ok(row)
            }
        }
    }
}

/// In-memory token repository
///
/// `live` indexes only records that have not been soft-deleted, so removing
/// an entry from it is the atomic "claim" step of a rotation or revocation.
#[derive(Default, Clone)]
pub struct MemoryTokenRepository {
    rows: Arc<DashMap<i64, TokenRow>>,
    live: Arc<DashMap<String, i64>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, including soft-deleted ones
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fetch a row by id regardless of state
    pub fn get(&self, id: i64) -> Option<TokenRow> {
        self.rows.get(&id).map(|r| r.value().clone())
    }

    fn soft_delete(&self, id: i64, at: DateTime<Utc>) {
        if let Some(mut row) = self.rows.get_mut(&id) {
            row.deleted_at = Some(at);
            row.updated_at = at;
        }
    }
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn create(&self, token: CreateToken) -> DbResult<TokenRow> {
        match self.live.entry(token.refresh_token.clone()) {
            Entry::Occupied(_) => Err(DbError::Conflict(
                "tokens_refresh_token_live_idx".to_string(),
            )),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                let now = Utc::now();
                let row = TokenRow {
                    id,
                    user_id: token.user_id.get(),
                    access_token: token.access_token,
                    refresh_token: token.refresh_token,
                    expires_at: token.expires_at,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                };
                self.rows.insert(id, row.clone());
                slot.insert(id);
                Ok(row)
            }
        }
    }

    async fn find_live_by_refresh_token(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<TokenRow>> {
        let Some(id) = self.live.get(refresh_token).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.get(id).filter(|row| row.is_live(now)))
    }

    async fn rotate(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
        replacement: CreateToken,
    ) -> DbResult<Option<TokenRow>> {
        let claimed = self.live.remove_if(refresh_token, |_, id| {
            self.rows.get(id).is_some_and(|row| row.is_live(now))
        });

        let Some((_, retired_id)) = claimed else {
            return Ok(None);
        };
        let previous_updated_at = self.rows.get(&retired_id).map(|row| row.updated_at);
        self.soft_delete(retired_id, now);

        match self.create(replacement).await {
            Ok(row) => Ok(Some(row)),
            Err(e) => {
                // Roll back the claim so a failed rotation leaves no trace
                if let Some(mut row) = self.rows.get_mut(&retired_id) {
                    row.deleted_at = None;
                    if let Some(updated_at) = previous_updated_at {
                        row.updated_at = updated_at;
                    }
                }
                self.live.insert(refresh_token.to_string(), retired_id);
                Err(e)
            }
        }
    }

    async fn revoke_by_refresh_token(&self, refresh_token: &str) -> DbResult<bool> {
        match self.live.remove(refresh_token) {
            Some((_, id)) => {
                self.soft_delete(id, Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> DbResult<u64> {
        let owned: Vec<String> = self
            .rows
            .iter()
            .filter(|r| r.user_id == user_id.get() && r.deleted_at.is_none())
            .map(|r| r.refresh_token.clone())
            .collect();

        let mut count = 0;
        for refresh_token in owned {
            if self.revoke_by_refresh_token(&refresh_token).await? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn find_by_user_id(&self, user_id: UserId) -> DbResult<Vec<TokenRow>> {
        let mut tokens: Vec<TokenRow> = self
            .rows
            .iter()
            .filter(|r| r.user_id == user_id.get() && r.deleted_at.is_none())
            .map(|r| r.value().clone())
            .collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tokens)
    }

    async fn purge(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let stale: Vec<(i64, String)> = self
            .rows
            .iter()
            .filter(|r| r.deleted_at.is_some() || r.expires_at <= now)
            .map(|r| (r.id, r.refresh_token.clone()))
            .collect();

        let count = stale.len() as u64;
        for (id, refresh_token) in stale {
            self.live.remove_if(&refresh_token, |_, live_id| *live_id == id);
            self.rows.remove(&id);
        }
        Ok(count)
    }
}
