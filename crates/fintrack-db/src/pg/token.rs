//! PostgreSQL token repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fintrack_types::UserId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::DbResult;
use crate::models::TokenRow;
use crate::repo::{CreateToken, TokenRepository};

/// PostgreSQL token repository
#[derive(Clone)]
pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    /// Create a new token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_token(
    tx: &mut Transaction<'_, Postgres>,
    token: &CreateToken,
) -> DbResult<TokenRow> {
    let row = sqlx::query_as::<_, TokenRow>(
        r#"
        INSERT INTO tokens (user_id, access_token, refresh_token, expires_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, access_token, refresh_token, expires_at,
                  created_at, updated_at, deleted_at
        "#,
    )
    .bind(token.user_id.get())
    .bind(&token.access_token)
    .bind(&token.refresh_token)
    .bind(token.expires_at)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn create(&self, token: CreateToken) -> DbResult<TokenRow> {
        let mut tx = self.pool.begin().await?;
        let row = insert_token(&mut tx, &token).await?;
        tx.commit().await?;

        Ok(row)
    }

    async fn find_live_by_refresh_token(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<TokenRow>> {
        let token = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, user_id, access_token, refresh_token, expires_at,
                   created_at, updated_at, deleted_at
            FROM tokens
            WHERE refresh_token = $1 AND deleted_at IS NULL AND expires_at > $2
            "#,
        )
        .bind(refresh_token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn rotate(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
        replacement: CreateToken,
    ) -> DbResult<Option<TokenRow>> {
        let mut tx = self.pool.begin().await?;

        // Row lock on UPDATE serializes racing rotations; the loser re-reads
        // deleted_at after the winner commits and matches nothing.
        let retired = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE tokens
            SET deleted_at = $2, updated_at = $2
            WHERE refresh_token = $1 AND deleted_at IS NULL AND expires_at > $2
            RETURNING id
            "#,
        )
        .bind(refresh_token)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(retired_id) = retired else {
            tx.rollback().await?;
            return Ok(None);
        };

        let row = insert_token(&mut tx, &replacement).await?;
        tx.commit().await?;

        tracing::debug!(retired_id, token_id = row.id, "Rotated token record");
        Ok(Some(row))
    }

    async fn revoke_by_refresh_token(&self, refresh_token: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tokens
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE refresh_token = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(refresh_token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE tokens
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_user_id(&self, user_id: UserId) -> DbResult<Vec<TokenRow>> {
        let tokens = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, user_id, access_token, refresh_token, expires_at,
                   created_at, updated_at, deleted_at
            FROM tokens
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(tokens)
    }

    async fn purge(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result =
            sqlx::query("DELETE FROM tokens WHERE expires_at <= $1 OR deleted_at IS NOT NULL")
                .bind(now)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
