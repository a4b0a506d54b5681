//! Repository for the `refresh_tokens` table.

use sqlx::PgPool;

use sesame_core::types::DbId;

use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, session_id, token_hash, created_at, expires_at, \
                        last_used_at, revoked, revoked_at, revoke_reason";

/// Provides CRUD and revocation operations for refresh tokens.
pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    /// Insert a new token row, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_tokens (user_id, session_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(input.user_id)
            .bind(&input.session_id)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a token row by its hash and bound session id.
    ///
    /// Returns the row regardless of revocation or expiry so the caller can
    /// distinguish a reuse attempt from a miss in its own logs.
    pub async fn find_by_hash_and_session(
        pool: &PgPool,
        token_hash: &str,
        session_id: &str,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM refresh_tokens
             WHERE token_hash = $1 AND session_id = $2"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(token_hash)
            .bind(session_id)
            .fetch_optional(pool)
            .await
    }

    /// Revoke the active row matching `(token_hash, session_id)`.
    ///
    /// This is the gating write for rotation: the update is restricted to
    /// non-revoked rows and the returned flag reports whether this caller
    /// won the race. Exactly one of any set of concurrent callers sees
    /// `true`.
    pub async fn revoke_active(
        pool: &PgPool,
        token_hash: &str,
        session_id: &str,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens
             SET revoked = true, revoked_at = now(), revoke_reason = $3
             WHERE token_hash = $1 AND session_id = $2 AND revoked = false",
        )
        .bind(token_hash)
        .bind(session_id)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke the active row matching `token_hash` alone (logout without a
    /// session id). Returns `true` if a row was updated.
    pub async fn revoke_active_by_hash(
        pool: &PgPool,
        token_hash: &str,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens
             SET revoked = true, revoked_at = now(), revoke_reason = $2
             WHERE token_hash = $1 AND revoked = false",
        )
        .bind(token_hash)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record that a token was exchanged. Best-effort bookkeeping.
    pub async fn touch_last_used(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE refresh_tokens SET last_used_at = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map(|_| ())
    }

    /// Delete rows past their expiry. Returns the count of deleted rows.
    pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < now()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
