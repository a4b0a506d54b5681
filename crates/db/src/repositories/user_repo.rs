//! Repository for the `users` table.

use sqlx::PgPool;

use sesame_core::types::DbId;

use crate::models::user::User;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, phone_number, scope, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Upsert a user by canonical phone number, returning the row.
    ///
    /// Registration-by-first-login: the row is created on first call and
    /// merely touched afterwards, so concurrent first logins can never
    /// create two rows or fail on the unique constraint.
    pub async fn upsert_by_phone(pool: &PgPool, phone_number: &str) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (phone_number)
             VALUES ($1)
             ON CONFLICT (phone_number) DO UPDATE SET updated_at = now()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(phone_number)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by canonical phone number.
    pub async fn find_by_phone(
        pool: &PgPool,
        phone_number: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE phone_number = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(phone_number)
            .fetch_optional(pool)
            .await
    }

    /// List users, newest first, optionally filtered by phone-number prefix.
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
        search_phone: Option<&str>,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE ($1::text IS NULL OR phone_number LIKE $1 || '%')
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(search_phone)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Total row count for the same filter as [`UserRepo::list`].
    pub async fn count(pool: &PgPool, search_phone: Option<&str>) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users
             WHERE ($1::text IS NULL OR phone_number LIKE $1 || '%')",
        )
        .bind(search_phone)
        .fetch_one(pool)
        .await?;
        Ok(count.0)
    }
}
