//! User model.

use serde::Serialize;
use sesame_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A user row from the `users` table.
///
/// Users are created lazily on first successful OTP verification; there is
/// no separate signup flow. The phone number column always holds the
/// canonical international form.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub phone_number: String,
    pub scope: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
