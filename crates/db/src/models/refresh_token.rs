//! Refresh token model and DTOs.

use sesame_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Revocation reason recorded when a token leaves the active state.
pub const REVOKE_REASON_REFRESH: &str = "REFRESH";
pub const REVOKE_REASON_LOGOUT: &str = "LOGOUT";
pub const REVOKE_REASON_EXPIRED: &str = "EXPIRED";
pub const REVOKE_REASON_ADMIN: &str = "ADMIN";

/// A refresh token row from the `refresh_tokens` table.
///
/// Rows are immutable except for `last_used_at` and the revocation columns,
/// and a revoked row never becomes active again. Expiry is logical -- the
/// row is treated as invalid once `expires_at` has passed, with no state
/// transition required.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: DbId,
    pub user_id: DbId,
    /// Binds the token family to the client session established at send-OTP
    /// time; a refresh attempt must match both hash and session id.
    pub session_id: String,
    /// SHA-256 hex digest of the opaque secret. The secret itself is never
    /// stored.
    pub token_hash: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub revoked: bool,
    pub revoked_at: Option<Timestamp>,
    pub revoke_reason: Option<String>,
}

impl RefreshToken {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Whether the token can still be exchanged: not revoked, not expired.
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.revoked && !self.is_expired(now)
    }
}

/// DTO for creating a new refresh token row.
pub struct CreateRefreshToken {
    pub user_id: DbId,
    pub session_id: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
}
