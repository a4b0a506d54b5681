//! Periodic deletion of expired refresh tokens.
//!
//! Expiry is already enforced logically at refresh time, so this task is
//! pure hygiene: it keeps the `refresh_tokens` table from accumulating dead
//! rows. Runs on a fixed interval using `tokio::time::interval`.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use sesame_db::repositories::RefreshTokenRepo;

/// How often the cleanup job runs by default.
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600; // 1 hour

/// Run the refresh-token cleanup loop until `cancel` is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    let interval_secs: u64 = std::env::var("TOKEN_CLEANUP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CLEANUP_INTERVAL_SECS);

    tracing::info!(interval_secs, "Refresh-token cleanup job started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Refresh-token cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match RefreshTokenRepo::delete_expired(&pool).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Token cleanup: purged expired rows");
                        } else {
                            tracing::debug!("Token cleanup: no rows to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Token cleanup failed");
                    }
                }
            }
        }
    }
}
