//! Sliding-window-by-TTL rate limiter.
//!
//! A thin layer over [`CacheStore::check_and_increment`] that owns the key
//! scheme (`rate_limit:<scope>:<identity>`). The window is an approximation:
//! it resets in full on the first request after expiry rather than sliding
//! per-request, which is acceptable for a courtesy limit.

use std::sync::Arc;
use std::time::Duration;

use crate::store::{CacheError, CacheStore, CounterDecision};

/// Key scope for per-client-address limits.
pub const SCOPE_IP: &str = "ip";

/// Key scope for per-phone-number limits.
pub const SCOPE_PHONE: &str = "phone";

/// Counter-based rate limiter shared by the IP middleware and the send-OTP
/// flow.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CacheStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Check the counter for `(scope, identity)` and increment when under
    /// `limit`. Atomic: concurrent callers are serialized by the store.
    pub async fn check_and_increment(
        &self,
        scope: &str,
        identity: &str,
        limit: u32,
        window: Duration,
    ) -> Result<CounterDecision, CacheError> {
        let key = format!("rate_limit:{scope}:{identity}");
        self.store.check_and_increment(&key, limit, window).await
    }
}
