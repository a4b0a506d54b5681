//! The cache-store capability interface.

use std::time::Duration;

use async_trait::async_trait;

/// Error from a cache backend.
///
/// The message is for internal diagnostics; callers map this to their own
/// error taxonomy before anything reaches a client.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Outcome of an atomic counter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterDecision {
    /// Whether the caller is within the limit.
    pub allowed: bool,
    /// The counter value observed by this call (post-increment when allowed,
    /// the rejecting pre-increment value otherwise).
    pub count: u32,
}

/// Minimal key-value capabilities the credential engine needs.
///
/// Implementations must guarantee that [`CacheStore::check_and_increment`]
/// executes as one serialized unit: N concurrent callers against an unset
/// key observe counts `1..=N`, and exactly the callers whose count would
/// exceed the limit are rejected. A get-then-increment sequence is not an
/// acceptable implementation.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store `value` under `key`, replacing any existing entry, expiring
    /// after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration)
        -> Result<(), CacheError>;

    /// Fetch the value under `key`. `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Atomically check the counter under `key` against `limit` and, when
    /// under it, increment. The expiry window starts at the first increment
    /// and is not extended by later ones; rejected calls never increment.
    async fn check_and_increment(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<CounterDecision, CacheError>;

    /// Liveness probe.
    async fn ping(&self) -> Result<(), CacheError>;
}
