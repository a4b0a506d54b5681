//! In-memory [`CacheStore`] for tests and single-process development runs.
//!
//! A `Mutex<HashMap>` with per-entry deadlines. Expiry is lazy: entries are
//! dropped when observed past their deadline. Every operation runs under
//! the one lock, which trivially gives the serialization the trait demands.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::store::{CacheError, CacheStore, CounterDecision};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-local store with TTL semantics matching the Redis backend.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let expired = matches!(entries.get(key), Some(entry) if entry.is_expired(now));
        if expired {
            entries.remove(key);
            return Ok(None);
        }

        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }

    async fn check_and_increment(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<CounterDecision, CacheError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let current: u32 = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.value.parse().map_err(|_| {
                    CacheError::Backend(format!("non-numeric counter under key {key}"))
                })?
            }
            _ => 0,
        };

        if current >= limit {
            return Ok(CounterDecision {
                allowed: false,
                count: current,
            });
        }

        let count = current + 1;
        // The window is anchored at the first increment; keep the existing
        // deadline on subsequent hits.
        let expires_at = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => entry.expires_at,
            _ => now + window,
        };
        entries.insert(
            key.to_string(),
            Entry {
                value: count.to_string(),
                expires_at,
            },
        );

        Ok(CounterDecision {
            allowed: true,
            count,
        })
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn set_get_delete_round_trip() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites_existing_entry() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k", "first", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set_with_ttl("k", "second", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k", "v", Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleting_absent_key_is_not_an_error() {
        let store = MemoryStore::new();
        assert!(store.delete("missing").await.is_ok());
    }

    #[tokio::test]
    async fn counter_allows_up_to_limit_then_rejects() {
        let store = MemoryStore::new();
        let window = Duration::from_secs(60);

        for expected in 1..=3u32 {
            let decision = store.check_and_increment("c", 3, window).await.unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.count, expected);
        }

        let decision = store.check_and_increment("c", 3, window).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.count, 3);

        // Rejected calls must not have incremented.
        let decision = store.check_and_increment("c", 3, window).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.count, 3);
    }

    #[tokio::test]
    async fn counter_window_resets_in_full_after_expiry() {
        let store = MemoryStore::new();
        let window = Duration::from_millis(20);

        for _ in 0..3 {
            assert!(store.check_and_increment("c", 3, window).await.unwrap().allowed);
        }
        assert!(!store.check_and_increment("c", 3, window).await.unwrap().allowed);

        tokio::time::sleep(Duration::from_millis(40)).await;

        let decision = store.check_and_increment("c", 3, window).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.count, 1, "expired window must restart from zero");
    }

    #[tokio::test]
    async fn concurrent_increments_are_serialized() {
        let store = Arc::new(MemoryStore::new());
        let limit = 5u32;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .check_and_increment("c", limit, Duration::from_secs(60))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let decisions = futures::future::join_all(handles).await;
        let allowed = decisions
            .iter()
            .filter(|d| d.as_ref().unwrap().allowed)
            .count();

        assert_eq!(
            allowed, limit as usize,
            "exactly `limit` concurrent callers may pass"
        );
    }
}
