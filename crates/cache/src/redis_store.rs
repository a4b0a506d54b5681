//! Redis-backed [`CacheStore`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use crate::store::{CacheError, CacheStore, CounterDecision};

/// Atomic rate-limit primitive.
///
/// Runs server-side so the read, the limit check, the increment, and the
/// first-hit expiry are one serialized unit. The window is anchored at the
/// first increment; later increments do not extend it, which gives the
/// reset-in-full-after-expiry window semantics.
const CHECK_AND_INCREMENT: &str = r"
local count = tonumber(redis.call('GET', KEYS[1]) or '0')
if count >= tonumber(ARGV[1]) then
    return {0, count}
end
count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[2])
end
return {1, count}
";

/// [`CacheStore`] backed by a Redis connection manager.
///
/// The connection manager multiplexes one connection and reconnects
/// transparently; cloning it is cheap, so each operation works on its own
/// clone.
pub struct RedisStore {
    conn: ConnectionManager,
    check_and_increment: Script,
}

impl RedisStore {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(backend)?;
        let conn = ConnectionManager::new(client).await.map_err(backend)?;
        Ok(Self {
            conn,
            check_and_increment: Script::new(CHECK_AND_INCREMENT),
        })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key, value, ttl.as_secs().max(1))
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(backend)?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(backend)?;
        Ok(())
    }

    async fn check_and_increment(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<CounterDecision, CacheError> {
        let mut conn = self.conn.clone();
        let (allowed, count): (i64, i64) = self
            .check_and_increment
            .key(key)
            .arg(limit)
            .arg(window.as_secs().max(1))
            .invoke_async(&mut conn)
            .await
            .map_err(backend)?;

        Ok(CounterDecision {
            allowed: allowed == 1,
            count: count.max(0) as u32,
        })
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

fn backend(err: redis::RedisError) -> CacheError {
    CacheError::Backend(err.to_string())
}
