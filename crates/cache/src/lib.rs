//! Cache-store abstraction for the sesame credential service.
//!
//! All cross-request coordination state (live OTP challenges, rate-limit
//! counters) lives behind the [`CacheStore`] trait so the engine can run
//! against [`MemoryStore`] in tests without a Redis instance. Production
//! uses [`RedisStore`], whose check-and-increment primitive executes as a
//! single server-side Lua script.

pub mod memory_store;
pub mod rate_limit;
pub mod redis_store;
pub mod store;

pub use memory_store::MemoryStore;
pub use rate_limit::RateLimiter;
pub use redis_store::RedisStore;
pub use store::{CacheError, CacheStore, CounterDecision};
