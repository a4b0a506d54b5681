use std::sync::Arc;

use sesame_cache::{CacheStore, RateLimiter};

use crate::auth::jwt::JwtSigner;
use crate::config::ServerConfig;
use crate::delivery::OtpSender;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already
/// `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: sesame_db::DbPool,
    /// Cache store backing OTP challenges and rate counters.
    pub cache: Arc<dyn CacheStore>,
    /// Rate limiter over the cache store.
    pub limiter: RateLimiter,
    /// OTP delivery transport.
    pub sender: Arc<dyn OtpSender>,
    /// Access-token signer/verifier.
    pub jwt: Arc<JwtSigner>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
