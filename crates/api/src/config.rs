use std::time::Duration;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the signing keys have sensible defaults suitable for
/// local development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (keys, TTLs, claim values).
    pub jwt: JwtConfig,
    /// OTP challenge configuration.
    pub otp: OtpConfig,
    /// Rate-limit configuration.
    pub rate_limit: RateLimitConfig,
}

/// OTP challenge parameters.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// Number of digits in a generated code (default: `6`).
    pub code_length: usize,
    /// Challenge lifetime; the cache TTL is the only expiry authority
    /// (default: 2 minutes).
    pub ttl: Duration,
    /// bcrypt cost for code hashing (default: `8`, capped at 8).
    pub bcrypt_cost: u32,
}

/// Rate-limit windows and quotas.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Send-OTP quota per phone number (default: `3`).
    pub otp_limit: u32,
    /// Window for the per-phone quota (default: 10 minutes).
    pub otp_window: Duration,
    /// Request quota per client address on auth routes (default: `100`).
    pub ip_limit: u32,
    /// Window for the per-address quota (default: 1 minute).
    pub ip_window: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `8080`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `OTP_LENGTH`            | `6`                     |
    /// | `OTP_TTL_SECS`          | `120`                   |
    /// | `OTP_BCRYPT_COST`       | `8`                     |
    /// | `OTP_RATE_LIMIT`        | `3`                     |
    /// | `OTP_RATE_WINDOW_SECS`  | `600`                   |
    /// | `IP_RATE_LIMIT`         | `100`                   |
    /// | `IP_RATE_WINDOW_SECS`   | `60`                    |
    ///
    /// JWT variables are documented on [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env_u64("REQUEST_TIMEOUT_SECS", 30);

        let otp = OtpConfig {
            code_length: env_u64("OTP_LENGTH", 6) as usize,
            ttl: Duration::from_secs(env_u64("OTP_TTL_SECS", 120)),
            bcrypt_cost: env_u64("OTP_BCRYPT_COST", 8) as u32,
        };

        let rate_limit = RateLimitConfig {
            otp_limit: env_u64("OTP_RATE_LIMIT", 3) as u32,
            otp_window: Duration::from_secs(env_u64("OTP_RATE_WINDOW_SECS", 600)),
            ip_limit: env_u64("IP_RATE_LIMIT", 100) as u32,
            ip_window: Duration::from_secs(env_u64("IP_RATE_WINDOW_SECS", 60)),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            otp,
            rate_limit,
        }
    }
}

/// Read an env var as u64, falling back to `default` when unset.
///
/// # Panics
///
/// Panics if the variable is set but not a valid u64.
fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid u64"))
}
