//! Per-client-address rate limiting for the auth routes.
//!
//! A courtesy limit on top of the per-phone quota inside send-OTP. Fails
//! open when the cache store errors: losing the limiter must not take the
//! login path down with it.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use sesame_cache::rate_limit::SCOPE_IP;
use sesame_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Axum middleware applying the shared rate limiter keyed by client address.
pub async fn ip_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ip) = client_ip(&request) else {
        // No way to identify the caller; let the per-phone limit carry it.
        return Ok(next.run(request).await);
    };

    let limit = state.config.rate_limit.ip_limit;
    let window = state.config.rate_limit.ip_window;

    match state
        .limiter
        .check_and_increment(SCOPE_IP, &ip, limit, window)
        .await
    {
        Ok(decision) if !decision.allowed => {
            tracing::debug!(%ip, count = decision.count, "IP rate limit exceeded");
            Err(AppError::Core(CoreError::RateLimited(
                "Too many requests from this address".into(),
            )))
        }
        Ok(decision) => {
            let mut response = next.run(request).await;
            let remaining = limit.saturating_sub(decision.count);
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", int_header(limit));
            headers.insert("x-ratelimit-remaining", int_header(remaining));
            Ok(response)
        }
        Err(err) => {
            tracing::warn!(error = %err, "Rate limiter unavailable; allowing request");
            Ok(next.run(request).await)
        }
    }
}

fn int_header(value: u32) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).expect("integer header value")
}

/// Resolve the client address: `X-Forwarded-For` first (leftmost hop), then
/// the socket address when served with connect info.
fn client_ip(request: &Request) -> Option<String> {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    forwarded.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip().to_string())
    })
}
