//! Route definitions for the `/auth` resource.

use axum::routing::post;
use axum::{middleware, Router};

use crate::handlers::auth;
use crate::middleware::rate_limit::ip_rate_limit;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /send-otp  -> send_otp
/// POST /login     -> login
/// POST /refresh   -> refresh
/// POST /logout    -> logout
/// ```
///
/// The whole group sits behind the per-address rate limit.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/send-otp", post(auth::send_otp))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .layer(middleware::from_fn_with_state(state, ip_rate_limit))
}
