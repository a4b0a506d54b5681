pub mod auth;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/send-otp      issue an OTP challenge (public, rate limited)
/// /auth/login         verify OTP, issue tokens (public, rate limited)
/// /auth/refresh       rotate refresh token (public, rate limited)
/// /auth/logout        revoke refresh token (public, idempotent)
///
/// /users/me           caller's profile (requires auth)
///
/// /admin/users        list users (superadmin scope)
/// ```
///
/// The state is taken here (not only in `.with_state`) because the
/// rate-limit middleware needs it at layer-construction time.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router(state))
        .nest("/users", users::router())
        .nest("/admin", users::admin_router())
}
