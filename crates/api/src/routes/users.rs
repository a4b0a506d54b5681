//! Route definitions for the `/users` and `/admin` resources.

use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(users::me))
}

/// Routes mounted at `/admin` (superadmin scope enforced per handler).
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/users", get(users::list))
}
