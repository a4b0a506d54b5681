//! Handlers for the `/users` and `/admin/users` resources.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use sesame_core::error::CoreError;
use sesame_core::types::{DbId, Timestamp};
use sesame_db::models::user::User;
use sesame_db::repositories::UserRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSuperadmin;
use crate::state::AppState;

/// Default page size for user listings.
const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size for user listings.
const MAX_PAGE_SIZE: i64 = 100;

/// Public user info embedded in auth responses and profile lookups.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub phone_number: String,
    pub scope: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            phone_number: user.phone_number,
            scope: user.scope,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// GET /api/v1/users/me
///
/// Return the authenticated caller's profile.
pub async fn me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<UserInfo>> {
    let row = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or_else(|| CoreError::NotFound("User not found".into()))?;
    Ok(Json(UserInfo::from(row)))
}

/// Query parameters for `GET /admin/users`.
#[derive(Debug, Deserialize)]
pub struct ListUsersParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search_phone: Option<String>,
}

/// Paginated user listing response.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserInfo>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// GET /api/v1/admin/users
///
/// List users, newest first, with pagination and an optional phone-number
/// prefix filter. Superadmin only.
pub async fn list(
    State(state): State<AppState>,
    RequireSuperadmin(_admin): RequireSuperadmin,
    Query(params): Query<ListUsersParams>,
) -> AppResult<Json<UserListResponse>> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let search = params
        .search_phone
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let users = UserRepo::list(&state.pool, limit, offset, search).await?;
    let total = UserRepo::count(&state.pool, search).await?;

    Ok(Json(UserListResponse {
        users: users.into_iter().map(UserInfo::from).collect(),
        total,
        page,
        limit,
    }))
}
