//! Scope-based access control extractors.
//!
//! Wraps [`AuthUser`] and rejects requests whose scopes do not meet the
//! requirement, enforcing authorization at the type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use sesame_core::error::CoreError;
use sesame_core::scopes::SCOPE_SUPERADMIN;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `superadmin` scope. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireSuperadmin(user): RequireSuperadmin) -> AppResult<Json<()>> {
///     // user is guaranteed to hold the superadmin scope here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireSuperadmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireSuperadmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.has_scope(SCOPE_SUPERADMIN) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Superadmin scope required".into(),
            )));
        }
        Ok(RequireSuperadmin(user))
    }
}
