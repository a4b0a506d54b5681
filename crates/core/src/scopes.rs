//! User scope constants embedded in access-token claims.

/// Default scope assigned at registration.
pub const SCOPE_USER: &str = "user";

/// Elevated scope for administrative endpoints.
pub const SCOPE_SUPERADMIN: &str = "superadmin";
