//! HTTP-level integration tests for profile and admin user endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, get_auth, login_with_otp};
use sqlx::PgPool;

use sesame_core::scopes::SCOPE_SUPERADMIN;

const PHONE: &str = "09123456789";
const PHONE_CANONICAL: &str = "+989123456789";

/// Grant the superadmin scope directly in the database.
async fn promote_to_superadmin(pool: &PgPool, phone: &str) {
    sqlx::query("UPDATE users SET scope = $1, updated_at = now() WHERE phone_number = $2")
        .bind(SCOPE_SUPERADMIN)
        .bind(phone)
        .execute(pool)
        .await
        .expect("scope update should succeed");
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// /users/me requires authentication.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_me_requires_auth(pool: PgPool) {
    let test = build_test_app(pool);

    let response = get(test.router.clone(), "/api/v1/users/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// /users/me returns the caller's profile.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_me_returns_profile(pool: PgPool) {
    let test = build_test_app(pool);
    let (login, _) = login_with_otp(&test, PHONE).await;
    let token = login["access_token"].as_str().unwrap();

    let response = get_auth(test.router.clone(), "/api/v1/users/me", token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["phone_number"], PHONE_CANONICAL);
    assert_eq!(json["scope"], "user");
    assert_eq!(json["id"], login["user"]["id"]);
}

/// A garbage bearer token is rejected.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_me_rejects_bad_token(pool: PgPool) {
    let test = build_test_app(pool);

    let response = get_auth(test.router.clone(), "/api/v1/users/me", "bogus").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Admin listing
// ---------------------------------------------------------------------------

/// Admin endpoints require authentication.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_users_requires_auth(pool: PgPool) {
    let test = build_test_app(pool);

    let response = get(test.router.clone(), "/api/v1/admin/users").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// The default `user` scope is forbidden from admin endpoints.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_users_requires_superadmin_scope(pool: PgPool) {
    let test = build_test_app(pool);
    let (login, _) = login_with_otp(&test, PHONE).await;
    let token = login["access_token"].as_str().unwrap();

    let response = get_auth(test.router.clone(), "/api/v1/admin/users", token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// A superadmin can list users with pagination metadata.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_users_listing(pool: PgPool) {
    let test = build_test_app(pool.clone());

    // Register two users, then grant one the superadmin scope. The elevated
    // scope lands in claims on the next login.
    login_with_otp(&test, PHONE).await;
    login_with_otp(&test, "09123456780").await;
    promote_to_superadmin(&pool, PHONE_CANONICAL).await;
    let (login, _) = login_with_otp(&test, PHONE).await;
    assert_eq!(login["user"]["scope"], SCOPE_SUPERADMIN);
    let token = login["access_token"].as_str().unwrap();

    let response = get_auth(test.router.clone(), "/api/v1/admin/users", token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total"].as_i64().unwrap(), 2);
    assert_eq!(json["page"], 1);
    assert_eq!(json["limit"], 10);
    assert_eq!(json["users"].as_array().unwrap().len(), 2);
}

/// Listing supports phone-prefix search and page-size clamping.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_users_search_and_pagination(pool: PgPool) {
    let test = build_test_app(pool.clone());

    login_with_otp(&test, PHONE).await;
    login_with_otp(&test, "09123456780").await;
    login_with_otp(&test, "09351234567").await;
    promote_to_superadmin(&pool, PHONE_CANONICAL).await;
    let (login, _) = login_with_otp(&test, PHONE).await;
    let token = login["access_token"].as_str().unwrap();

    // Prefix search: only the two +98912... numbers match.
    let response = get_auth(
        test.router.clone(),
        "/api/v1/admin/users?search_phone=%2B98912",
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"].as_i64().unwrap(), 2);

    // Page size of 1 paginates.
    let response = get_auth(test.router.clone(), "/api/v1/admin/users?limit=1", token).await;
    let json = body_json(response).await;
    assert_eq!(json["users"].as_array().unwrap().len(), 1);
    assert_eq!(json["total"].as_i64().unwrap(), 3);

    // Page 2 with limit 2 holds the remaining row.
    let response = get_auth(
        test.router.clone(),
        "/api/v1/admin/users?page=2&limit=2",
        token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["users"].as_array().unwrap().len(), 1);
}
