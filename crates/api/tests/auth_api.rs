//! HTTP-level integration tests for the OTP challenge and token lifecycle.
//!
//! Tests cover send-OTP (session issuance, overwrite-on-resend, rate
//! limits), login (verification, session binding, single use,
//! registration-by-first-login), refresh rotation (including the
//! concurrent race), and logout idempotence.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, build_test_app_with, login_with_otp, post_json,
    post_json_from_ip, request_otp, test_config};
use sqlx::PgPool;

const PHONE: &str = "09123456789";
const PHONE_CANONICAL: &str = "+989123456789";
const OTHER_PHONE: &str = "09123456780";

// ---------------------------------------------------------------------------
// Send-OTP
// ---------------------------------------------------------------------------

/// Send-OTP returns a 64-hex-char session id and dispatches a 6-digit code.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_send_otp_issues_session_and_code(pool: PgPool) {
    let test = build_test_app(pool);

    let (session_id, code) = request_otp(&test, PHONE).await;

    assert_eq!(session_id.len(), 64);
    assert!(session_id.bytes().all(|b| b.is_ascii_hexdigit()));
    assert_eq!(code.len(), 6);
    assert!(code.bytes().all(|b| b.is_ascii_digit()));
    assert_ne!(code.as_bytes()[0], b'0');

    // The code goes to the canonical phone number.
    let (phone, _) = test.sender.last().await.unwrap();
    assert_eq!(phone, PHONE_CANONICAL);
}

/// A malformed phone number is a validation error, not an auth error.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_send_otp_rejects_malformed_phone(pool: PgPool) {
    let test = build_test_app(pool);

    let body = serde_json::json!({ "phone_number": "12345" });
    let response = post_json(test.router.clone(), "/api/v1/auth/send-otp", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

/// A client that already holds a session id keeps it across resends.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_send_otp_reuses_supplied_session(pool: PgPool) {
    let test = build_test_app(pool);

    let (session_id, _) = request_otp(&test, PHONE).await;

    let body = serde_json::json!({ "phone_number": PHONE, "session_id": session_id });
    let response = post_json(test.router.clone(), "/api/v1/auth/send-otp", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["session_id"], session_id.as_str());
}

/// Equivalent local and international forms address the same challenge slot.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_phone_forms_share_one_challenge(pool: PgPool) {
    let test = build_test_app(pool);

    let (_, _first_code) = request_otp(&test, PHONE).await;
    let (session_id, code) = request_otp(&test, PHONE_CANONICAL).await;

    // Logging in with the local form consumes the challenge written under
    // the canonical key.
    let body = serde_json::json!({
        "phone_number": PHONE,
        "otp": code,
        "session_id": session_id,
    });
    let response = post_json(test.router.clone(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// First successful verification registers the user with default scope.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_registers_user_on_first_verification(pool: PgPool) {
    let test = build_test_app(pool);

    let (json, _) = login_with_otp(&test, PHONE).await;

    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["user"]["phone_number"], PHONE_CANONICAL);
    assert_eq!(json["user"]["scope"], "user");

    let first_id = json["user"]["id"].as_i64().unwrap();

    // A second OTP cycle reuses the same user row.
    let (json, _) = login_with_otp(&test, PHONE).await;
    assert_eq!(json["user"]["id"].as_i64().unwrap(), first_id);
}

/// A wrong code (one digit off) is 401 Unauthorized, not a validation error.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_wrong_code_fails(pool: PgPool) {
    let test = build_test_app(pool);
    let (session_id, code) = request_otp(&test, PHONE).await;

    // Flip the last digit.
    let mut wrong = code.clone();
    let last = wrong.pop().unwrap();
    wrong.push(if last == '9' { '0' } else { (last as u8 + 1) as char });

    let body = serde_json::json!({
        "phone_number": PHONE,
        "otp": wrong,
        "session_id": session_id,
    });
    let response = post_json(test.router.clone(), "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

/// The correct code under the wrong session id fails with the same class.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_session_binding(pool: PgPool) {
    let test = build_test_app(pool);

    let (_, code) = request_otp(&test, PHONE).await;
    // A well-formed session id that is not the one bound to the challenge.
    let (other_session, _) = request_otp(&test, OTHER_PHONE).await;

    let body = serde_json::json!({
        "phone_number": PHONE,
        "otp": code,
        "session_id": other_session,
    });
    let response = post_json(test.router.clone(), "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Verifying without any challenge (never sent) is 404.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_without_challenge(pool: PgPool) {
    let test = build_test_app(pool);

    let body = serde_json::json!({
        "phone_number": PHONE,
        "otp": "123456",
        "session_id": "a".repeat(64),
    });
    let response = post_json(test.router.clone(), "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// A challenge is single use: replaying the exact same triple fails.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_consumes_challenge(pool: PgPool) {
    let test = build_test_app(pool);
    let (session_id, code) = request_otp(&test, PHONE).await;

    let body = serde_json::json!({
        "phone_number": PHONE,
        "otp": code,
        "session_id": session_id,
    });

    let response = post_json(test.router.clone(), "/api/v1/auth/login", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Immediately replaying the same (phone, code, session) must fail: the
    // challenge is gone even though its TTL has not elapsed.
    let response = post_json(test.router.clone(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// A new send-OTP invalidates the previous challenge for the same phone.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_resend_invalidates_previous_challenge(pool: PgPool) {
    let test = build_test_app(pool);

    let (first_session, first_code) = request_otp(&test, PHONE).await;
    let (_second_session, _second_code) = request_otp(&test, PHONE).await;

    let body = serde_json::json!({
        "phone_number": PHONE,
        "otp": first_code,
        "session_id": first_session,
    });
    let response = post_json(test.router.clone(), "/api/v1/auth/login", body).await;

    assert_eq!(
        response.status(),
        StatusCode::UNAUTHORIZED,
        "first code must be dead after the second send"
    );
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

/// With limit 3, exactly 3 sends succeed and the 4th is rejected; after the
/// window elapses the quota resets in full.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_send_otp_rate_limit_boundary(pool: PgPool) {
    let mut config = test_config();
    config.rate_limit.otp_limit = 3;
    config.rate_limit.otp_window = std::time::Duration::from_millis(300);
    let test = build_test_app_with(pool, config);

    let body = serde_json::json!({ "phone_number": PHONE });
    for _ in 0..3 {
        let response =
            post_json(test.router.clone(), "/api/v1/auth/send-otp", body.clone()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = post_json(test.router.clone(), "/api/v1/auth/send-otp", body.clone()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["code"], "RATE_LIMIT_ERROR");

    // Another phone is an independent quota.
    let other = serde_json::json!({ "phone_number": OTHER_PHONE });
    let response = post_json(test.router.clone(), "/api/v1/auth/send-otp", other).await;
    assert_eq!(response.status(), StatusCode::OK);

    // After the window passes, the original phone may send again.
    tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    let response = post_json(test.router.clone(), "/api/v1/auth/send-otp", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// The per-address limit rejects a chatty client and leaves others alone.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ip_rate_limit(pool: PgPool) {
    let mut config = test_config();
    config.rate_limit.ip_limit = 2;
    // Keep the per-phone quota out of the way.
    config.rate_limit.otp_limit = 100;
    let test = build_test_app_with(pool, config);

    let body = serde_json::json!({ "phone_number": PHONE });
    for _ in 0..2 {
        let response = post_json_from_ip(
            test.router.clone(),
            "/api/v1/auth/send-otp",
            body.clone(),
            "203.0.113.7",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-ratelimit-remaining"));
    }

    let response = post_json_from_ip(
        test.router.clone(),
        "/api/v1/auth/send-otp",
        body.clone(),
        "203.0.113.7",
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = post_json_from_ip(
        test.router.clone(),
        "/api/v1/auth/send-otp",
        body,
        "203.0.113.8",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Refresh rotation
// ---------------------------------------------------------------------------

/// Refresh rotates the pair; the predecessor is dead, the successor works
/// exactly once.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_rotation_invalidates_predecessor(pool: PgPool) {
    let test = build_test_app(pool);
    let (login, session_id) = login_with_otp(&test, PHONE).await;
    let original = login["refresh_token"].as_str().unwrap().to_string();

    // Rotate.
    let body = serde_json::json!({ "refresh_token": original, "session_id": session_id });
    let response = post_json(test.router.clone(), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let rotated = json["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, original, "refresh token must rotate on use");
    assert!(json["access_token"].is_string());

    // The original is permanently dead.
    let body = serde_json::json!({ "refresh_token": original, "session_id": session_id });
    let response = post_json(test.router.clone(), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The rotated token works exactly once.
    let body = serde_json::json!({ "refresh_token": rotated, "session_id": session_id });
    let response = post_json(test.router.clone(), "/api/v1/auth/refresh", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = post_json(test.router.clone(), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A refresh token only works under the session it was issued for.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_requires_matching_session(pool: PgPool) {
    let test = build_test_app(pool);
    let (login, _session_id) = login_with_otp(&test, PHONE).await;
    let token = login["refresh_token"].as_str().unwrap();

    let body = serde_json::json!({
        "refresh_token": token,
        "session_id": "f".repeat(64),
    });
    let response = post_json(test.router.clone(), "/api/v1/auth/refresh", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A garbage refresh token is 401.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_with_unknown_token(pool: PgPool) {
    let test = build_test_app(pool);

    let body = serde_json::json!({
        "refresh_token": "not-a-real-token",
        "session_id": "a".repeat(64),
    });
    let response = post_json(test.router.clone(), "/api/v1/auth/refresh", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Two simultaneous refreshes with the same valid token: exactly one wins.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_refresh_race(pool: PgPool) {
    let test = build_test_app(pool);
    let (login, session_id) = login_with_otp(&test, PHONE).await;
    let token = login["refresh_token"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "refresh_token": token, "session_id": session_id });
    let (a, b) = tokio::join!(
        post_json(test.router.clone(), "/api/v1/auth/refresh", body.clone()),
        post_json(test.router.clone(), "/api/v1/auth/refresh", body),
    );

    let statuses = [a.status(), b.status()];
    assert!(
        statuses.contains(&StatusCode::OK),
        "one refresh must succeed, got {statuses:?}"
    );
    assert!(
        statuses.contains(&StatusCode::UNAUTHORIZED),
        "the other refresh must lose the race, got {statuses:?}"
    );
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

/// Logout revokes the refresh token and is idempotent.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout_is_idempotent(pool: PgPool) {
    let test = build_test_app(pool);
    let (login, session_id) = login_with_otp(&test, PHONE).await;
    let token = login["refresh_token"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "refresh_token": token, "session_id": session_id });
    let response = post_json(test.router.clone(), "/api/v1/auth/logout", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Logging out again with the already-revoked token still succeeds.
    let response = post_json(test.router.clone(), "/api/v1/auth/logout", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The revoked token can no longer refresh.
    let body = serde_json::json!({
        "refresh_token": login["refresh_token"].as_str().unwrap(),
        "session_id": session_id,
    });
    let response = post_json(test.router.clone(), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Logout with no token material is trivially successful.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout_without_token(pool: PgPool) {
    let test = build_test_app(pool);

    let response = post_json(
        test.router.clone(),
        "/api/v1/auth/logout",
        serde_json::json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Logout successful");
}
