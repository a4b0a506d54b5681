//! Handlers for the `/auth` resource (send-OTP, login, refresh, logout).
//!
//! This module is the credential lifecycle engine. All coordination state
//! lives in the cache and the database; the handlers themselves are
//! stateless, so correctness under concurrency rests on two store
//! guarantees: the cache's atomic check-and-increment, and the conditional
//! revoke whose row count decides the rotation race.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use sesame_cache::rate_limit::SCOPE_PHONE;
use sesame_core::error::CoreError;
use sesame_core::otp::{challenge_key, generate_code, OtpChallenge};
use sesame_core::phone::PhoneNumber;
use sesame_core::secrets::{generate_refresh_secret, hash_refresh_secret};
use sesame_core::session::SessionId;
use sesame_core::types::{DbId, Timestamp};
use sesame_db::models::refresh_token::{
    CreateRefreshToken, REVOKE_REASON_LOGOUT, REVOKE_REASON_REFRESH,
};
use sesame_db::repositories::{RefreshTokenRepo, UserRepo};

use crate::auth::hash::{hash_otp, verify_otp};
use crate::error::{AppError, AppResult};
use crate::handlers::users::UserInfo;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/send-otp`.
#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub phone_number: String,
    /// Session id from a previous send-OTP call, if the client holds one.
    pub session_id: Option<String>,
}

/// Response for `POST /auth/send-otp`. The client must persist the session
/// id and present it on login.
#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub message: String,
    pub session_id: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub phone_number: String,
    pub otp: String,
    pub session_id: String,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Timestamp,
    pub refresh_expires_at: Timestamp,
    pub user: UserInfo,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
    pub session_id: String,
}

/// Successful refresh response.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Timestamp,
    pub refresh_expires_at: Timestamp,
}

/// Request body for `POST /auth/logout`. Both fields optional; logging out
/// with nothing to revoke is still a success.
#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response for `POST /auth/logout`.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/send-otp
///
/// Issue an OTP challenge for a phone number. A new challenge overwrites
/// any previous one for the same phone, so at most one is ever live.
pub async fn send_otp(
    State(state): State<AppState>,
    Json(input): Json<SendOtpRequest>,
) -> AppResult<Json<SendOtpResponse>> {
    // 1. Validate the phone number.
    let phone = PhoneNumber::parse(&input.phone_number)?;

    // 2. Per-phone quota. One atomic store operation: rejected calls never
    //    increment, so a burst of concurrent requests cannot all slip under
    //    the limit.
    let decision = state
        .limiter
        .check_and_increment(
            SCOPE_PHONE,
            phone.as_str(),
            state.config.rate_limit.otp_limit,
            state.config.rate_limit.otp_window,
        )
        .await?;
    if !decision.allowed {
        tracing::debug!(phone = %phone, count = decision.count, "OTP send quota exceeded");
        return Err(AppError::Core(CoreError::RateLimited(
            "Too many OTP requests for this phone number".into(),
        )));
    }

    // 3. Reuse the caller's session id when present and well-formed,
    //    otherwise mint a fresh one.
    let session_id = input
        .session_id
        .as_deref()
        .and_then(|raw| SessionId::parse(raw).ok())
        .unwrap_or_else(SessionId::generate);

    // 4. Generate and hash the code. The plaintext only travels to the
    //    delivery transport; the store sees the hash.
    let code = generate_code(state.config.otp.code_length);
    let code_hash = hash_otp(&code, state.config.otp.bcrypt_cost)
        .map_err(|e| AppError::InternalError(format!("OTP hashing error: {e}")))?;

    // 5. Store the challenge, overwriting any prior one for this phone.
    let challenge = OtpChallenge {
        session_id: session_id.clone(),
        code_hash,
    };
    state
        .cache
        .set_with_ttl(
            &challenge_key(&phone),
            &challenge.encode(),
            state.config.otp.ttl,
        )
        .await?;

    // 6. Dispatch. On failure the stored challenge remains and simply
    //    expires; the caller may retry.
    state.sender.send(&phone, &code).await.map_err(|e| {
        tracing::error!(phone = %phone, error = %e, "OTP dispatch failed");
        AppError::Core(CoreError::Internal("Failed to dispatch OTP code".into()))
    })?;

    Ok(Json(SendOtpResponse {
        message: "OTP sent".to_string(),
        session_id: session_id.to_string(),
    }))
}

/// POST /api/v1/auth/login
///
/// Verify an OTP challenge and issue credentials. Registers the user on
/// first successful verification -- there is no separate signup flow.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let phone = PhoneNumber::parse(&input.phone_number)?;
    let session_id = SessionId::parse(&input.session_id)?;

    // 1. Fetch the live challenge. Absent covers never-sent, consumed, and
    //    expired alike -- the store TTL makes these indistinguishable on
    //    purpose.
    let key = challenge_key(&phone);
    let raw = state
        .cache
        .get(&key)
        .await?
        .ok_or_else(|| CoreError::NotFound("No OTP found for this phone number".into()))?;
    let challenge = OtpChallenge::decode(&raw)?;

    // 2. Verify the code. Mismatch and session mismatch share the same
    //    error class so callers get no oracle for which part was wrong.
    let code_matches = verify_otp(&input.otp, &challenge.code_hash)
        .map_err(|e| AppError::InternalError(format!("OTP verification error: {e}")))?;
    if !code_matches {
        return Err(AppError::Core(CoreError::Unauthorized("Invalid OTP".into())));
    }

    // 3. Verify the session binding.
    if challenge.session_id != session_id {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Session mismatch".into(),
        )));
    }

    // 4. Consume the challenge: single use, even within the TTL. Deletion
    //    failure is logged but does not fail the login -- fail-open on
    //    cleanup, fail-closed on verification.
    if let Err(err) = state.cache.delete(&key).await {
        tracing::warn!(error = %err, phone = %phone, "Failed to delete consumed OTP challenge");
    }

    // 5. Upsert the user (registration-by-first-login).
    let user = UserRepo::upsert_by_phone(&state.pool, phone.as_str()).await?;

    // 6-7. Mint the token pair and persist the refresh row.
    let scopes = vec![user.scope.clone()];
    let issued = issue_credentials(&state, user.id, &scopes, &session_id).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        access_token: issued.access_token,
        refresh_token: issued.refresh_token,
        expires_at: issued.expires_at,
        refresh_expires_at: issued.refresh_expires_at,
        user: UserInfo::from(user),
    }))
}

/// POST /api/v1/auth/refresh
///
/// Rotate a refresh token: revoke the presented one and issue a new pair.
/// This is a state transition, not a read -- the old token is dead after
/// this call whether or not the caller receives the response.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let session_id = SessionId::parse(&input.session_id)?;

    // 1. Look the row up by (hash, session id); both must match.
    let token_hash = hash_refresh_secret(&input.refresh_token);
    let stored = RefreshTokenRepo::find_by_hash_and_session(
        &state.pool,
        &token_hash,
        session_id.as_str(),
    )
    .await?
    .ok_or_else(|| CoreError::Unauthorized("Invalid refresh token".into()))?;

    // 2. Reject revoked and expired tokens with the same shape as a miss.
    //    A revoked token showing up again is the replay signal, so it gets
    //    a log line even though the response stays uniform.
    let now = Utc::now();
    if stored.revoked {
        tracing::warn!(
            user_id = stored.user_id,
            session_id = %stored.session_id,
            "Revoked refresh token presented again; possible token theft"
        );
        return Err(AppError::Core(CoreError::Unauthorized(
            "Refresh token is expired or revoked".into(),
        )));
    }
    if stored.is_expired(now) {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Refresh token is expired or revoked".into(),
        )));
    }

    // 3. The gating write: revoke first, then trust only the row count. If
    //    a concurrent refresh already revoked the row, this caller lost the
    //    race and the whole refresh fails -- two rotations can never both
    //    succeed from one token.
    let won = RefreshTokenRepo::revoke_active(
        &state.pool,
        &token_hash,
        session_id.as_str(),
        REVOKE_REASON_REFRESH,
    )
    .await?;
    if !won {
        tracing::warn!(
            user_id = stored.user_id,
            session_id = %stored.session_id,
            "Lost refresh rotation race"
        );
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid refresh token".into(),
        )));
    }

    // Bookkeeping on the consumed row; never fails the rotation.
    if let Err(err) = RefreshTokenRepo::touch_last_used(&state.pool, stored.id).await {
        tracing::warn!(error = %err, token_id = stored.id, "Failed to record last_used_at");
    }

    // 4. Mint the replacement pair for the same user and session.
    let user = UserRepo::find_by_id(&state.pool, stored.user_id)
        .await?
        .ok_or_else(|| CoreError::Unauthorized("User no longer exists".into()))?;

    let scopes = vec![user.scope.clone()];
    let issued = issue_credentials(&state, user.id, &scopes, &session_id).await?;

    Ok(Json(RefreshResponse {
        message: "Token refreshed".to_string(),
        access_token: issued.access_token,
        refresh_token: issued.refresh_token,
        expires_at: issued.expires_at,
        refresh_expires_at: issued.refresh_expires_at,
    }))
}

/// POST /api/v1/auth/logout
///
/// Idempotent revoke. "Nothing to revoke" -- no token supplied, token
/// unknown, already revoked, expired -- is success, not an error.
pub async fn logout(
    State(state): State<AppState>,
    Json(input): Json<LogoutRequest>,
) -> AppResult<Json<LogoutResponse>> {
    let response = LogoutResponse {
        message: "Logout successful".to_string(),
    };

    let Some(token) = input
        .refresh_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return Ok(Json(response));
    };

    let token_hash = hash_refresh_secret(token);

    // Use the session binding when the caller supplied a well-formed id;
    // fall back to hash-only revocation otherwise. The hash alone already
    // identifies exactly one row.
    let session = input
        .session_id
        .as_deref()
        .and_then(|raw| SessionId::parse(raw).ok());

    let revoked = match session {
        Some(session_id) => {
            RefreshTokenRepo::revoke_active(
                &state.pool,
                &token_hash,
                session_id.as_str(),
                REVOKE_REASON_LOGOUT,
            )
            .await?
        }
        None => {
            RefreshTokenRepo::revoke_active_by_hash(&state.pool, &token_hash, REVOKE_REASON_LOGOUT)
                .await?
        }
    };

    if !revoked {
        tracing::debug!("Logout presented an unknown or already-revoked token");
    }

    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct IssuedCredentials {
    access_token: String,
    refresh_token: String,
    expires_at: Timestamp,
    refresh_expires_at: Timestamp,
}

/// Sign an access token, mint an opaque refresh secret, and persist the
/// refresh row bound to `(user, session)`.
async fn issue_credentials(
    state: &AppState,
    user_id: DbId,
    scopes: &[String],
    session_id: &SessionId,
) -> Result<IssuedCredentials, AppError> {
    let access_token = state
        .jwt
        .sign(user_id, scopes)
        .map_err(|e| AppError::InternalError(format!("Token signing error: {e}")))?;

    let secret = generate_refresh_secret();

    let now = Utc::now();
    let expires_at = now + chrono::Duration::minutes(state.config.jwt.access_ttl_mins);
    let refresh_expires_at = now + chrono::Duration::days(state.config.jwt.refresh_ttl_days);

    let input = CreateRefreshToken {
        user_id,
        session_id: session_id.as_str().to_string(),
        token_hash: secret.hash,
        expires_at: refresh_expires_at,
    };
    RefreshTokenRepo::create(&state.pool, &input).await?;

    Ok(IssuedCredentials {
        access_token,
        refresh_token: secret.plaintext,
        expires_at,
        refresh_expires_at,
    })
}
