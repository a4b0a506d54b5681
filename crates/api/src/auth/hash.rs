//! bcrypt hashing for OTP codes.
//!
//! OTP codes use a reduced cost so verification stays fast; the window for
//! offline guessing is bounded by the challenge TTL anyway. Verification
//! distinguishes a mismatch (`Ok(false)`) from an internal failure (`Err`).

/// Cost floor accepted by the bcrypt algorithm.
const MIN_COST: u32 = 4;

/// Cost ceiling for OTP hashing. Short-lived secrets need fast verification.
pub const MAX_OTP_COST: u32 = 8;

/// Hash an OTP code with bcrypt at the given cost, capped at
/// [`MAX_OTP_COST`].
pub fn hash_otp(code: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(code, cost.clamp(MIN_COST, MAX_OTP_COST))
}

/// Verify an OTP code against a stored bcrypt hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch.
pub fn verify_otp(code: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(code, hash)
}
