//! OTP code generation and challenge record encoding.
//!
//! A challenge is the ephemeral `(session id, hashed code)` pair stored in
//! the cache under the phone-number key. The cache entry's TTL is the only
//! expiry authority -- no timestamp is persisted alongside the record, which
//! avoids clock skew between the application and the store.

use rand::Rng;

use crate::error::CoreError;
use crate::phone::PhoneNumber;
use crate::session::SessionId;

/// Default number of digits in a generated code.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Separator between session id and code hash in the stored value.
///
/// Safe because the session id is fixed-width hex and bcrypt digests use the
/// `[./A-Za-z0-9$]` alphabet; neither side can contain a `-`.
const VALUE_SEPARATOR: char = '-';

/// Cache key for the live challenge of a phone number (`otp:<canonical>`).
pub fn challenge_key(phone: &PhoneNumber) -> String {
    format!("otp:{phone}")
}

/// Generate a numeric OTP code of the given length.
///
/// The leading digit is never zero, so the code is always exactly `length`
/// digits when displayed. Uses the OS-seeded CSPRNG -- predictability here
/// would defeat the whole scheme.
pub fn generate_code(length: usize) -> String {
    let length = if length == 0 { DEFAULT_CODE_LENGTH } else { length };
    let mut rng = rand::rng();

    let mut code = String::with_capacity(length);
    code.push(digit(rng.random_range(1..=9)));
    for _ in 1..length {
        code.push(digit(rng.random_range(0..=9)));
    }
    code
}

fn digit(d: u32) -> char {
    char::from_digit(d, 10).expect("digit in range")
}

/// The ephemeral challenge bound to a phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    /// Session the challenge was issued under.
    pub session_id: SessionId,
    /// One-way hash of the code that was dispatched.
    pub code_hash: String,
}

impl OtpChallenge {
    /// Encode the challenge into its cache value (`<sessionID>-<hashedCode>`).
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.session_id, VALUE_SEPARATOR, self.code_hash)
    }

    /// Decode a cache value produced by [`OtpChallenge::encode`].
    ///
    /// A malformed record means the store was written by something else or
    /// corrupted; that is an internal failure, not a caller error.
    pub fn decode(raw: &str) -> Result<Self, CoreError> {
        let (session, hash) = raw
            .split_once(VALUE_SEPARATOR)
            .ok_or_else(|| CoreError::Internal("malformed OTP challenge record".into()))?;

        let session_id = SessionId::parse(session)
            .map_err(|_| CoreError::Internal("malformed session id in challenge record".into()))?;

        if hash.is_empty() {
            return Err(CoreError::Internal("empty code hash in challenge record".into()));
        }

        Ok(Self {
            session_id,
            code_hash: hash.to_string(),
        })
    }
}
