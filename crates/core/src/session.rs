//! Session identifier value object.
//!
//! A session id binds an OTP challenge to the client that requested it, and
//! later binds a refresh-token family to that same client. Knowing a phone
//! number alone is not enough to attempt codes; the caller must also hold
//! the session id returned by send-OTP.

use std::fmt;

use rand::RngCore;
use serde::Serialize;

use crate::error::CoreError;

/// Number of random bytes backing a session id.
pub const SESSION_ID_BYTES: usize = 32;

/// Length of the hex-encoded session id string.
pub const SESSION_ID_LENGTH: usize = SESSION_ID_BYTES * 2;

/// An opaque, high-entropy session identifier (32 random bytes, hex-encoded).
///
/// Compared by exact byte equality; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new random session id from the OS-seeded CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex_encode(&bytes))
    }

    /// Validate a caller-supplied session id string.
    ///
    /// Must be exactly [`SESSION_ID_LENGTH`] hex characters. Surrounding
    /// whitespace is ignored.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let input = input.trim();

        if input.is_empty() {
            return Err(CoreError::Validation("session id cannot be empty".into()));
        }
        if input.len() != SESSION_ID_LENGTH {
            return Err(CoreError::Validation("invalid session id length".into()));
        }
        if !input.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::Validation("invalid session id format".into()));
        }

        Ok(Self(input.to_string()))
    }

    /// The hex string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase hex encoding without pulling in a dedicated crate.
fn hex_encode(bytes: &[u8]) -> String {
    use fmt::Write;
    bytes.iter().fold(
        String::with_capacity(bytes.len() * 2),
        |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        },
    )
}
