//! Opaque refresh-token secret generation.
//!
//! Refresh tokens are not signed tokens; they are random strings whose only
//! meaning is as a lookup key. The plaintext is handed to the client once
//! and never stored -- only the SHA-256 digest is persisted.

use rand::Rng;

use crate::hashing::sha256_hex;

/// Length of the generated secret string (alphanumeric characters).
pub const REFRESH_SECRET_LENGTH: usize = 48;

/// The result of generating a new refresh secret.
pub struct GeneratedSecret {
    /// The plaintext secret (sent to the client exactly once, never stored).
    pub plaintext: String,
    /// The SHA-256 hex digest of the plaintext (stored in the database).
    pub hash: String,
}

/// Generate a new random refresh secret and its storage digest.
pub fn generate_refresh_secret() -> GeneratedSecret {
    let plaintext: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(REFRESH_SECRET_LENGTH)
        .map(char::from)
        .collect();

    let hash = hash_refresh_secret(&plaintext);

    GeneratedSecret { plaintext, hash }
}

/// Compute the storage digest of a refresh secret.
///
/// Used both at creation (to store the digest) and at refresh/logout time
/// (to look the row up by digest).
pub fn hash_refresh_secret(secret: &str) -> String {
    sha256_hex(secret.as_bytes())
}
