//! Shared SHA-256 hex digest utility.
//!
//! Used for refresh-token digests; the token only has meaning as a database
//! lookup key, so a fast keyed-by-entropy digest is sufficient there.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}
