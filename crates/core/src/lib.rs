//! Domain layer for the sesame credential service.
//!
//! Holds the validated value objects (phone number, session id), OTP
//! challenge encoding, secret generation, scope constants, and the shared
//! error taxonomy. This crate has no store or HTTP dependencies so the
//! rules it encodes can be unit-tested in isolation.

pub mod error;
pub mod hashing;
pub mod otp;
pub mod phone;
pub mod scopes;
pub mod secrets;
pub mod session;
pub mod types;
