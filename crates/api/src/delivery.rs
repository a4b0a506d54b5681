//! OTP delivery collaborator.
//!
//! The code travels to the user out of band (SMS in production). The trait
//! is the pluggable seam; [`ConsoleSender`] is the development transport
//! that logs the code instead of sending it.

use async_trait::async_trait;

use sesame_core::phone::PhoneNumber;

/// Transport error from a delivery backend. Surfaced, never swallowed.
#[derive(Debug, thiserror::Error)]
#[error("OTP delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Sends an OTP code to a phone number. Implementations must be safe to
/// retry with the same code.
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, phone: &PhoneNumber, code: &str) -> Result<(), DeliveryError>;
}

/// Development transport: prints the code to the log.
pub struct ConsoleSender;

#[async_trait]
impl OtpSender for ConsoleSender {
    async fn send(&self, phone: &PhoneNumber, code: &str) -> Result<(), DeliveryError> {
        tracing::info!(%phone, code, "OTP dispatch (console transport)");
        Ok(())
    }
}
