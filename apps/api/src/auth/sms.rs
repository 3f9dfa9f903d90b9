//! Outbound SMS delivery seam.
//!
//! No provider is wired up yet; `LogSmsSender` writes the code to the log so
//! the flow is exercisable end to end. A real gateway (SMSC, Twilio) slots in
//! behind the same trait.

use async_trait::async_trait;

use crate::errors::AppError;

#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Delivers a verification code to the phone. Errors surface to the
    /// caller; a failed send must not leave the user with a usable code.
    async fn send_code(&self, phone: &str, code: &str) -> Result<(), AppError>;
}

/// Development sender: logs instead of sending.
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send_code(&self, phone: &str, code: &str) -> Result<(), AppError> {
        tracing::info!(phone = %phone, code = %code, "SMS send stub");
        Ok(())
    }
}
