//! Payment confirmation seam.
//!
//! No acquiring provider is integrated; `StubGateway` trusts the success flag
//! the client reports with the purchase request. A real provider slots in
//! behind the same trait, and the purchase flows stay unchanged because every
//! write happens only after `confirm` returns Ok.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::AppError;

/// A charge awaiting confirmation.
#[derive(Debug, Clone)]
pub struct Charge {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub description: String,
    /// Success flag reported by the client while no real provider exists.
    pub client_reported_success: bool,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Confirms the charge, `Err(AppError::PaymentFailed)` on decline. Callers
    /// must not write anything before this returns Ok.
    async fn confirm(&self, charge: &Charge) -> Result<(), AppError>;
}

/// Development gateway honoring the request's `payment_successful` flag.
pub struct StubGateway;

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn confirm(&self, charge: &Charge) -> Result<(), AppError> {
        if !charge.client_reported_success {
            return Err(AppError::PaymentFailed);
        }

        tracing::info!(
            user_id = %charge.user_id,
            amount = %charge.amount,
            description = %charge.description,
            "charge confirmed (stub)"
        );
        Ok(())
    }
}
