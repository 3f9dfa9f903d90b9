//! One-time verification codes keyed by phone number.
//!
//! The store is a trait so handlers never touch a concrete map: `AppState`
//! carries an `Arc<dyn CodeStore>`, and the in-process `InMemoryCodeStore` is
//! the single-instance/test implementation. A shared cache (Redis or similar)
//! can back the same trait for multi-instance deployments without touching the
//! verification flow.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tokio::sync::RwLock;

use crate::errors::AppError;

/// Codes live for five minutes from issuance; a re-issue restarts the clock.
pub const CODE_TTL_MINUTES: i64 = 5;

pub fn code_ttl() -> Duration {
    Duration::minutes(CODE_TTL_MINUTES)
}

/// Generates the 4-digit numeric code sent over SMS (1000–9999, uniform).
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}

/// A code waiting to be verified. One entry per phone; the latest issuance
/// overwrites any earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Ephemeral phone → pending-code mapping.
///
/// `get` returns expired entries unchanged: the verification flow needs to
/// distinguish "expired" from "never issued / already consumed", so expiry
/// classification belongs to the caller, not the store.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Stores a code for the phone, replacing any prior entry.
    async fn set(&self, phone: &str, code: &str, ttl: Duration) -> Result<(), AppError>;

    /// Returns the pending entry for the phone, if any.
    async fn get(&self, phone: &str) -> Result<Option<PendingCode>, AppError>;

    /// Removes the entry for the phone. Removing an absent entry is a no-op.
    async fn delete(&self, phone: &str) -> Result<(), AppError>;
}

/// Process-local implementation backed by a `RwLock`-guarded map. Entries do
/// not survive a restart; codes are short-lived and re-issuable, so that is an
/// accepted trade for single-instance use.
#[derive(Default)]
pub struct InMemoryCodeStore {
    entries: RwLock<HashMap<String, PendingCode>>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn set(&self, phone: &str, code: &str, ttl: Duration) -> Result<(), AppError> {
        let entry = PendingCode {
            code: code.to_string(),
            expires_at: Utc::now() + ttl,
        };
        self.entries.write().await.insert(phone.to_string(), entry);
        Ok(())
    }

    async fn get(&self, phone: &str) -> Result<Option<PendingCode>, AppError> {
        Ok(self.entries.read().await.get(phone).cloned())
    }

    async fn delete(&self, phone: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(phone);
        Ok(())
    }
}
