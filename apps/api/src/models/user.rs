use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub phone: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle states persisted in `users.status`. Rows keep the raw string
/// (unknown values from older data pass through untouched); this enum exists
/// for the write paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    NewUser,
    OnboardingComplete,
    TrialActive,
    SubscriptionActive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::NewUser => "NEW_USER",
            UserStatus::OnboardingComplete => "ONBOARDING_COMPLETE",
            UserStatus::TrialActive => "TRIAL_ACTIVE",
            UserStatus::SubscriptionActive => "SUBSCRIPTION_ACTIVE",
        }
    }
}
