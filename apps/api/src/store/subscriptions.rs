use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::commerce::{SubscriptionKind, SubscriptionRow, TransactionKind};
use crate::models::user::UserStatus;
use crate::store::{transactions, users};

pub const TRIAL_DAYS: i64 = 14;
pub const YEARLY_DAYS: i64 = 365;

/// Outcome of a subscription grant, echoed back to the client.
#[derive(Debug, Clone)]
pub struct GrantedSubscription {
    pub id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// The subscription that currently gates paid features: active, unexpired,
/// furthest end date wins.
pub async fn current_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<SubscriptionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionRow>(
        r#"
        SELECT * FROM subscriptions
        WHERE user_id = $1 AND is_active = TRUE AND end_date > now()
        ORDER BY end_date DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// True when the user has ever held a trial row, active or expired.
pub async fn trial_exists(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let id: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM subscriptions WHERE user_id = $1 AND type = $2 LIMIT 1",
    )
    .bind(user_id)
    .bind(SubscriptionKind::Trial.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(id.is_some())
}

/// Grants the 14-day trial and flips the user to TRIAL_ACTIVE in one
/// transaction. Callers rule out a prior trial via [`trial_exists`] first.
pub async fn start_trial(pool: &PgPool, user_id: Uuid) -> Result<GrantedSubscription, sqlx::Error> {
    let start_date = Utc::now();
    let end_date = start_date + Duration::days(TRIAL_DAYS);

    let mut tx = pool.begin().await?;

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO subscriptions (user_id, type, start_date, end_date, is_active)
        VALUES ($1, $2, $3, $4, TRUE)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(SubscriptionKind::Trial.as_str())
    .bind(start_date)
    .bind(end_date)
    .fetch_one(&mut *tx)
    .await?;

    users::set_status(&mut tx, user_id, UserStatus::TrialActive).await?;

    tx.commit().await?;

    Ok(GrantedSubscription {
        id,
        start_date,
        end_date,
    })
}

/// Grants a 365-day auto-renewing subscription, records the payment and flips
/// the user to SUBSCRIPTION_ACTIVE, all in one transaction. A user may hold
/// several yearly rows; the latest end date is the one that counts.
pub async fn purchase_yearly(
    pool: &PgPool,
    user_id: Uuid,
    price: Decimal,
) -> Result<GrantedSubscription, sqlx::Error> {
    let start_date = Utc::now();
    let end_date = start_date + Duration::days(YEARLY_DAYS);

    let mut tx = pool.begin().await?;

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO subscriptions (user_id, type, start_date, end_date, is_active, auto_renew)
        VALUES ($1, $2, $3, $4, TRUE, TRUE)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(SubscriptionKind::Yearly.as_str())
    .bind(start_date)
    .bind(end_date)
    .fetch_one(&mut *tx)
    .await?;

    transactions::record(
        &mut tx,
        user_id,
        TransactionKind::Subscription,
        price,
        "Yearly subscription",
    )
    .await?;

    users::set_status(&mut tx, user_id, UserStatus::SubscriptionActive).await?;

    tx.commit().await?;

    Ok(GrantedSubscription {
        id,
        start_date,
        end_date,
    })
}
