//! Axum route handlers for the `/api/subscriptions` endpoint.
//!
//! One route pair serves every subscription and coin operation; the `action`
//! query parameter picks the operation, matching the mobile client's calling
//! convention.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commerce::catalog;
use crate::commerce::payments::Charge;
use crate::errors::AppError;
use crate::routes::{parse_body, ActionQuery};
use crate::state::AppState;
use crate::store;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommerceGetQuery {
    #[serde(default)]
    pub action: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActivateTrialRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseSubscriptionRequest {
    pub user_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub payment_successful: bool,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseCoinsRequest {
    pub user_id: Option<Uuid>,
    pub package: Option<String>,
    #[serde(default = "default_true")]
    pub payment_successful: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub user_status: String,
    pub has_subscription: bool,
    pub subscription_type: Option<String>,
    pub subscription_end: Option<DateTime<Utc>>,
    pub coins_balance: i64,
    pub needs_subscription: bool,
    pub needs_coins: bool,
    pub ready_for_payment: bool,
}

#[derive(Debug, Serialize)]
pub struct CoinsResponse {
    pub balance: i64,
    pub last_purchase_date: Option<DateTime<Utc>>,
    pub total_purchased: i64,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionGrantedResponse {
    pub success: bool,
    pub subscription_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CoinsPurchaseResponse {
    pub success: bool,
    pub coins_purchased: i64,
    pub price_paid: i64,
    pub new_balance: i64,
}

// ────────────────────────────────────────────────────────────────────────────
// Dispatch
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/subscriptions?action=…
pub async fn handle_get(
    State(state): State<AppState>,
    Query(query): Query<CommerceGetQuery>,
) -> Result<Response, AppError> {
    match query.action.as_str() {
        "status" => Ok(user_status(&state, query.user_id).await?.into_response()),
        "coins" => Ok(coins_balance(&state, query.user_id).await?.into_response()),
        _ => Err(AppError::InvalidRequest),
    }
}

/// POST /api/subscriptions?action=…
pub async fn handle_post(
    State(state): State<AppState>,
    Query(query): Query<ActionQuery>,
    body: String,
) -> Result<Response, AppError> {
    match query.action.as_str() {
        "activate-trial" => {
            let request = parse_body::<ActivateTrialRequest>(&body)?;
            Ok(activate_trial(&state, request).await?.into_response())
        }
        "purchase-subscription" => {
            let request = parse_body::<PurchaseSubscriptionRequest>(&body)?;
            Ok(purchase_subscription(&state, request).await?.into_response())
        }
        "purchase-coins" => {
            let request = parse_body::<PurchaseCoinsRequest>(&body)?;
            Ok(purchase_coins(&state, request).await?.into_response())
        }
        _ => Err(AppError::InvalidRequest),
    }
}

fn parse_user_id(raw: Option<String>) -> Result<Uuid, AppError> {
    let raw = raw.unwrap_or_default();
    if raw.is_empty() {
        return Err(AppError::Validation("user_id required".to_string()));
    }

    Uuid::parse_str(&raw).map_err(|_| AppError::Validation("Invalid user_id".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
struct StatusFlags {
    needs_subscription: bool,
    needs_coins: bool,
    ready_for_payment: bool,
}

/// What the client should prompt for next. A balance covers a payment once it
/// reaches the smallest coin pack.
fn derive_status_flags(has_subscription: bool, balance: i64) -> StatusFlags {
    StatusFlags {
        needs_subscription: !has_subscription,
        needs_coins: balance < catalog::MIN_PAYMENT_BALANCE,
        ready_for_payment: has_subscription && balance >= catalog::MIN_PAYMENT_BALANCE,
    }
}

/// GET /api/subscriptions?action=status
///
/// Aggregates everything the home screen needs: lifecycle status, the current
/// subscription, the coin balance and the derived next-step flags.
async fn user_status(
    state: &AppState,
    user_id: Option<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let user_id = parse_user_id(user_id)?;

    let user = store::users::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let subscription = store::subscriptions::current_for_user(&state.db, user_id).await?;
    let coins_balance = store::coins::balance_or_zero(&state.db, user_id).await?;

    let has_subscription = subscription.is_some();
    let flags = derive_status_flags(has_subscription, coins_balance);
    let (subscription_type, subscription_end) = match subscription {
        Some(sub) => (Some(sub.kind), Some(sub.end_date)),
        None => (None, None),
    };

    Ok(Json(StatusResponse {
        user_status: user.status,
        has_subscription,
        subscription_type,
        subscription_end,
        coins_balance,
        needs_subscription: flags.needs_subscription,
        needs_coins: flags.needs_coins,
        ready_for_payment: flags.ready_for_payment,
    }))
}

/// GET /api/subscriptions?action=coins
async fn coins_balance(
    state: &AppState,
    user_id: Option<String>,
) -> Result<Json<CoinsResponse>, AppError> {
    let user_id = parse_user_id(user_id)?;

    let coins = store::coins::find_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(CoinsResponse {
        balance: coins.balance,
        last_purchase_date: coins.last_purchase_date,
        total_purchased: coins.total_purchased,
    }))
}

/// POST /api/subscriptions?action=activate-trial
///
/// Grants the 14-day trial. Each user gets exactly one trial ever, so any
/// prior trial row, active or expired, blocks a second activation.
async fn activate_trial(
    state: &AppState,
    request: ActivateTrialRequest,
) -> Result<Json<SubscriptionGrantedResponse>, AppError> {
    let user_id = request
        .user_id
        .ok_or_else(|| AppError::Validation("user_id required".to_string()))?;

    if store::subscriptions::trial_exists(&state.db, user_id).await? {
        return Err(AppError::Conflict("Trial already used".to_string()));
    }

    let granted = store::subscriptions::start_trial(&state.db, user_id).await?;

    Ok(Json(SubscriptionGrantedResponse {
        success: true,
        subscription_id: granted.id,
        start_date: granted.start_date,
        end_date: granted.end_date,
    }))
}

/// POST /api/subscriptions?action=purchase-subscription
///
/// Charges the yearly plan and grants 365 days. Repeat purchases stack as
/// separate rows; the furthest end date is the one status reports.
async fn purchase_subscription(
    state: &AppState,
    request: PurchaseSubscriptionRequest,
) -> Result<Json<SubscriptionGrantedResponse>, AppError> {
    let user_id = request
        .user_id
        .ok_or_else(|| AppError::Validation("user_id required".to_string()))?;

    let charge = Charge {
        user_id,
        amount: catalog::yearly_price(),
        description: "Yearly subscription".to_string(),
        client_reported_success: request.payment_successful,
    };
    state.payments.confirm(&charge).await?;

    let granted =
        store::subscriptions::purchase_yearly(&state.db, user_id, catalog::yearly_price()).await?;

    Ok(Json(SubscriptionGrantedResponse {
        success: true,
        subscription_id: granted.id,
        start_date: granted.start_date,
        end_date: granted.end_date,
    }))
}

/// POST /api/subscriptions?action=purchase-coins
///
/// Charges a coin pack and credits the wallet. Package and payment are
/// checked before anything touches the database.
async fn purchase_coins(
    state: &AppState,
    request: PurchaseCoinsRequest,
) -> Result<Json<CoinsPurchaseResponse>, AppError> {
    let (user_id, package_id) = match (request.user_id, request.package.as_deref()) {
        (Some(id), Some(pkg)) if !pkg.is_empty() => (id, pkg),
        _ => {
            return Err(AppError::Validation(
                "user_id and package required".to_string(),
            ))
        }
    };

    let package = catalog::find_package(package_id)
        .ok_or_else(|| AppError::Validation("Invalid package".to_string()))?;

    let charge = Charge {
        user_id,
        amount: Decimal::from(package.price),
        description: format!("Purchase of {} coins", package.coins),
        client_reported_success: request.payment_successful,
    };
    state.payments.confirm(&charge).await?;

    let new_balance =
        store::coins::purchase(&state.db, user_id, package.coins, Decimal::from(package.price))
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(CoinsPurchaseResponse {
        success: true,
        coins_purchased: package.coins,
        price_paid: package.price,
        new_balance,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
