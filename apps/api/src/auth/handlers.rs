//! Axum route handlers for the `/api/auth` endpoint.
//!
//! One route pair serves every auth operation; the `action` query parameter
//! picks the operation, matching the mobile client's calling convention.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::codes;
use crate::errors::AppError;
use crate::routes::{parse_body, ActionQuery};
use crate::state::AppState;
use crate::store;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AuthGetQuery {
    #[serde(default)]
    pub action: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct SendCodeResponse {
    pub success: bool,
    pub message: &'static str,
    /// Only present when `EXPOSE_DEBUG_CODE` is set; never in production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifiedUserResponse {
    pub success: bool,
    pub user_id: Uuid,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub status: String,
    pub is_new_user: bool,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRegistrationRequest {
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CheckUserResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Dispatch
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/auth?action=…
pub async fn handle_get(
    State(state): State<AppState>,
    Query(query): Query<AuthGetQuery>,
) -> Result<Response, AppError> {
    match query.action.as_str() {
        "check-user" => Ok(check_user(&state, query.phone).await?.into_response()),
        _ => Err(AppError::InvalidRequest),
    }
}

/// POST /api/auth?action=…
///
/// The body is read raw and parsed per action, so an unknown action fails
/// before any field validation runs.
pub async fn handle_post(
    State(state): State<AppState>,
    Query(query): Query<ActionQuery>,
    body: String,
) -> Result<Response, AppError> {
    match query.action.as_str() {
        "send-code" => {
            let request = parse_body::<SendCodeRequest>(&body)?;
            Ok(send_code(&state, request).await?.into_response())
        }
        "verify-code" => {
            let request = parse_body::<VerifyCodeRequest>(&body)?;
            Ok(verify_code(&state, request).await?.into_response())
        }
        "complete-registration" => {
            let request = parse_body::<CompleteRegistrationRequest>(&body)?;
            Ok(complete_registration(&state, request).await?.into_response())
        }
        _ => Err(AppError::InvalidRequest),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/auth?action=send-code
///
/// Issues a fresh 4-digit code for the phone (replacing any pending one) and
/// hands it to the SMS sender. A failed send discards the stored code.
async fn send_code(
    state: &AppState,
    request: SendCodeRequest,
) -> Result<Json<SendCodeResponse>, AppError> {
    let phone = request.phone.trim();
    if phone.len() < 10 {
        return Err(AppError::Validation("Invalid phone number".to_string()));
    }

    let code = codes::generate_code();
    state.codes.set(phone, &code, codes::code_ttl()).await?;
    if let Err(err) = state.sms.send_code(phone, &code).await {
        state.codes.delete(phone).await?;
        return Err(err);
    }

    let debug_code = state.config.expose_debug_code.then_some(code);

    Ok(Json(SendCodeResponse {
        success: true,
        message: "SMS code sent",
        debug_code,
    }))
}

/// POST /api/auth?action=verify-code
///
/// Checks the pending code and signs the user in, creating the account (with
/// its zero-balance coins row) on first verification. A matching code is
/// consumed; a mismatched one stays usable until it expires.
async fn verify_code(
    state: &AppState,
    request: VerifyCodeRequest,
) -> Result<Json<VerifiedUserResponse>, AppError> {
    let phone = request.phone.trim();
    let code = request.code.trim();
    if phone.is_empty() || code.is_empty() {
        return Err(AppError::Validation("Phone and code required".to_string()));
    }

    let pending = state
        .codes
        .get(phone)
        .await?
        .ok_or(AppError::CodeNotFound)?;

    if pending.is_expired(Utc::now()) {
        state.codes.delete(phone).await?;
        return Err(AppError::CodeExpired);
    }

    if pending.code != code {
        return Err(AppError::CodeMismatch);
    }

    state.codes.delete(phone).await?;

    if let Some(user) = store::users::find_by_phone(&state.db, phone).await? {
        return Ok(Json(VerifiedUserResponse {
            success: true,
            user_id: user.id,
            phone: user.phone,
            full_name: user.full_name,
            email: user.email,
            status: user.status,
            is_new_user: false,
        }));
    }

    let user = store::users::create_with_coins(&state.db, phone).await?;

    Ok(Json(VerifiedUserResponse {
        success: true,
        user_id: user.id,
        phone: user.phone,
        full_name: None,
        email: None,
        status: user.status,
        is_new_user: true,
    }))
}

/// POST /api/auth?action=complete-registration
///
/// Records the profile fields collected after the first sign-in.
async fn complete_registration(
    state: &AppState,
    request: CompleteRegistrationRequest,
) -> Result<Json<MessageResponse>, AppError> {
    let full_name = request.full_name.trim();
    let user_id = match request.user_id {
        Some(id) if !full_name.is_empty() => id,
        _ => {
            return Err(AppError::Validation(
                "user_id and full_name required".to_string(),
            ))
        }
    };

    let email = request.email.trim();
    let email = (!email.is_empty()).then_some(email);

    store::users::complete_registration(&state.db, user_id, full_name, email).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Registration completed",
    }))
}

/// GET /api/auth?action=check-user
///
/// Tells the client whether a phone already belongs to an account.
async fn check_user(
    state: &AppState,
    phone: Option<String>,
) -> Result<Json<CheckUserResponse>, AppError> {
    let phone = phone.unwrap_or_default();
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(AppError::Validation("Phone required".to_string()));
    }

    let response = match store::users::find_by_phone(&state.db, phone).await? {
        Some(user) => CheckUserResponse {
            exists: true,
            user_id: Some(user.id),
            status: Some(user.status),
        },
        None => CheckUserResponse {
            exists: false,
            user_id: None,
            status: None,
        },
    };

    Ok(Json(response))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
