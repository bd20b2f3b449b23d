//! Authentication endpoints: login, logout, me, request-reset, reset

use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::Identity;

use super::ApiResult;
use crate::api::extract::ApiJson;
use crate::email::reset_email;
use crate::state::AppState;
use crate::util::{
    generate_reset_token, hash_password, hash_token, verify_dummy_password, verify_password,
};

const MIN_PASSWORD_LEN: usize = 8;
const RESET_TOKEN_TTL_MINUTES: i64 = 30;
const RESET_ACK: &str = "If the email exists, a reset link has been sent";

/// POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Email and password required"));
    }

    let Some(user) = state.users.find_by_email(email).await? else {
        verify_dummy_password(&req.password);
        tracing::info!(email = %email, "Login failed");
        return Err(AppError::invalid_credentials());
    };

    if !verify_password(&req.password, &user.password_hash) {
        tracing::info!(user_id = user.id, "Login failed");
        return Err(AppError::invalid_credentials());
    }

    let identity = user.identity();
    let token = state.sessions.issue(&identity).map_err(|e| {
        tracing::error!("Session token creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    tracing::info!(user_id = identity.id, role = %identity.role, "Login succeeded");

    let cookie = state.cookies.session_cookie(token);
    Ok((AppendHeaders([(SET_COOKIE, cookie.to_string())]), Json(identity)))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = state.cookies.removal_cookie();
    (
        AppendHeaders([(SET_COOKIE, cookie.to_string())]),
        ApiResponse::message("Logged out"),
    )
}

/// GET /api/auth/me
pub async fn me(Extension(identity): Extension<Identity>) -> ApiResult<Identity> {
    Ok(Json(identity))
}

#[derive(Deserialize)]
pub struct RequestResetRequest {
    #[serde(default)]
    pub email: String,
}

/// POST /api/auth/request-reset
///
/// Same acknowledgement whether or not the account exists.
pub async fn request_reset(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RequestResetRequest>,
) -> Result<ApiResponse, AppError> {
    let email = req.email.trim();
    if email.is_empty() {
        return Err(AppError::validation("Email required"));
    }

    let token = generate_reset_token();
    let expires_at = chrono::Utc::now() + chrono::Duration::minutes(RESET_TOKEN_TTL_MINUTES);
    let stored = state
        .users
        .set_reset_token(email, &hash_token(&token), expires_at)
        .await?;

    if !stored {
        tracing::info!(email = %email, "Reset requested for unknown email");
        return Ok(ApiResponse::message(RESET_ACK));
    }

    match state.reset_url_base.as_deref() {
        Some(base) => {
            let mail = reset_email(email, &token, base);
            if let Err(e) = state.mailer.send(mail).await {
                tracing::error!(email = %email, error = %e, "Failed to send reset email");
            }
        }
        None if state.is_development => {
            tracing::info!(email = %email, token = %token, "Password reset token generated");
        }
        None => {
            tracing::warn!(email = %email, "Reset token stored but RESET_URL_BASE is not configured");
        }
    }

    Ok(ApiResponse::message(RESET_ACK))
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/reset
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<ApiResponse, AppError> {
    let token = req.token.trim();
    if token.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Token and password required"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort));
    }

    let hashed =
        hash_password(&req.password).map_err(|_| AppError::new(ErrorCode::InternalError))?;
    let updated = state
        .users
        .consume_reset_token(&hash_token(token), &hashed, chrono::Utc::now())
        .await?;
    if !updated {
        return Err(AppError::new(ErrorCode::ResetTokenInvalid));
    }

    tracing::info!("Password reset completed");
    Ok(ApiResponse::message("Password updated"))
}
