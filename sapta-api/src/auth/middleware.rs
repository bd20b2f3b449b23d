//! Session and role middleware
//!
//! `require_session` verifies the cookie and injects [`Identity`] into request
//! extensions; `require_admin` must run after it. Both reject before any store
//! is touched.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;
use shared::models::{ADMIN_ROLE, Identity};

use super::session::{require_role, session_token};
use crate::state::AppState;

pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(request.headers()).ok_or_else(AppError::not_authenticated)?;

    let identity = state.sessions.verify(&token).map_err(|e| {
        tracing::debug!("Session verification failed: {e}");
        AppError::not_authenticated()
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or_else(AppError::not_authenticated)?;

    if let Err(e) = require_role(identity, ADMIN_ROLE) {
        tracing::warn!(user_id = identity.id, role = %identity.role, "Admin role required");
        return Err(e);
    }
    Ok(next.run(request).await)
}
