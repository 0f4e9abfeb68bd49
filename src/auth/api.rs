//! Authentication API Endpoints
//! Mission: Provide login and current-identity endpoints

use crate::{
    api::error::ApiError,
    auth::{
        middleware::extract_identity,
        models::{Identity, LoginRequest, LoginResponse},
    },
    policy::AccessError,
    service::ResultService,
};
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    Json,
};
use tokio::task::spawn_blocking;
use tracing::info;

/// Login endpoint - POST /auth/login
pub async fn login(
    State(service): State<ResultService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    info!("🔐 Login attempt: {}", payload.email);

    // bcrypt verification is CPU-bound, keep it off the async workers
    let response = spawn_blocking(move || service.login(&payload.email, &payload.password))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("login task failed: {}", e)))??;

    Ok(Json(response))
}

/// Get current identity - GET /auth/me
/// Answers straight from the validated token, no database lookup needed
pub async fn get_current_user(req: Request) -> Result<Json<Identity>, ApiError> {
    let identity = extract_identity(&req)
        .cloned()
        .ok_or(AccessError::Unauthenticated)?;

    Ok(Json(identity))
}
