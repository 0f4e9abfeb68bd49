//! Authentication Middleware
//! Mission: Protect record endpoints with bearer token validation

use crate::{api::error::ApiError, auth::models::Identity, service::ResultService};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

/// Resolve the bearer token into an [`Identity`] or stop the request here
pub async fn auth_middleware(
    State(service): State<ResultService>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req);

    let identity = service.authenticate(token.as_deref())?;

    // Add identity to request extensions so handlers can access it
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Identity placed by [`auth_middleware`]
pub fn extract_identity(req: &Request) -> Option<&Identity> {
    req.extensions().get::<Identity>()
}
