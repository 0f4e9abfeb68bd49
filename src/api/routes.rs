use axum::{
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::{
    api::students,
    auth::{api as auth_api, auth_middleware},
    middleware::{rate_limit_middleware, request_logging, RateLimitLayer},
    service::ResultService,
};

/// Create the API router
pub fn create_router(service: ResultService, login_limiter: RateLimitLayer) -> Router {
    // Login is public but throttled per client address
    let auth_routes = Router::new()
        .route("/auth/login", post(auth_api::login))
        .route_layer(middleware::from_fn_with_state(
            login_limiter,
            rate_limit_middleware,
        ))
        .with_state(service.clone());

    // Everything below requires a valid bearer token
    let protected_routes = Router::new()
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route("/students/my-result", get(students::my_result))
        .route(
            "/students/:id",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        .route("/auth/me", get(auth_api::get_current_user))
        .route_layer(middleware::from_fn_with_state(
            service.clone(),
            auth_middleware,
        ))
        .with_state(service);

    let public_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(auth_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}
