//! Request logging middleware.
//!
//! One line per request with method, path, status and latency, tagged with
//! a request id that is echoed back in `x-request-id`.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Log the request once it has been answered.
///
/// 5xx responses log at WARN, everything else at INFO. Headers are never
/// logged, so bearer tokens stay out of the output.
pub async fn request_logging(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    // Skip logging for health checks to reduce noise
    if path == "/health" {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let request_id = Uuid::new_v4().simple().to_string();
    let client_ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());

    // Handler and store logs nest under this span
    let span = tracing::info_span!("request", id = %request_id);

    let start = Instant::now();
    let mut response = next.run(request).instrument(span).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    if status.is_server_error() {
        warn!(
            request_id = %request_id,
            %method,
            %path,
            status = status.as_u16(),
            latency_ms,
            %client_ip,
            "Request failed"
        );
    } else {
        info!(
            request_id = %request_id,
            %method,
            %path,
            status = status.as_u16(),
            latency_ms,
            %client_ip,
            "Request completed"
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
