//! Middleware for observability and request throttling.
//!
//! This module provides:
//! - Request logging with latency tracking
//! - Rate limiting per IP address

pub mod logging;
pub mod rate_limit;

pub use logging::{request_logging, REQUEST_ID_HEADER};
pub use rate_limit::{rate_limit_middleware, RateLimitConfig, RateLimitLayer};
