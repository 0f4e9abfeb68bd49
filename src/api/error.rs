//! HTTP error responses

use crate::{
    auth::models::AuthError,
    policy::AccessError,
    service::ServiceError,
    students::{models::FieldError, store::StoreError},
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    /// Request could not be parsed (malformed JSON, bad path parameter)
    BadRequest(String),
    Internal(anyhow::Error),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Service(err.into())
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        ApiError::Service(err.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Service(err.into())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<&[FieldError]>) {
        match self {
            ApiError::Service(ServiceError::Store(err)) => match err {
                StoreError::Validation(v) => (
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    "Invalid student data".to_string(),
                    Some(v.fields.as_slice()),
                ),
                StoreError::Conflict(kind) => (
                    StatusCode::CONFLICT,
                    "duplicate_roll_number",
                    kind.to_string(),
                    None,
                ),
                StoreError::NotFound => (
                    StatusCode::NOT_FOUND,
                    "not_found",
                    err.to_string(),
                    None,
                ),
                StoreError::Storage(_) => internal(),
            },
            ApiError::Service(ServiceError::Auth(err)) => match err {
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "invalid_credentials",
                    err.to_string(),
                    None,
                ),
                AuthError::InvalidOrExpiredToken => (
                    StatusCode::UNAUTHORIZED,
                    "invalid_or_expired_token",
                    err.to_string(),
                    None,
                ),
                AuthError::Internal(_) => internal(),
            },
            ApiError::Service(ServiceError::Access(err)) => match err {
                AccessError::Unauthenticated => (
                    StatusCode::UNAUTHORIZED,
                    "unauthenticated",
                    err.to_string(),
                    None,
                ),
                AccessError::Forbidden => (
                    StatusCode::FORBIDDEN,
                    "forbidden",
                    err.to_string(),
                    None,
                ),
            },
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            ApiError::Internal(_) => internal(),
        }
    }
}

fn internal() -> (StatusCode, &'static str, String, Option<&'static [FieldError]>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "Internal server error".to_string(),
        None,
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        } else if status == StatusCode::FORBIDDEN {
            warn!("Request forbidden");
        }

        let body = match details {
            Some(fields) => json!({ "error": code, "message": message, "details": fields }),
            None => json!({ "error": code, "message": message }),
        };

        (status, Json(body)).into_response()
    }
}
