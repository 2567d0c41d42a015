//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{AccessDenied, DomainError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// The caller did not identify itself.
    Unauthorized(String),
    /// The caller's role may not perform the operation.
    Forbidden(AccessDenied),
    /// The target of a conditional operation does not exist.
    PreconditionFailed(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(denied) => (StatusCode::FORBIDDEN, denied.to_string()),
            ApiError::PreconditionFailed(msg) => (StatusCode::PRECONDITION_FAILED, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::Validation(_) | DomainError::OutOfStock { .. } => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::DuplicateName(_) | DomainError::FoodInUse { .. } => StatusCode::CONFLICT,
        DomainError::AlreadyFulfilled(_) => StatusCode::GONE,
        DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
        DomainError::Store(store_err) => {
            tracing::error!(error = %store_err, "store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<AccessDenied> for ApiError {
    fn from(denied: AccessDenied) -> Self {
        ApiError::Forbidden(denied)
    }
}
