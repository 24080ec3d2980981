use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockroom_core::{DomainError, StoreError};
use stockroom_orders::OrderError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Reconciliation failures: stock/product problems are client errors with a
/// message identifying the offending product; store failures are 500s.
pub fn order_error_to_response(err: OrderError) -> axum::response::Response {
    match err {
        OrderError::ProductNotFound { .. } => {
            json_error(StatusCode::BAD_REQUEST, "product_not_found", err.to_string())
        }
        OrderError::InsufficientStock { .. } => {
            json_error(StatusCode::BAD_REQUEST, "insufficient_stock", err.to_string())
        }
        OrderError::Invalid(e) => domain_error_to_response(e),
        OrderError::Store(e) => store_error_to_response(e),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Duplicate(msg) => {
            json_error(StatusCode::BAD_REQUEST, "duplicate", format!("duplicate key: {msg}"))
        }
        StoreError::Backend(_) => {
            tracing::error!(error = %err, "store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal server error",
            )
        }
    }
}
