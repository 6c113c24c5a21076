// Handlers module - Centralizes all request handlers
pub mod providers;
pub mod provision;
pub mod system;
pub mod vms;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::service::ServiceError;

/// `{"detail": ...}` body with the given status.
pub fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

pub fn service_error_response(err: ServiceError) -> Response {
    match err {
        ServiceError::NotFound(_) => detail(StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::Storage(e) => {
            tracing::error!("Inventory storage failure: {}", e);
            detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
