use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rf_core::error::StoreError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub data: ErrorData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorData {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

pub fn map_error(err: &StoreError, correlation_id: Option<String>) -> Response {
    let (status, code) = match err {
        StoreError::Query(_) | StoreError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "rest_invalid_param")
        }
        StoreError::ReviewNotFound => (StatusCode::NOT_FOUND, "rest_not_found"),
        StoreError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "rest_internal_error"),
    };
    if status.is_server_error() {
        tracing::error!(error = %err, ?correlation_id, "review request failed");
    }

    let body = ErrorEnvelope {
        code: code.to_string(),
        message: err.to_string(),
        data: ErrorData {
            status: status.as_u16(),
            correlation_id,
        },
    };
    (status, Json(body)).into_response()
}
