//! Shared response helpers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::repository::StoreError;

/// Map a store failure to its HTTP response.
pub fn store_error(err: StoreError) -> Response {
    let status = match err {
        StoreError::BadRequest(_) => StatusCode::BAD_REQUEST,
        StoreError::Unavailable(_) => {
            tracing::error!("{}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}
