//! Response envelope formatting

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::models::ApiResponse;

/// 200 response wrapping `data` in the success envelope
pub fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Error envelope with the given status
pub fn error(status: StatusCode, error_type: &str, message: &str) -> Response {
    (status, Json(ApiResponse::<()>::error(error_type, message))).into_response()
}
