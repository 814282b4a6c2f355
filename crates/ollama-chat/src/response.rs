//! Structured failure responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::api::FailureReply;

pub fn failure(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(FailureReply::new(error))).into_response()
}

pub fn bad_request(error: impl Into<String>) -> Response {
    failure(StatusCode::BAD_REQUEST, error)
}

pub fn internal_error(error: impl Into<String>) -> Response {
    failure(StatusCode::INTERNAL_SERVER_ERROR, error)
}

pub fn service_unavailable(error: impl Into<String>) -> Response {
    failure(StatusCode::SERVICE_UNAVAILABLE, error)
}
