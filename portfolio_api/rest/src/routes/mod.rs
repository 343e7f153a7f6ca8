use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ApiError;

pub mod contact;
pub mod health;

pub fn internal_server_error(err: impl Into<anyhow::Error>, message: &'static str) -> Response {
    let err = err.into();
    tracing::error!("internal server error: {err:#}");
    error(StatusCode::INTERNAL_SERVER_ERROR, message)
}

pub fn error(code: StatusCode, message: &'static str) -> Response {
    (code, Json(ApiError::new(message))).into_response()
}

pub async fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "Route not found")
}
