use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use chrono::{DateTime, Utc};
use portfolio_core_health_contracts::{HealthFeatureService, HealthStatus};
use serde::Serialize;

use crate::models::contact::serialize_timestamp;

pub fn router(service: Arc<impl HealthFeatureService>) -> Router<()> {
    Router::new()
        .route("/health", routing::get(health))
        .with_state(service)
}

#[derive(Serialize)]
struct HealthResponse {
    success: bool,
    message: &'static str,
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: DateTime<Utc>,
    database: bool,
}

async fn health(service: State<Arc<impl HealthFeatureService>>) -> Response {
    let HealthStatus {
        timestamp,
        database,
    } = service.get_status().await;

    Json(HealthResponse {
        success: true,
        message: "Server is running",
        timestamp,
        database,
    })
    .into_response()
}
