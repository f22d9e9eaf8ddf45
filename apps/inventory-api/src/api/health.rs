//! Readiness check

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::{HealthCheckFuture, ReadinessReport, run_health_checks};
use database::mongodb::ping;
use serde_json::json;

use crate::state::AppState;

/// `GET /ready`: 503 until the store connects, then a live ping
async fn ready(State(state): State<AppState>) -> ReadinessReport {
    let readiness = state.mongo.readiness();
    if !readiness.is_ready() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not ready",
                "database": readiness.state().as_str(),
            })),
        );
    }

    let db = state.mongo.database().clone();
    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        "database",
        Box::pin(async move { ping(&db).await.map_err(|e| e.to_string()) }),
    )];
    run_health_checks(checks).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .with_state(state)
}
