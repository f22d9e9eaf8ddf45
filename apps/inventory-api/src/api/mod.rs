//! API routes module

pub mod health;
pub mod products;

use axum::{Json, Router, extract::State, routing::get};
use core_config::AppInfo;
use serde_json::{Value, json};

use crate::state::AppState;

/// Create all API routes (nested under `/api` by the server)
pub fn routes(state: &AppState) -> Router {
    Router::new().nest("/products", products::router(state))
}

/// Routes served outside `/api`: the banner and the readiness check
pub fn root_routes(state: &AppState) -> Router {
    Router::new()
        .route("/", get(banner).with_state(state.app))
        .merge(health::router(state.clone()))
}

async fn banner(State(app): State<AppInfo>) -> Json<Value> {
    Json(json!({
        "name": app.name,
        "version": app.version,
        "docs": "/swagger-ui",
    }))
}
