//! Inventory API - REST server for product inventory on MongoDB

use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::mongodb::MongoHandle;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to MongoDB at {}", config.mongodb.redacted_url());

    // The client is lazy; connectivity and indexes are handled in the background
    let mongo = MongoHandle::new(&config.mongodb).await?;
    let state = AppState::new(config.app, mongo.clone());

    tokio::spawn(mongo.clone().establish(None, api::products::init_indexes));

    let api_routes = api::routes(&state);
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes, &config.server).await?;
    let app = router
        .merge(health_router(config.app))
        .merge(api::root_routes(&state));

    info!(
        "Starting {} v{} on port {}",
        config.app.name, config.app.version, config.server.port
    );

    let client = mongo.client().clone();
    create_production_app(app, &config.server, config.shutdown_timeout, async move {
        info!("Shutting down: closing MongoDB connections");
        client.shutdown().await;
        info!("MongoDB connection closed");
    })
    .await?;

    info!("Inventory API shutdown complete");
    Ok(())
}
