//! Configuration for Inventory API

use core_config::{AppInfo, FromEnv, app_info, env_parse_or, server::ServerConfig};
use database::mongodb::MongoConfig;
use std::time::Duration;

pub use core_config::Environment;

/// Seconds allowed for cleanup after a shutdown signal when unset
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    pub shutdown_timeout: Duration,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mongodb = MongoConfig::from_env()?;
        let server = ServerConfig::from_env()?;
        let shutdown_secs = env_parse_or("SHUTDOWN_TIMEOUT_SECS", DEFAULT_SHUTDOWN_TIMEOUT_SECS)?;

        Ok(Self {
            app: app_info!(),
            mongodb,
            server,
            environment,
            shutdown_timeout: Duration::from_secs(shutdown_secs),
        })
    }
}
