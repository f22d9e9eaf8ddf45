//! Application state management

use core_config::AppInfo;
use database::mongodb::MongoHandle;

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    pub app: AppInfo,
    pub mongo: MongoHandle,
}

impl AppState {
    pub fn new(app: AppInfo, mongo: MongoHandle) -> Self {
        Self { app, mongo }
    }
}
