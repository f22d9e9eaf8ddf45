//! Database library providing the MongoDB connector and shared connection utilities
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB support
//! - `config` - Configuration support with `core_config::FromEnv`
//! - `all` - All database features
//!
//! # Examples
//!
//! ## Connecting in the background
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, MongoHandle, ping};
//!
//! let handle = MongoHandle::new(&MongoConfig::from_env()?).await?;
//! let readiness = handle.readiness();
//! tokio::spawn(handle.clone().establish(None, |db| async move {
//!     // create indexes; may run again after a failed attempt
//!     ping(&db).await
//! }));
//! assert!(!readiness.is_ready());
//! ```

// Always available modules
pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

// Re-exports for convenience
pub use common::{ConnectionState, DatabaseError, DatabaseResult, Readiness};
