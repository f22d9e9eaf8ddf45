//! MongoDB connector and utilities
//!
//! Provides lazy connection handles, background connection establishment
//! and a ping check.

mod config;
mod connector;

pub use config::{DEFAULT_DATABASE, MongoConfig};
pub use connector::{MongoHandle, ping};

// Re-export MongoDB types for convenience
pub use mongodb::{Client, Collection, Database};
