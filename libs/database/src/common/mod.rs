//! Common utilities shared across all database implementations

pub mod error;
pub mod readiness;
pub mod retry;

pub use error::{DatabaseError, DatabaseResult};
pub use readiness::{ConnectionState, Readiness};
pub use retry::{RetryConfig, retry_with_backoff};
