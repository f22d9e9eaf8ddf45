//! Type-safe error codes for API responses.
//!
//! Each code carries a string identifier for clients (e.g. `"VALIDATION_ERROR"`),
//! an integer for logs and dashboards (e.g. `1001`) and a default message.
//!
//! # Example
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::ValidationError;
//! assert_eq!(code.as_str(), "VALIDATION_ERROR");
//! assert_eq!(code.code(), 1001);
//! assert_eq!(code.default_message(), "Request validation failed");
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error codes shared by every service response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    /// Request validation failed
    ValidationError,

    /// Invalid UUID format in a path parameter
    InvalidUuid,

    /// Request body is not valid JSON or does not match the expected shape
    InvalidJson,

    /// Query string could not be decoded into the expected parameters
    InvalidQuery,

    /// Requested resource was not found
    NotFound,

    /// Request was malformed in a way not covered by a more specific code
    BadRequest,

    /// HTTP method is not supported by the route
    MethodNotAllowed,

    // Store errors (2000-2999)
    /// The store rejected or failed an operation
    DatabaseError,

    /// The store connection has not been established
    DatabaseNotReady,
}

impl ErrorCode {
    /// Identifier sent to clients in the `error` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidUuid => "INVALID_UUID",
            Self::InvalidJson => "INVALID_JSON",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::NotFound => "NOT_FOUND",
            Self::BadRequest => "BAD_REQUEST",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::DatabaseNotReady => "DATABASE_NOT_READY",
        }
    }

    /// Integer code used in logs and the `code` field.
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidUuid => 1002,
            Self::InvalidJson => 1003,
            Self::InvalidQuery => 1005,
            Self::NotFound => 1004,
            Self::BadRequest => 1006,
            Self::MethodNotAllowed => 1007,
            Self::DatabaseError => 2001,
            Self::DatabaseNotReady => 2002,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidUuid => "Invalid UUID format",
            Self::InvalidJson => "Invalid JSON format",
            Self::InvalidQuery => "Invalid query parameters",
            Self::NotFound => "Resource not found",
            Self::BadRequest => "Bad request",
            Self::MethodNotAllowed => "The HTTP method is not allowed for this resource",
            Self::DatabaseError => "Database error occurred",
            Self::DatabaseNotReady => "Database is not ready",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_string_representation() {
        assert_eq!(ErrorCode::ValidationError.as_str(), "VALIDATION_ERROR");
        assert_eq!(ErrorCode::NotFound.as_str(), "NOT_FOUND");
        assert_eq!(ErrorCode::DatabaseNotReady.as_str(), "DATABASE_NOT_READY");
    }

    #[test]
    fn test_error_code_integer_codes() {
        assert_eq!(ErrorCode::ValidationError.code(), 1001);
        assert_eq!(ErrorCode::InvalidQuery.code(), 1005);
        assert_eq!(ErrorCode::DatabaseError.code(), 2001);
    }

    #[test]
    fn test_database_error_message_is_generic() {
        assert_eq!(
            ErrorCode::DatabaseError.default_message(),
            "Database error occurred"
        );
    }

    #[test]
    fn test_error_code_serialization_matches_as_str() {
        for code in [
            ErrorCode::InvalidJson,
            ErrorCode::MethodNotAllowed,
            ErrorCode::DatabaseNotReady,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_error_code_deserialization() {
        let code: ErrorCode = serde_json::from_str("\"BAD_REQUEST\"").unwrap();
        assert_eq!(code, ErrorCode::BadRequest);
    }
}
