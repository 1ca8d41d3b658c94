//! JSON error body shared by the campus services.
//!
//! Each service keeps its own error enum and renders it through
//! [`ErrorResponse`] so every failure has the same shape on the wire.

use serde::{Deserialize, Serialize};

/// Canonical reason phrase for the statuses the services emit.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        504 => "Gateway Timeout",
        _ => "Error",
    }
}

/// Unified API error body used by every service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Reason phrase for the HTTP status
    pub error: String,

    /// Human readable message
    pub message: String,

    /// HTTP status code
    pub status: u16,

    /// Error family, one of the [`error_types`] constants
    #[serde(rename = "type")]
    pub error_type: String,

    /// Stable machine readable code, one of the [`error_codes`] constants
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            correlation_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: String) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

pub mod error_codes {
    // Authentication
    pub const TOKEN_MISSING: &str = "TOKEN_MISSING";
    pub const TOKEN_INVALID: &str = "TOKEN_INVALID";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const MISSING_CREDENTIALS: &str = "MISSING_CREDENTIALS";

    // Authorization
    pub const ACCESS_DENIED: &str = "ACCESS_DENIED";
    pub const NOT_RESOURCE_OWNER: &str = "NOT_RESOURCE_OWNER";

    // Records
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const STUDENT_NOT_FOUND: &str = "STUDENT_NOT_FOUND";
    pub const PROFESSOR_NOT_FOUND: &str = "PROFESSOR_NOT_FOUND";
    pub const DUPLICATE_RECORD: &str = "DUPLICATE_RECORD";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";

    // System
    pub const KEY_SET_UNAVAILABLE: &str = "KEY_SET_UNAVAILABLE";
    pub const UPSTREAM_FAILED: &str = "UPSTREAM_FAILED";
    pub const UPSTREAM_TIMEOUT: &str = "UPSTREAM_TIMEOUT";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
    pub const RATE_LIMIT_ERROR: &str = "RATE_LIMIT_EXCEEDED";
}

pub mod error_types {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const AUTHENTICATION_ERROR: &str = "authentication_error";
    pub const AUTHORIZATION_ERROR: &str = "authorization_error";
    pub const NOT_FOUND_ERROR: &str = "not_found_error";
    pub const CONFLICT_ERROR: &str = "conflict_error";
    pub const RATE_LIMIT_ERROR: &str = "rate_limit_error";
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const SERVER_ERROR: &str = "server_error";
}
