//! Error types for the Prism MCP server.
//!
//! This module defines `PrismError`, the unified error type used throughout
//! the application for consistent error handling and propagation.
//!
//! # Security
//!
//! All error messages are sanitized to ensure the ServiceNow password is never
//! leaked in logs or tool responses. Use `sanitize_message()` when constructing
//! error messages from external sources.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for all Prism operations.
///
/// Each variant provides specific context about the failure, enabling
/// meaningful error messages without leaking credentials.
#[derive(Error, Debug)]
pub enum PrismError {
    /// Configuration error - missing or invalid environment variables.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// HTTP response returned a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: reqwest::StatusCode,
        /// The response body, potentially containing error details.
        body: String,
    },

    /// Request timed out.
    #[error("request timed out after {duration:?} - the instance may be slow or unreachable")]
    Timeout {
        /// How long we waited before timing out.
        duration: Duration,
        /// The operation that timed out.
        operation: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A lookup matched nothing.
    #[error("{entity} not found: {searched}")]
    NotFound {
        /// Kind of record that was looked up (e.g. "user").
        entity: String,
        /// The identifier that was searched for.
        searched: String,
    },

    /// A lookup that must resolve to one record matched several.
    #[error("multiple {entity} records found for {searched} ({count} matches)")]
    Ambiguous {
        /// Kind of record that was looked up.
        entity: String,
        /// The identifier that was searched for.
        searched: String,
        /// How many records matched.
        count: usize,
    },

    /// Authentication failed - likely bad credentials or missing ACLs.
    #[error("authentication failed - check SERVICENOW_USERNAME and SERVICENOW_PASSWORD")]
    Authentication,

    /// Input validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Connection test failed.
    #[error("connection test failed: {message}")]
    ConnectionTest {
        /// Details about why the connection test failed.
        message: String,
    },
}

impl PrismError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        PrismError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        PrismError::Config(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        PrismError::Validation(message.into())
    }

    /// Creates a not found error for the given entity kind.
    pub fn not_found(entity: impl Into<String>, searched: impl Into<String>) -> Self {
        PrismError::NotFound {
            entity: entity.into(),
            searched: searched.into(),
        }
    }

    /// Creates an ambiguous-match error.
    pub fn ambiguous(entity: impl Into<String>, searched: impl Into<String>, count: usize) -> Self {
        PrismError::Ambiguous {
            entity: entity.into(),
            searched: searched.into(),
            count,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration, operation: impl Into<String>) -> Self {
        PrismError::Timeout {
            duration,
            operation: operation.into(),
        }
    }

    /// Creates a connection test error.
    pub fn connection_test(message: impl Into<String>) -> Self {
        PrismError::ConnectionTest {
            message: message.into(),
        }
    }

    /// Sanitizes an error message to remove any occurrence of the password.
    ///
    /// Passwords must never appear in logs, error messages, or responses
    /// to users.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to sanitize
    /// * `secret` - The secret to strip from the message
    ///
    /// # Returns
    ///
    /// The message with any occurrence of the secret replaced with `[REDACTED]`
    #[must_use]
    pub fn sanitize_message(message: &str, secret: &str) -> String {
        if secret.is_empty() {
            return message.to_string();
        }
        message.replace(secret, "[REDACTED]")
    }

    /// Creates a sanitized version of this error's display message.
    #[must_use]
    pub fn sanitized_display(&self, secret: &str) -> String {
        Self::sanitize_message(&self.to_string(), secret)
    }
}
