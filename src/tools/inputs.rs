//! Tool input parameter structs for MCP tools.
//!
//! This module defines the input types for each MCP tool, with
//! JSON Schema derivation for MCP tool discovery.
//!
//! # Input Sanitization
//!
//! All input structs implement `sanitize()` which trims whitespace
//! from string fields. This should be called before processing input.

use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;

/// Input parameters for the find_applications tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FindApplicationsInput {
    /// Application name, fragment of a name, or sys_id to search for
    /// (e.g., "dev banking", "payments-api").
    pub search_term: String,
}

impl FindApplicationsInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            search_term: self.search_term.trim().to_string(),
        }
    }
}

/// Input parameters for the check_identity tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CheckIdentityInput {
    /// Email address, user name, or sys_id of the user to check.
    pub user_identifier: String,
}

impl CheckIdentityInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            user_identifier: self.user_identifier.trim().to_string(),
        }
    }
}
