//! MCP server implementation for Prism.
//!
//! This module defines the `PrismServer` struct that implements the MCP
//! `ServerHandler` trait, exposing ServiceNow lookups as tools.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use serde_json::json;

use crate::error::PrismError;
use crate::matching::{find_matches, MatchOutcome, MatchReport, ScorePolicy};
use crate::models::IdentityReport;
use crate::snow_client::SnowClient;
use crate::tools::{CheckIdentityInput, FindApplicationsInput};

/// The Prism MCP server.
///
/// This server exposes ServiceNow application search and identity checks
/// as MCP tools.
#[derive(Clone)]
pub struct PrismServer {
    /// ServiceNow client; also the record search backend for matching.
    client: SnowClient,
    /// How records found by several query variants are scored.
    score_policy: ScorePolicy,
    /// Tool router for MCP tool dispatch.
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PrismServer {
    /// Creates a new Prism server instance.
    ///
    /// # Arguments
    ///
    /// * `client` - The ServiceNow client for API operations
    /// * `score_policy` - Scoring policy for application matching
    pub fn new(client: SnowClient, score_policy: ScorePolicy) -> Self {
        Self {
            client,
            score_policy,
            tool_router: Self::tool_router(),
        }
    }

    /// A simple ping tool to verify the server is running.
    #[tool(description = "Test connectivity to the Prism MCP server. Returns 'pong' if the server is running correctly.")]
    fn ping(&self) -> String {
        tracing::debug!("ping tool called");
        "pong".to_string()
    }

    /// Fuzzy search for applications in the CMDB.
    ///
    /// Tolerates separator differences ("dev banking", "dev-banking",
    /// "devbanking") and ranks results by relevance.
    #[tool(description = "Search the ServiceNow CMDB application catalog by name, partial name, description, or sys_id. Tolerates separator differences (spaces, hyphens, underscores) and returns matches ranked by relevance as JSON.")]
    async fn find_applications(
        &self,
        Parameters(input): Parameters<FindApplicationsInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(
            search_term = %input.search_term,
            table = %self.client.application_table(),
            "find_applications tool called"
        );

        if input.search_term.is_empty() {
            return Err("search_term is required and cannot be empty.".to_string());
        }

        let outcome = find_matches(&input.search_term, &self.client, self.score_policy)
            .await
            .map_err(|e| {
                let sanitized = self.sanitize_error(&e);
                tracing::error!(error = %sanitized, "Failed to search applications");
                format!("Failed to search applications: {}", sanitized)
            })?;

        match outcome {
            MatchOutcome::Found(report) => {
                tracing::debug!(
                    search_term = %report.search_term,
                    count = report.count,
                    "Applications matched"
                );
                format_match_report(&report)
            }
            MatchOutcome::NotFound { search_term } => {
                tracing::debug!(search_term = %search_term, "No applications matched");
                to_pretty(&json!({
                    "error": "Application not found",
                    "searched": search_term,
                }))
            }
        }
    }

    /// Look up a user with their roles and group memberships.
    #[tool(description = "Check a user's identity in ServiceNow by email, user name, or sys_id. Returns the user's account status, roles, and group memberships as JSON.")]
    async fn check_identity(
        &self,
        Parameters(input): Parameters<CheckIdentityInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(user_identifier = %input.user_identifier, "check_identity tool called");

        if input.user_identifier.is_empty() {
            return Err("user_identifier is required and cannot be empty.".to_string());
        }

        match self.client.check_identity(&input.user_identifier).await {
            Ok(report) => format_identity_report(&report),
            Err(PrismError::NotFound { searched, .. }) => to_pretty(&json!({
                "error": "User not found",
                "searched": searched,
            })),
            Err(PrismError::Ambiguous { searched, count, .. }) => to_pretty(&json!({
                "error": "Multiple users found",
                "searched": searched,
                "count": count,
            })),
            Err(e) => {
                let sanitized = self.sanitize_error(&e);
                tracing::error!(error = %sanitized, "Failed to check identity");
                Err(format!(
                    "Failed to check identity of {}: {}",
                    input.user_identifier, sanitized
                ))
            }
        }
    }

    /// Sanitizes an error message to remove the password.
    fn sanitize_error(&self, error: &PrismError) -> String {
        error.sanitized_display(self.client.password_for_sanitization())
    }
}

#[tool_handler]
impl ServerHandler for PrismServer {
    /// Returns server information for the MCP initialize handshake.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Prism provides read access to a ServiceNow instance. \
                 Use find_applications to locate applications in the CMDB by a \
                 free-text name, and check_identity to see a user's roles and \
                 groups. Start with 'ping' to verify connectivity."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Response formatting helpers
// ============================================================================

fn to_pretty(value: &serde_json::Value) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Failed to format response: {}", e))
}

/// Formats ranked application matches as JSON.
fn format_match_report(report: &MatchReport) -> Result<String, String> {
    to_pretty(&json!({
        "search_term": report.search_term,
        "applications_found": report.count,
        "applications": report.records,
    }))
}

/// Formats an identity check as JSON, with a decoded account summary.
fn format_identity_report(report: &IdentityReport) -> Result<String, String> {
    let mut value =
        serde_json::to_value(report).map_err(|e| format!("Failed to format response: {}", e))?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "account".to_string(),
            json!({
                "display_name": report.user.display_name(),
                "active": report.user.is_active(),
                "locked_out": report.user.is_locked_out(),
            }),
        );
    }
    to_pretty(&value)
}
