//! HTTP client for the ServiceNow Table API.
//!
//! This module provides the `SnowClient` struct for making authenticated
//! requests to `/api/now/table/{table}`. It is the production
//! [`RecordSearch`] backend for application matching and also performs
//! identity lookups.
//!
//! Requests are issued once; transient failures surface to the caller.
//!
//! # Security
//!
//! The password is never logged. All error messages are sanitized before logging.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::config::Config;
use crate::error::PrismError;
use crate::matching::{escape_query_value, RecordSearch};
use crate::models::{
    CandidateRecord, GroupMembership, IdentityReport, NamedRecord, RoleAssignment,
    TableErrorResponse, TableResponse, User,
};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum rows returned by one application query variant.
const APPLICATION_QUERY_LIMIT: u32 = 50;

/// Columns requested for application records.
const APPLICATION_FIELDS: &str =
    "sys_id,name,short_description,operational_status,assigned_to,owned_by,category,subcategory";

/// Columns requested for users.
const USER_FIELDS: &str = "sys_id,user_name,first_name,last_name,email,active,locked_out,last_login_time,department,location";

/// Columns requested for roles and groups.
const NAMED_FIELDS: &str = "sys_id,name,description";

/// Maximum users an identity lookup will consider before declaring it ambiguous.
const USER_QUERY_LIMIT: u32 = 10;

/// Maximum role or group memberships read per user.
const MEMBERSHIP_QUERY_LIMIT: u32 = 100;

/// Maximum length for HTTP error response bodies included in errors.
const MAX_ERROR_BODY_LEN: usize = 500;

/// HTTP client for the ServiceNow Table API.
///
/// # Example
///
/// ```ignore
/// let config = Config::from_env()?;
/// let client = SnowClient::new(&config)?;
///
/// let apps: Vec<CandidateRecord> = client
///     .query_table("cmdb_ci_appl", "nameLIKEpay", "sys_id,name", 10)
///     .await?;
/// ```
#[derive(Clone)]
pub struct SnowClient {
    /// The underlying HTTP client (cloning is cheap).
    http: Client,

    /// Base URL for the REST API (e.g., `https://acme.service-now.com/api/now`).
    base_url: String,

    /// User for basic authentication.
    username: String,

    /// Password for basic authentication.
    /// SECURITY: Never log this value!
    password: String,

    /// Table searched by [`RecordSearch::search`].
    application_table: String,
}

impl SnowClient {
    /// Creates a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `PrismError::HttpClient` if the HTTP client fails to initialize.
    pub fn new(config: &Config) -> Result<Self, PrismError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(PrismError::HttpClient)?;

        Ok(Self {
            http,
            base_url: Self::normalize_base_url(&config.instance_url),
            username: config.username.clone(),
            password: config.password.clone(),
            application_table: config.application_table.clone(),
        })
    }

    /// Normalizes the instance URL to ensure it includes the API path.
    fn normalize_base_url(url: &str) -> String {
        let url = url.trim_end_matches('/');
        if url.ends_with("/api/now") {
            url.to_string()
        } else if url.ends_with("/api") {
            format!("{}/now", url)
        } else {
            format!("{}/api/now", url)
        }
    }

    /// Returns the password for sanitization purposes.
    ///
    /// This should ONLY be used for sanitizing error messages, never for logging.
    pub(crate) fn password_for_sanitization(&self) -> &str {
        &self.password
    }

    /// Returns the table application searches run against.
    pub fn application_table(&self) -> &str {
        &self.application_table
    }

    /// Tests connectivity to the instance.
    ///
    /// Reads a single row from the application table to verify the instance
    /// is reachable and the credentials are accepted.
    ///
    /// # Errors
    ///
    /// Returns `PrismError::ConnectionTest` with details about the failure.
    pub async fn test_connection(&self) -> Result<(), PrismError> {
        tracing::debug!("Testing connection to ServiceNow instance");

        let result = self
            .query_table::<serde_json::Value>(&self.application_table, "", "sys_id", 1)
            .await;

        match result {
            Ok(_) => {
                tracing::info!("Connection test successful");
                Ok(())
            }
            Err(PrismError::Authentication) => Err(PrismError::connection_test(
                "Authentication failed - verify SERVICENOW_USERNAME and SERVICENOW_PASSWORD",
            )),
            Err(PrismError::Timeout { duration, .. }) => Err(PrismError::connection_test(format!(
                "Connection timed out after {:?} - verify SERVICENOW_INSTANCE is correct and reachable",
                duration
            ))),
            Err(PrismError::Http(e)) => {
                let message = PrismError::sanitize_message(&e.to_string(), &self.password);
                Err(PrismError::connection_test(format!(
                    "HTTP error: {} - verify SERVICENOW_INSTANCE is correct",
                    message
                )))
            }
            Err(e) => Err(PrismError::connection_test(e.sanitized_display(&self.password))),
        }
    }

    /// Queries a table and returns its rows.
    ///
    /// # Arguments
    ///
    /// * `table` - Table name (e.g., `sys_user`)
    /// * `query` - Encoded query; empty for no filter
    /// * `fields` - Comma-separated columns to return
    /// * `limit` - Maximum rows to return
    ///
    /// # Type Parameters
    ///
    /// * `T` - The row type
    pub async fn query_table<T>(
        &self,
        table: &str,
        query: &str,
        fields: &str,
        limit: u32,
    ) -> Result<Vec<T>, PrismError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/table/{}", self.base_url, urlencoding::encode(table));
        let limit = limit.to_string();

        tracing::debug!(table = %table, query = %query, "Making Table API request");

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .query(&[
                ("sysparm_query", query),
                ("sysparm_fields", fields),
                ("sysparm_limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    return PrismError::timeout(
                        Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                        format!("GET {}", table),
                    );
                }
                PrismError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.handle_http_error(table, status, response).await);
        }

        let body = response.text().await.map_err(PrismError::Http)?;

        tracing::trace!(body = %body, "Table API response");

        let envelope: TableResponse<T> = serde_json::from_str(&body)?;
        Ok(envelope.into_rows())
    }

    /// Handles HTTP-level errors and converts to PrismError.
    async fn handle_http_error(
        &self,
        table: &str,
        status: StatusCode,
        response: reqwest::Response,
    ) -> PrismError {
        let body = response.text().await.unwrap_or_default();

        // Prefer the structured error message over the raw body
        let body = match serde_json::from_str::<TableErrorResponse>(&body) {
            Ok(parsed) => parsed.error.summary(),
            Err(_) => body,
        };
        let body = PrismError::sanitize_message(&body, &self.password);
        let body = if body.len() > MAX_ERROR_BODY_LEN {
            let mut end = MAX_ERROR_BODY_LEN;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...[truncated]", &body[..end])
        } else {
            body
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PrismError::Authentication,
            StatusCode::NOT_FOUND => PrismError::not_found("table", table),
            _ => {
                tracing::warn!(status = %status, table = %table, "Table API request failed");
                PrismError::HttpStatus { status, body }
            }
        }
    }

    /// Resolves a user and collects their roles and group memberships.
    ///
    /// `identifier` may be an email address, a user name or a sys_id.
    ///
    /// # Errors
    ///
    /// - `PrismError::Validation` if the identifier is empty
    /// - `PrismError::NotFound` if no user matches
    /// - `PrismError::Ambiguous` if more than one user matches
    pub async fn check_identity(&self, identifier: &str) -> Result<IdentityReport, PrismError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(PrismError::validation("user identifier is required"));
        }

        let value = escape_query_value(identifier);
        let query = format!("email={0}^ORuser_name={0}^ORsys_id={0}", value);
        let mut users: Vec<User> = self
            .query_table("sys_user", &query, USER_FIELDS, USER_QUERY_LIMIT)
            .await?;

        let user = match users.len() {
            0 => return Err(PrismError::not_found("user", identifier)),
            1 => users.remove(0),
            n => return Err(PrismError::ambiguous("user", identifier, n)),
        };

        tracing::debug!(user = %user.sys_id, "Resolved user, collecting roles and groups");

        let assignments: Vec<RoleAssignment> = self
            .query_table(
                "sys_user_has_role",
                &format!("user={}", user.sys_id),
                "role",
                MEMBERSHIP_QUERY_LIMIT,
            )
            .await?;
        let role_ids = unique_ids(assignments.iter().filter_map(|a| a.role.as_ref()?.sys_id()));
        let roles = self.lookup_named("sys_user_role", &role_ids).await?;

        let memberships: Vec<GroupMembership> = self
            .query_table(
                "sys_user_grmember",
                &format!("user={}", user.sys_id),
                "group",
                MEMBERSHIP_QUERY_LIMIT,
            )
            .await?;
        let group_ids = unique_ids(memberships.iter().filter_map(|m| m.group.as_ref()?.sys_id()));
        let groups = self.lookup_named("sys_user_group", &group_ids).await?;

        Ok(IdentityReport::new(identifier, user, roles, groups))
    }

    /// Fetches role or group details for a set of sys_ids in one query.
    async fn lookup_named(
        &self,
        table: &str,
        ids: &[String],
    ) -> Result<Vec<NamedRecord>, PrismError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("sys_idIN{}", ids.join(","));
        let limit = u32::try_from(ids.len()).unwrap_or(u32::MAX);
        self.query_table(table, &query, NAMED_FIELDS, limit).await
    }
}

impl RecordSearch for SnowClient {
    async fn search(&self, filter: &str) -> Result<Vec<CandidateRecord>, PrismError> {
        self.query_table(
            &self.application_table,
            filter,
            APPLICATION_FIELDS,
            APPLICATION_QUERY_LIMIT,
        )
        .await
    }
}

/// Collects ids in first-seen order without repeats.
fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for id in ids {
        if !out.iter().any(|seen| seen == id) {
            out.push(id.to_string());
        }
    }
    out
}
