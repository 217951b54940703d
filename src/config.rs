//! Configuration management for the Prism MCP server.
//!
//! This module handles loading configuration from environment variables,
//! with validation to ensure all required values are present.

use crate::error::PrismError;
use crate::matching::ScorePolicy;
use std::env;
use url::Url;

/// Table searched for applications when `SERVICENOW_APP_TABLE` is unset.
pub const DEFAULT_APPLICATION_TABLE: &str = "cmdb_ci_appl";

/// Configuration for connecting to a ServiceNow instance.
///
/// Credentials are stored but never logged or exposed in error messages.
#[derive(Clone)]
pub struct Config {
    /// Base URL for the instance (e.g., `https://acme.service-now.com`).
    pub instance_url: String,

    /// User name for basic authentication.
    pub username: String,

    /// Password for basic authentication.
    /// This value must never be logged or included in error messages.
    pub password: String,

    /// Table queried by the application search.
    pub application_table: String,

    /// How repeated hits on the same record are scored.
    pub score_policy: ScorePolicy,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `SERVICENOW_INSTANCE`: Instance name (`acme`) or full URL
    /// - `SERVICENOW_USERNAME`: User for basic authentication
    /// - `SERVICENOW_PASSWORD`: Password for basic authentication
    ///
    /// # Optional Environment Variables
    ///
    /// - `SERVICENOW_APP_TABLE`: Application table (default `cmdb_ci_appl`)
    /// - `PRISM_SCORE_POLICY`: `max` (default) or `first-seen`
    ///
    /// # Errors
    ///
    /// Returns `PrismError::Config` if any required variable is missing
    /// or if values fail validation.
    pub fn from_env() -> Result<Self, PrismError> {
        let instance = Self::get_required_env("SERVICENOW_INSTANCE")?;
        let username = Self::get_required_env("SERVICENOW_USERNAME")?;
        let password = Self::get_required_env("SERVICENOW_PASSWORD")?;

        let instance_url = Self::resolve_instance_url(&instance)?;
        Self::validate_password(&password)?;

        let application_table = match Self::get_optional_env("SERVICENOW_APP_TABLE") {
            Some(table) => Self::validate_table_name(table)?,
            None => DEFAULT_APPLICATION_TABLE.to_string(),
        };

        let score_policy = match Self::get_optional_env("PRISM_SCORE_POLICY") {
            Some(policy) => policy.parse()?,
            None => ScorePolicy::default(),
        };

        Ok(Config {
            instance_url,
            username: username.trim().to_string(),
            password,
            application_table,
            score_policy,
        })
    }

    /// Gets a required environment variable, returning an error if missing or empty.
    fn get_required_env(name: &str) -> Result<String, PrismError> {
        env::var(name)
            .map_err(|_| PrismError::missing_env(name))
            .and_then(|value| {
                if value.trim().is_empty() {
                    Err(PrismError::missing_env(name))
                } else {
                    Ok(value)
                }
            })
    }

    fn get_optional_env(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Turns an instance name or URL into a normalized base URL.
    ///
    /// A bare name such as `acme` expands to `https://acme.service-now.com`.
    /// Full URLs are parsed and kept without a trailing slash.
    fn resolve_instance_url(instance: &str) -> Result<String, PrismError> {
        let instance = instance.trim().trim_end_matches('/');

        if instance.starts_with("http://") || instance.starts_with("https://") {
            let parsed = Url::parse(instance).map_err(|_| {
                PrismError::invalid_config("SERVICENOW_INSTANCE is not a valid URL")
            })?;
            if parsed.host_str().is_none() {
                return Err(PrismError::invalid_config(
                    "SERVICENOW_INSTANCE URL must include a host",
                ));
            }
            return Ok(instance.to_string());
        }

        if instance
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            Ok(format!("https://{}.service-now.com", instance))
        } else {
            Err(PrismError::invalid_config(
                "SERVICENOW_INSTANCE must be an instance name or an http(s) URL",
            ))
        }
    }

    /// Validates the password is not a placeholder value.
    fn validate_password(password: &str) -> Result<(), PrismError> {
        let lower = password.to_lowercase();
        let placeholder_patterns = ["your_password", "placeholder", "changeme", "xxx"];

        for pattern in placeholder_patterns {
            if lower.contains(pattern) {
                return Err(PrismError::invalid_config(
                    "SERVICENOW_PASSWORD appears to be a placeholder value",
                ));
            }
        }

        Ok(())
    }

    /// Table names end up in the request path, so only identifier characters are allowed.
    fn validate_table_name(table: String) -> Result<String, PrismError> {
        if table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            Ok(table)
        } else {
            Err(PrismError::invalid_config(
                "SERVICENOW_APP_TABLE must contain only letters, digits and underscores",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: from_env() reads process-wide state; the helpers are tested directly.

    #[test]
    fn test_resolve_instance_name() {
        let url = Config::resolve_instance_url("acme").unwrap();
        assert_eq!(url, "https://acme.service-now.com");
    }

    #[test]
    fn test_resolve_instance_full_url_trims_slash() {
        let url = Config::resolve_instance_url("https://acme.service-now.com/").unwrap();
        assert_eq!(url, "https://acme.service-now.com");
    }

    #[test]
    fn test_resolve_instance_rejects_garbage() {
        assert!(Config::resolve_instance_url("acme.example/../x").is_err());
        assert!(Config::resolve_instance_url("https://").is_err());
    }

    #[test]
    fn test_validate_password_rejects_placeholder() {
        assert!(Config::validate_password("your_password_here").is_err());
    }

    #[test]
    fn test_validate_password_accepts_real_value() {
        assert!(Config::validate_password("Tr0ub4dor&3").is_ok());
    }

    #[test]
    fn test_validate_table_name() {
        assert!(Config::validate_table_name("apm_application".to_string()).is_ok());
        assert!(Config::validate_table_name("cmdb_ci_appl/../sys_user".to_string()).is_err());
    }
}
