//! # Prism
//!
//! Prism is an MCP (Model Context Protocol) server for ServiceNow.
//!
//! It exposes read-only ServiceNow lookups as MCP tools so that automation
//! agents can resolve loosely named applications and check user identities.
//!
//! ## Features
//!
//! - **Fuzzy application search**: one free-text term is expanded into many
//!   encoded queries (separator variants, word fan-out), the hits are merged
//!   by `sys_id` and ranked by relevance
//! - **Identity checks**: resolve a user by email, user name or sys_id and
//!   list their roles and groups
//! - **Security**: the password is never logged or exposed in error messages
//!
//! ## Architecture
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`error`] - Error types with credential sanitization
//! - [`matching`] - Query expansion, relevance scoring and result aggregation
//! - [`snow_client`] - HTTP client for the ServiceNow Table API
//! - [`server`] - MCP server implementation with tool routing
//! - [`models`] - Table API records and response envelopes
//! - [`tools`] - Tool input parameter structs
//!
//! ## Configuration
//!
//! Required:
//!
//! - `SERVICENOW_INSTANCE`: Instance name (`acme`) or full URL
//! - `SERVICENOW_USERNAME`: User for basic authentication
//! - `SERVICENOW_PASSWORD`: Password for basic authentication
//!
//! Optional:
//!
//! - `SERVICENOW_APP_TABLE`: Application table (default `cmdb_ci_appl`)
//! - `PRISM_SCORE_POLICY`: `max` (default) or `first-seen`
//! - `RUST_LOG`: Log level (e.g., `prism=debug`)
//!
//! ## Example
//!
//! ```ignore
//! use prism::config::Config;
//! use prism::matching::{find_matches, MatchOutcome};
//! use prism::snow_client::SnowClient;
//!
//! async fn example() -> Result<(), prism::error::PrismError> {
//!     let config = Config::from_env()?;
//!     let client = SnowClient::new(&config)?;
//!
//!     match find_matches("dev banking", &client, config.score_policy).await? {
//!         MatchOutcome::Found(report) => {
//!             for app in report.records {
//!                 println!("{}: {}", app.id, app.name.unwrap_or_default());
//!             }
//!         }
//!         MatchOutcome::NotFound { search_term } => println!("no match for {search_term}"),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod matching;
pub mod models;
pub mod server;
pub mod snow_client;
pub mod tools;
