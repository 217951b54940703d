//! Prism - MCP server for ServiceNow
//!
//! This binary runs as an MCP server using stdio transport, allowing
//! an automation agent to search the CMDB application catalog and check
//! user identities.
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `SERVICENOW_INSTANCE`: Instance name or base URL
//! - `SERVICENOW_USERNAME`: User for basic authentication
//! - `SERVICENOW_PASSWORD`: Password for basic authentication
//!
//! # Usage
//!
//! ```bash
//! SERVICENOW_INSTANCE=acme SERVICENOW_USERNAME=svc SERVICENOW_PASSWORD=... ./prism
//! ```

use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::{fmt, EnvFilter};

use prism::{config, server, snow_client};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    // stdout is reserved for MCP JSON-RPC messages
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prism=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting Prism MCP server v{}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::from_env().context("Failed to load configuration")?;

    tracing::debug!(
        instance = %config.instance_url,
        table = %config.application_table,
        policy = ?config.score_policy,
        "Configuration loaded"
    );

    let client =
        snow_client::SnowClient::new(&config).context("Failed to create ServiceNow client")?;

    tracing::info!("Testing connection to ServiceNow...");
    if let Err(e) = client.test_connection().await {
        tracing::error!(error = %e, "Connection test failed");
        // The instance might become reachable later
        tracing::warn!(
            "Server will start but may not be able to reach ServiceNow. \
             Check configuration and network connectivity."
        );
    }

    let server = server::PrismServer::new(client, config.score_policy);

    tracing::info!("Server initialized, starting stdio transport");

    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })
        .context("Failed to start server")?;

    tracing::info!("Server running, waiting for requests");

    service
        .waiting()
        .await
        .context("Server error during operation")?;

    tracing::info!("Server shutting down");

    Ok(())
}
