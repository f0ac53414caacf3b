use std::sync::Arc;

use anyhow::Result;
use rmcp::{transport::stdio, ServiceExt};
use tracing::info;

use super::tools::CrowdinService;
use crate::client::CrowdinClient;
use crate::config::Config;

/// Run the MCP server using stdio transport
pub async fn run_mcp_server(config: &Config) -> Result<()> {
    info!("Starting crowdin-tools MCP server");

    let client = Arc::new(CrowdinClient::new(config)?);
    let service = CrowdinService::new(client).serve(stdio()).await?;

    info!("MCP server ready, listening on stdio");
    service.waiting().await?;

    Ok(())
}
