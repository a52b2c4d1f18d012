use std::sync::Arc;

use anyhow::{Context, Result};
use dagwatch_api::WorkflowToolset;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing::{debug, info};

use crate::server::core::DagwatchMcpCore;

/// Serve the toolset over stdin/stdout until the client disconnects.
///
/// Logging must not write to stdout while this runs.
pub async fn serve_stdio(toolset: Arc<dyn WorkflowToolset>) -> Result<()> {
    info!("serving MCP over stdio");
    let service = DagwatchMcpCore::new(toolset, None)
        .serve(stdio())
        .await
        .context("start MCP stdio service")?;
    let reason = service.waiting().await.context("MCP stdio service task failed")?;
    debug!(?reason, "MCP stdio service stopped");
    Ok(())
}
