//! Local MCP HTTP server host utilities.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::Router;
use dagwatch_api::WorkflowToolset;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::server::core::DagwatchMcpCore;
use crate::server::log_payload::McpLogEntry;

/// Host configuration for a local MCP HTTP server instance.
#[derive(Clone)]
pub struct McpHttpServer {
    bind_address: SocketAddr,
    log_sender: Option<UnboundedSender<McpLogEntry>>,
    toolset: Arc<dyn WorkflowToolset>,
}

impl McpHttpServer {
    /// Create a new MCP HTTP server bound to the provided address.
    ///
    /// The address is expected to be loopback; see
    /// `dagwatch_api::config::HttpServerSettings::resolve_bind_address`.
    pub fn new(bind_address: SocketAddr, toolset: Arc<dyn WorkflowToolset>) -> Self {
        Self {
            bind_address,
            log_sender: None,
            toolset,
        }
    }

    /// Attach a log sender to stream request/response events to the caller.
    pub fn with_log_sender(mut self, log_sender: UnboundedSender<McpLogEntry>) -> Self {
        self.log_sender = Some(log_sender);
        self
    }

    /// Start the server and return a handle for inspection and shutdown.
    pub async fn start(self) -> Result<RunningMcpHttpServer> {
        let cancellation_token = CancellationToken::new();
        let session_manager = Arc::new(LocalSessionManager::default());

        let log_sender = self.log_sender.clone();
        let toolset = Arc::clone(&self.toolset);
        let service: StreamableHttpService<DagwatchMcpCore, LocalSessionManager> = StreamableHttpService::new(
            move || Ok(DagwatchMcpCore::new(Arc::clone(&toolset), log_sender.clone())),
            Arc::clone(&session_manager),
            StreamableHttpServerConfig {
                stateful_mode: true,
                sse_keep_alive: None,
                cancellation_token: cancellation_token.child_token(),
                ..Default::default()
            },
        );

        let router = Router::new().nest_service("/mcp", service);
        let listener = tokio::net::TcpListener::bind(self.bind_address).await?;
        let bound_address = listener.local_addr()?;
        info!(%bound_address, "MCP HTTP server listening");

        let server_handle = tokio::spawn({
            let shutdown = cancellation_token.child_token();
            async move {
                if let Err(serve_error) = axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown.cancelled().await;
                    })
                    .await
                {
                    error!(error = %serve_error, "MCP HTTP server stopped with an error");
                }
            }
        });

        Ok(RunningMcpHttpServer {
            bind_address: bound_address,
            cancellation_token,
            server_handle,
        })
    }
}

/// Runtime handle for a running MCP HTTP server.
#[derive(Debug)]
pub struct RunningMcpHttpServer {
    bind_address: SocketAddr,
    cancellation_token: CancellationToken,
    server_handle: JoinHandle<()>,
}

impl RunningMcpHttpServer {
    /// Return the bound socket address for the running server.
    pub fn bound_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Stop the server and wait for it to finish.
    pub async fn stop(self) -> Result<()> {
        self.cancellation_token.cancel();
        self.server_handle
            .await
            .map_err(|error| anyhow!("MCP HTTP server task failed: {error}"))?;
        info!("MCP HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagwatch_api::AirflowClient;
    use dagwatch_types::ConnectionConfig;

    #[tokio::test]
    async fn server_binds_ephemeral_port_and_stops() {
        let toolset = Arc::new(AirflowClient::new(ConnectionConfig::default()).expect("client should build"));
        let address: SocketAddr = "127.0.0.1:0".parse().expect("valid address");

        let running = McpHttpServer::new(address, toolset).start().await.expect("server should start");

        assert!(running.bound_address().ip().is_loopback());
        assert_ne!(running.bound_address().port(), 0);
        running.stop().await.expect("server should stop");
    }
}
