use crate::server::errors::{api_error, invalid_params_error};
use crate::server::log_payload::{McpLogEntry, build_log_payload};
use crate::server::prompts::{get_prompt as get_monitoring_prompt, list_prompts as list_monitoring_prompts, server_instructions};
use crate::server::resources::{list_resources as list_monitoring_resources, read_resource as read_monitoring_resource};
use crate::server::schemas::DagIdRequest;
use dagwatch_api::WorkflowToolset;
use dagwatch_types::StatusLookup;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, ErrorData, ErrorData as McpError, GetPromptRequestParams, GetPromptResult, Implementation,
    ListPromptsResult, ListResourcesResult, PaginatedRequestParams, ProtocolVersion, ReadResourceRequestParams, ReadResourceResult,
    ServerCapabilities, ServerInfo,
};
use rmcp::{ServerHandler, service::RequestContext, tool, tool_handler, tool_router};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// MCP handler exposing the three toolset operations.
///
/// Anticipated remote states (missing DAG, trigger conflict, rejected
/// trigger) come back as successful tool results carrying a message the
/// planner can relay. Transport failures and unexpected status codes come
/// back as MCP errors.
#[derive(Clone)]
pub struct DagwatchMcpCore {
    tool_router: ToolRouter<Self>,
    log_sender: Option<UnboundedSender<McpLogEntry>>,
    toolset: Arc<dyn WorkflowToolset>,
}

#[tool_router]
impl DagwatchMcpCore {
    /// Create a handler backed by the given toolset.
    pub fn new(toolset: Arc<dyn WorkflowToolset>, log_sender: Option<UnboundedSender<McpLogEntry>>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            log_sender,
            toolset,
        }
    }

    #[tool(
        annotations(read_only_hint = true, open_world_hint = true),
        description = "Get a list of all DAGs from the Airflow instance. Returns DAGs with their IDs and display names. Use first to find the DAG ID that matches the user's request."
    )]
    async fn list_dags(&self) -> Result<CallToolResult, ErrorData> {
        let dags = self
            .toolset
            .list_dags()
            .await
            .map_err(|error| api_error("list_dags", None, &error))?;
        let dags = serde_json::to_value(&dags).map_err(|error| ErrorData::internal_error(error.to_string(), None))?;
        // Structured content must be an object; the text keeps the bare array.
        let mut response = CallToolResult::success(vec![Content::text(dags.to_string())]);
        response.structured_content = Some(serde_json::json!({ "dags": dags }));
        self.emit_log("list_dags", None, Some(serde_json::to_value(&response).unwrap_or(Value::Null)));
        Ok(response)
    }

    #[tool(
        annotations(read_only_hint = true, open_world_hint = true),
        description = "Get detailed status information for a specific DAG by DAG ID. Returns the DAG metadata (dag_data) and its most recent run (runs_data), or a not-found message."
    )]
    async fn get_dag_status(&self, param: Parameters<DagIdRequest>) -> Result<CallToolResult, ErrorData> {
        let dag_id = require_dag_id(&param.0)?;
        let lookup = self
            .toolset
            .get_dag_status(dag_id)
            .await
            .map_err(|error| api_error("get_dag_status", Some(dag_id), &error))?;
        let response = match lookup {
            StatusLookup::Found(snapshot) => {
                CallToolResult::structured(serde_json::to_value(&snapshot).map_err(|error| ErrorData::internal_error(error.to_string(), None))?)
            }
            not_found @ StatusLookup::NotFound { .. } => CallToolResult::success(vec![Content::text(not_found.tool_text())]),
        };
        self.emit_log(
            "get_dag_status",
            Some(serde_json::to_value(&param.0).unwrap_or(Value::Null)),
            Some(serde_json::to_value(&response).unwrap_or(Value::Null)),
        );
        Ok(response)
    }

    #[tool(
        annotations(open_world_hint = true, idempotent_hint = false),
        description = "Triggers a new run for a specific DAG by its ID. After triggering, call get_dag_status for the same DAG ID to get the latest status."
    )]
    async fn trigger_dag(&self, param: Parameters<DagIdRequest>) -> Result<CallToolResult, ErrorData> {
        let dag_id = require_dag_id(&param.0)?;
        let outcome = self
            .toolset
            .trigger_dag(dag_id)
            .await
            .map_err(|error| api_error("trigger_dag", Some(dag_id), &error))?;
        let response = CallToolResult::success(vec![Content::text(outcome.to_string())]);
        self.emit_log(
            "trigger_dag",
            Some(serde_json::to_value(&param.0).unwrap_or(Value::Null)),
            Some(serde_json::to_value(&response).unwrap_or(Value::Null)),
        );
        Ok(response)
    }

    fn emit_log(&self, tool_name: &str, request: Option<Value>, response: Option<Value>) {
        debug!(tool = tool_name, "MCP tool call completed");
        let Some(sender) = self.log_sender.as_ref() else {
            return;
        };
        let payload = build_log_payload(request, response);
        let _ = sender.send(McpLogEntry::new(format!("MCP: {tool_name}"), payload));
    }
}

#[tool_handler]
impl ServerHandler for DagwatchMcpCore {
    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        std::future::ready(Ok(list_monitoring_resources()))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        std::future::ready(read_monitoring_resource(&request.uri))
    }

    fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListPromptsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(list_monitoring_prompts()))
    }

    fn get_prompt(
        &self,
        request: GetPromptRequestParams,
        _context: RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<GetPromptResult, McpError>> + Send + '_ {
        std::future::ready(get_monitoring_prompt(&request.name, request.arguments.as_ref()))
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "Dagwatch".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Dagwatch Airflow MCP".to_string()),
                ..Default::default()
            },
            instructions: Some(server_instructions()),
        }
    }
}

fn require_dag_id(request: &DagIdRequest) -> Result<&str, ErrorData> {
    let dag_id = request.dag_id.trim();
    if dag_id.is_empty() {
        return Err(invalid_params_error(
            "DAG_ID_MISSING",
            "dag_id must not be empty",
            serde_json::json!({ "dag_id": request.dag_id }),
            "Call list_dags and pass one of the returned dag_id values.",
        ));
    }
    Ok(dag_id)
}
