//! Model Context Protocol (MCP) server for the Dagwatch toolset.
//!
//! This crate exposes the three Airflow operations of
//! [`dagwatch_api::WorkflowToolset`] as MCP tools, together with the
//! monitoring guidance an external planner follows and the JSON Schema of
//! the [`dagwatch_types::RunStatusReport`] it must answer with. The planner,
//! its retries, and output validation live in the MCP client, not here.

pub mod server;

pub use server::{DagwatchMcpCore, McpHttpServer, McpLogEntry, RunningMcpHttpServer, serve_stdio};
