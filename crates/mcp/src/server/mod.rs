mod core;
mod errors;
mod http;
mod log_payload;
mod prompts;
mod resources;
mod schemas;
mod stdio;

pub use core::DagwatchMcpCore;
pub use http::{McpHttpServer, RunningMcpHttpServer};
pub use log_payload::McpLogEntry;
pub use stdio::serve_stdio;
