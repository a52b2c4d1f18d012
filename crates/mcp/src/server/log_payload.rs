//! Log entries streamed to a caller-supplied sink.
//!
//! Every tool call produces one entry holding the request arguments and the
//! tool result, so a host application can render its own activity log.

use serde_json::{Map, Value};

/// Log entry emitted by the MCP server for each tool call.
#[derive(Debug, Clone)]
pub struct McpLogEntry {
    /// Human-readable summary for list display.
    pub message: String,
    /// Optional structured payload for detail inspection.
    pub payload: Option<Value>,
}

impl McpLogEntry {
    pub fn new(message: String, payload: Option<Value>) -> Self {
        Self { message, payload }
    }
}

/// Builds the standard log payload.
///
/// The payload includes `request` and/or `response` when present. Returns
/// `None` when both values are absent.
pub(crate) fn build_log_payload(request: Option<Value>, response: Option<Value>) -> Option<Value> {
    let mut payload = Map::new();
    if let Some(request_value) = request {
        payload.insert("request".to_string(), request_value);
    }
    if let Some(response_value) = response {
        payload.insert("response".to_string(), response_value);
    }
    if payload.is_empty() { None } else { Some(Value::Object(payload)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_log_payload_omits_absent_parts() {
        assert_eq!(build_log_payload(None, None), None);
        assert_eq!(
            build_log_payload(Some(json!({ "dag_id": "etl" })), None),
            Some(json!({ "request": { "dag_id": "etl" } }))
        );
        assert_eq!(
            build_log_payload(None, Some(json!("ok"))),
            Some(json!({ "response": "ok" }))
        );
    }
}
