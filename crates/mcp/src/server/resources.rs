//! MCP resources: the run status report schema and the monitoring guide.

use crate::server::errors::not_found_error;
use crate::server::prompts::{STATUS_WORKFLOW, TRIGGER_WORKFLOW};
use rmcp::model::{AnnotateAble, ListResourcesResult, RawResource, ReadResourceResult, ResourceContents};

pub const REPORT_SCHEMA_URI: &str = "dagwatch://schema/run-status-report";
pub const MONITORING_GUIDE_URI: &str = "dagwatch://guide/monitoring";
const EMBEDDED_REPORT_SCHEMA: &str = include_str!(concat!(env!("OUT_DIR"), "/run_status_report.schema.json"));

/// Build the server resource list.
pub fn list_resources() -> ListResourcesResult {
    let resources = vec![
        resource(
            REPORT_SCHEMA_URI,
            "dag.run_status_report_schema",
            "application/json",
            Some("Run status report JSON schema"),
            Some("Schema the final answer about a DAG must conform to"),
        ),
        resource(
            MONITORING_GUIDE_URI,
            "dag.monitoring_guide",
            "text/markdown",
            Some("Monitoring guide"),
            Some("Tool call order for checking status and triggering DAG runs"),
        ),
    ];

    ListResourcesResult::with_all_items(resources)
}

/// Read a resource URI and return text content.
pub fn read_resource(uri: &str) -> Result<ReadResourceResult, rmcp::model::ErrorData> {
    match uri {
        REPORT_SCHEMA_URI => Ok(text_resource(uri, "application/json", EMBEDDED_REPORT_SCHEMA.to_string())),
        MONITORING_GUIDE_URI => Ok(text_resource(uri, "text/markdown", monitoring_guide())),
        _ => Err(not_found_error(
            "RESOURCE_NOT_FOUND",
            format!("resource '{}' was not found", uri),
            serde_json::json!({ "uri": uri }),
            "Call resources/list to inspect available resources.",
        )),
    }
}

fn monitoring_guide() -> String {
    format!("# Airflow monitoring\n\n{STATUS_WORKFLOW}\n\n{TRIGGER_WORKFLOW}\n")
}

fn resource(uri: &str, name: &str, mime_type: &str, title: Option<&str>, description: Option<&str>) -> rmcp::model::Resource {
    RawResource {
        uri: uri.to_string(),
        name: name.to_string(),
        title: title.map(ToString::to_string),
        description: description.map(ToString::to_string),
        mime_type: Some(mime_type.to_string()),
        size: None,
        icons: None,
        meta: None,
    }
    .no_annotation()
}

fn text_resource(uri: &str, mime_type: &str, text: String) -> ReadResourceResult {
    ReadResourceResult {
        contents: vec![ResourceContents::TextResourceContents {
            uri: uri.to_string(),
            mime_type: Some(mime_type.to_string()),
            text,
            meta: None,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;
    use serde_json::Value;

    fn resource_text(result: ReadResourceResult) -> String {
        match result.contents.into_iter().next() {
            Some(ResourceContents::TextResourceContents { text, .. }) => text,
            other => panic!("unexpected resource contents: {other:?}"),
        }
    }

    #[test]
    fn schema_resource_describes_run_status_report() {
        let text = resource_text(read_resource(REPORT_SCHEMA_URI).expect("schema resource should read"));
        let schema: Value = serde_json::from_str(&text).expect("schema should be JSON");
        let properties = schema["properties"].as_object().expect("schema properties");
        for field in [
            "dag_id",
            "dag_display_name",
            "is_paused",
            "next_dag_run_data_interval_start",
            "next_dag_run_data_interval_end",
            "last_dag_run_id",
            "last_dag_run_state",
            "total_dag_runs",
        ] {
            assert!(properties.contains_key(field), "schema should describe {field}");
        }
    }

    #[test]
    fn guide_resource_lists_both_workflows() {
        let text = resource_text(read_resource(MONITORING_GUIDE_URI).expect("guide resource should read"));
        assert!(text.contains("Checking Status"));
        assert!(text.contains("Triggering a DAG"));
    }

    #[test]
    fn unknown_resource_is_not_found() {
        let error = read_resource("dagwatch://nope").expect_err("unknown uri should fail");
        assert_eq!(error.code, ErrorCode::RESOURCE_NOT_FOUND);
    }

    #[test]
    fn list_resources_exposes_schema_and_guide() {
        let uris = list_resources()
            .resources
            .into_iter()
            .map(|resource| resource.raw.uri)
            .collect::<Vec<String>>();
        assert_eq!(uris, vec![REPORT_SCHEMA_URI.to_string(), MONITORING_GUIDE_URI.to_string()]);
    }
}
