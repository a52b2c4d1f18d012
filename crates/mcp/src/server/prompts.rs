//! Monitoring prompts: the call-order guidance the planner follows.

use crate::server::errors::{invalid_params_error, not_found_error};
use crate::server::resources::REPORT_SCHEMA_URI;
use rmcp::model::{GetPromptResult, Prompt, PromptArgument, PromptMessage, PromptMessageRole};
use serde_json::{Map, Value};

pub const STATUS_WORKFLOW: &str = "**Workflow for Checking Status:**\n\
1. Use `list_dags` to find the correct DAG ID based on the user request.\n\
2. Use `get_dag_status` with the identified DAG ID to get its details.";

pub const TRIGGER_WORKFLOW: &str = "**Workflow for Triggering a DAG:**\n\
1. Use `list_dags` to find the correct DAG ID.\n\
2. Use the `trigger_dag` tool with the DAG ID to start a new run.\n\
3. After triggering, immediately call `get_dag_status` for the same DAG ID to get the latest status and use this for the final answer.";

/// Server instructions sent to every MCP client on initialize.
pub fn server_instructions() -> String {
    format!(
        "You are an Airflow monitoring assistant.\n{STATUS_WORKFLOW}\n{TRIGGER_WORKFLOW}\n\
         Answer with a JSON object matching the schema at {REPORT_SCHEMA_URI}."
    )
}

/// List monitoring prompts exposed by the MCP server.
pub fn list_prompts() -> rmcp::model::ListPromptsResult {
    rmcp::model::ListPromptsResult::with_all_items(vec![
        prompt_definition(
            "dag.check_status",
            "Find a DAG from a natural-language request and report its run status.",
            vec![required_argument("request", "User request naming the DAG to check")],
        ),
        prompt_definition(
            "dag.trigger",
            "Find a DAG from a natural-language request, trigger a run, and report the refreshed status.",
            vec![required_argument("request", "User request naming the DAG to run")],
        ),
    ])
}

/// Resolve a monitoring prompt by name and arguments.
pub fn get_prompt(name: &str, arguments: Option<&Map<String, Value>>) -> Result<GetPromptResult, rmcp::model::ErrorData> {
    match name {
        "dag.check_status" => workflow_prompt(
            arguments,
            "Report the current run status of the requested DAG.",
            STATUS_WORKFLOW,
        ),
        "dag.trigger" => workflow_prompt(
            arguments,
            "Trigger the requested DAG and report its refreshed status.",
            TRIGGER_WORKFLOW,
        ),
        _ => Err(not_found_error(
            "PROMPT_NOT_FOUND",
            format!("prompt '{}' was not found", name),
            serde_json::json!({ "name": name }),
            "Call prompts/list to inspect available prompts.",
        )),
    }
}

fn workflow_prompt(
    arguments: Option<&Map<String, Value>>,
    description: &str,
    workflow: &str,
) -> Result<GetPromptResult, rmcp::model::ErrorData> {
    let request = require_string_argument(arguments, "request")?;

    Ok(GetPromptResult {
        description: Some(description.to_string()),
        messages: vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "You are an Airflow monitoring assistant.\n{workflow}\n\nUser request:\n{request}\n\nRules:\n- Use only DAG IDs returned by list_dags\n- Relay not-found and conflict messages to the user as they are\n- Answer with a JSON object matching the schema at {REPORT_SCHEMA_URI}"
            ),
        )],
    })
}

fn prompt_definition(name: &str, description: &str, arguments: Vec<PromptArgument>) -> Prompt {
    Prompt {
        name: name.to_string(),
        title: None,
        description: Some(description.to_string()),
        arguments: Some(arguments),
        icons: None,
        meta: None,
    }
}

fn required_argument(name: &str, description: &str) -> PromptArgument {
    PromptArgument {
        name: name.to_string(),
        title: None,
        description: Some(description.to_string()),
        required: Some(true),
    }
}

fn require_string_argument(arguments: Option<&Map<String, Value>>, key: &str) -> Result<String, rmcp::model::ErrorData> {
    match arguments.and_then(|args| args.get(key)).and_then(Value::as_str) {
        Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
        _ => Err(invalid_params_error(
            "PROMPT_ARGUMENT_MISSING",
            format!("prompt argument '{}' is required", key),
            serde_json::json!({ "argument": key }),
            "Provide all required prompt arguments and retry.",
        )),
    }
}
