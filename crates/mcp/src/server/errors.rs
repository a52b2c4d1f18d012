//! Structured MCP error helpers.

use chrono::Utc;
use dagwatch_api::ApiError;
use rmcp::model::ErrorData;
use serde_json::Value;

fn build_error_data(error_code: &str, category: &str, message: &str, context: Value, retryable: bool, suggested_action: &str) -> Value {
    serde_json::json!({
        "error_code": error_code,
        "category": category,
        "message": message,
        "context": context,
        "retryable": retryable,
        "suggested_action": suggested_action,
        "correlation_id": format!("dagwatch-{}", Utc::now().timestamp_millis()),
    })
}

pub fn invalid_params_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::invalid_params(
        message.clone(),
        Some(build_error_data(error_code, "validation", &message, context, false, suggested_action)),
    )
}

pub fn not_found_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::resource_not_found(
        message.clone(),
        Some(build_error_data(error_code, "not_found", &message, context, false, suggested_action)),
    )
}

pub fn execution_error(error_code: &str, message: impl Into<String>, context: Value, retryable: bool, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::internal_error(
        message.clone(),
        Some(build_error_data(error_code, "execution", &message, context, retryable, suggested_action)),
    )
}

/// Translate an unanticipated Airflow failure into an MCP error.
pub fn api_error(tool_name: &str, dag_id: Option<&str>, error: &ApiError) -> ErrorData {
    let suggested_action = if error.is_retryable() {
        "The Airflow API may be temporarily unavailable; retry the call."
    } else {
        "Report the failure to the user; retrying the same call will not help."
    };
    execution_error(
        "AIRFLOW_REQUEST_FAILED",
        error.to_string(),
        serde_json::json!({
            "tool": tool_name,
            "dag_id": dag_id,
            "http_status": error.status_code(),
        }),
        error.is_retryable(),
        suggested_action,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;

    #[test]
    fn api_error_carries_status_and_retry_hint() {
        let error = ApiError::Status {
            status: 502,
            url: "http://localhost:8080/api/v1/dags".to_string(),
            body: "bad gateway".to_string(),
        };

        let data = api_error("list_dags", None, &error);

        assert_eq!(data.code, ErrorCode::INTERNAL_ERROR);
        let payload = data.data.expect("error data should be attached");
        assert_eq!(payload["error_code"], serde_json::json!("AIRFLOW_REQUEST_FAILED"));
        assert_eq!(payload["context"]["http_status"], serde_json::json!(502));
        assert_eq!(payload["retryable"], serde_json::json!(true));
    }
}
