use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Compact `{dag_id, dag_display_name}` pair produced from a DAG listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub dag_id: String,
    pub dag_display_name: String,
}

/// Raw DAG metadata and run history returned by a status lookup.
///
/// `runs_data` holds at most one run record: the most recent by execution date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagStatusSnapshot {
    pub dag_data: Value,
    pub runs_data: Value,
}

/// Result of looking up a DAG's status.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusLookup {
    Found(DagStatusSnapshot),
    NotFound { dag_id: String },
}

impl StatusLookup {
    /// Render the lookup as the text handed back to a consuming agent.
    ///
    /// A found snapshot is rendered as JSON, a missing DAG as a sentence.
    pub fn tool_text(&self) -> String {
        match self {
            StatusLookup::Found(snapshot) => serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string()),
            StatusLookup::NotFound { dag_id } => format!("DAG with ID {dag_id} not found"),
        }
    }
}

/// Anticipated outcomes of a trigger request.
///
/// Every variant renders to a natural-language message through `Display`.
/// Transport failures are not represented here; they surface as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A run was created. `state` is `"unknown"` when the response did not report one.
    Triggered { dag_id: String, state: String },
    NotFound { dag_id: String },
    /// The service answered 409: a run is already active or the DAG is paused.
    Conflict { dag_id: String },
    /// Any other non-2xx answer, with the raw response body.
    Rejected { dag_id: String, status: u16, body: String },
}

impl TriggerOutcome {
    pub fn dag_id(&self) -> &str {
        match self {
            TriggerOutcome::Triggered { dag_id, .. }
            | TriggerOutcome::NotFound { dag_id }
            | TriggerOutcome::Conflict { dag_id }
            | TriggerOutcome::Rejected { dag_id, .. } => dag_id,
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self, TriggerOutcome::Triggered { .. })
    }
}

impl fmt::Display for TriggerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerOutcome::Triggered { dag_id, state } => write!(
                f,
                "Successfully triggered DAG '{dag_id}'. The new DAG run is '{state}'. \
                 Now, get the full, updated status using get_dag_status."
            ),
            TriggerOutcome::NotFound { dag_id } => write!(f, "DAG with ID '{dag_id}' not found."),
            TriggerOutcome::Conflict { dag_id } => write!(
                f,
                "Failed to trigger DAG '{dag_id}'. A run is already active or the DAG is paused."
            ),
            TriggerOutcome::Rejected { dag_id, body, .. } => {
                write!(f, "An error occurred while triggering DAG '{dag_id}': {body}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn not_found_lookup_names_the_dag() {
        let lookup = StatusLookup::NotFound {
            dag_id: "daily_payments".to_string(),
        };
        assert_eq!(lookup.tool_text(), "DAG with ID daily_payments not found");
    }

    #[test]
    fn found_lookup_renders_both_payloads() {
        let lookup = StatusLookup::Found(DagStatusSnapshot {
            dag_data: json!({ "dag_id": "daily_payments" }),
            runs_data: json!({ "dag_runs": [], "total_entries": 0 }),
        });
        let rendered: Value = serde_json::from_str(&lookup.tool_text()).expect("tool text should be JSON");
        assert_eq!(rendered["dag_data"]["dag_id"], json!("daily_payments"));
        assert_eq!(rendered["runs_data"]["total_entries"], json!(0));
    }

    #[test]
    fn triggered_message_directs_a_status_refresh() {
        let outcome = TriggerOutcome::Triggered {
            dag_id: "daily_payments".to_string(),
            state: "queued".to_string(),
        };
        let message = outcome.to_string();
        assert!(message.contains("'daily_payments'"));
        assert!(message.contains("'queued'"));
        assert!(message.ends_with("Now, get the full, updated status using get_dag_status."));
    }

    #[test]
    fn failure_messages_match_each_anticipated_case() {
        let dag_id = "etl".to_string();
        assert_eq!(
            TriggerOutcome::NotFound { dag_id: dag_id.clone() }.to_string(),
            "DAG with ID 'etl' not found."
        );
        assert_eq!(
            TriggerOutcome::Conflict { dag_id: dag_id.clone() }.to_string(),
            "Failed to trigger DAG 'etl'. A run is already active or the DAG is paused."
        );
        let rejected = TriggerOutcome::Rejected {
            dag_id,
            status: 400,
            body: "{\"detail\":\"bad conf\"}".to_string(),
        };
        assert_eq!(
            rejected.to_string(),
            "An error occurred while triggering DAG 'etl': {\"detail\":\"bad conf\"}"
        );
        assert!(!rejected.is_triggered());
        assert_eq!(rejected.dag_id(), "etl");
    }
}
