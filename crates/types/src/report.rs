use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::DagStatusSnapshot;

/// Placeholder used for run fields when a DAG has never run.
pub const NO_DAG_RUN: &str = "No DAG run";

/// Structured status summary for one DAG.
///
/// Field names, defaults, and required-ness are a wire contract with the
/// consuming agent; the JSON Schema published to it is generated from this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunStatusReport {
    #[schemars(description = "ID of the DAG")]
    pub dag_id: String,
    #[schemars(description = "Display name of the DAG")]
    pub dag_display_name: String,
    #[schemars(description = "Whether the DAG is paused")]
    pub is_paused: bool,
    #[schemars(description = "Next DAG run data interval start")]
    pub next_dag_run_data_interval_start: String,
    #[schemars(description = "Next DAG run data interval end")]
    pub next_dag_run_data_interval_end: String,
    #[serde(default = "no_dag_run")]
    #[schemars(description = "Last DAG run ID")]
    pub last_dag_run_id: String,
    #[serde(default = "no_dag_run")]
    #[schemars(description = "Last DAG run state")]
    pub last_dag_run_state: String,
    #[schemars(description = "Total number of DAG runs")]
    pub total_dag_runs: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("DAG metadata is missing the '{field}' field")]
    MissingField { field: &'static str },
}

impl RunStatusReport {
    /// Derive a report from a status snapshot.
    ///
    /// - identity, pause flag and next data interval come from `dag_data`
    /// - the first entry of `runs_data.dag_runs` is the most recent run
    /// - the run count is `runs_data.total_entries`, or the number of run
    ///   records when the service omits it
    ///
    /// A missing display name falls back to the DAG id and a null interval
    /// bound renders as `"None"`.
    pub fn from_snapshot(snapshot: &DagStatusSnapshot) -> Result<Self, ReportError> {
        let dag = &snapshot.dag_data;
        let dag_id = dag
            .get("dag_id")
            .and_then(Value::as_str)
            .ok_or(ReportError::MissingField { field: "dag_id" })?
            .to_string();
        let dag_display_name = dag
            .get("dag_display_name")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .unwrap_or_else(|| dag_id.clone());

        let runs = snapshot.runs_data.get("dag_runs").and_then(Value::as_array);
        let latest_run = runs.and_then(|runs| runs.first());
        let total_dag_runs = snapshot
            .runs_data
            .get("total_entries")
            .and_then(Value::as_u64)
            .or_else(|| runs.map(|runs| runs.len() as u64))
            .unwrap_or(0);

        Ok(Self {
            dag_id,
            dag_display_name,
            is_paused: dag.get("is_paused").and_then(Value::as_bool).unwrap_or(false),
            next_dag_run_data_interval_start: interval_bound(dag, "next_dagrun_data_interval_start"),
            next_dag_run_data_interval_end: interval_bound(dag, "next_dagrun_data_interval_end"),
            last_dag_run_id: run_field(latest_run, "dag_run_id"),
            last_dag_run_state: run_field(latest_run, "state"),
            total_dag_runs,
        })
    }

    /// JSON Schema describing the report, as handed to the consuming agent.
    pub fn json_schema() -> Result<Value, serde_json::Error> {
        serde_json::to_value(schemars::schema_for!(RunStatusReport))
    }
}

fn no_dag_run() -> String {
    NO_DAG_RUN.to_string()
}

// Airflow spells the interval fields `next_dagrun_*`; the report uses `next_dag_run_*`.
fn interval_bound(dag: &Value, key: &str) -> String {
    match dag.get(key) {
        Some(Value::String(bound)) => bound.clone(),
        Some(Value::Null) | None => "None".to_string(),
        Some(other) => other.to_string(),
    }
}

fn run_field(run: Option<&Value>, key: &str) -> String {
    run.and_then(|run| run.get(key))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .unwrap_or_else(no_dag_run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(dag_data: Value, runs_data: Value) -> DagStatusSnapshot {
        DagStatusSnapshot { dag_data, runs_data }
    }

    #[test]
    fn report_uses_latest_run_and_total_entries() {
        let report = RunStatusReport::from_snapshot(&snapshot(
            json!({
                "dag_id": "daily_payment_report",
                "dag_display_name": "Daily payment report",
                "is_paused": false,
                "next_dagrun_data_interval_start": "2026-10-18T00:00:00+00:00",
                "next_dagrun_data_interval_end": "2026-10-19T00:00:00+00:00"
            }),
            json!({
                "dag_runs": [{ "dag_run_id": "manual__2026-10-17", "state": "success" }],
                "total_entries": 42
            }),
        ))
        .expect("report should derive");

        assert_eq!(report.dag_id, "daily_payment_report");
        assert_eq!(report.dag_display_name, "Daily payment report");
        assert!(!report.is_paused);
        assert_eq!(report.next_dag_run_data_interval_start, "2026-10-18T00:00:00+00:00");
        assert_eq!(report.next_dag_run_data_interval_end, "2026-10-19T00:00:00+00:00");
        assert_eq!(report.last_dag_run_id, "manual__2026-10-17");
        assert_eq!(report.last_dag_run_state, "success");
        assert_eq!(report.total_dag_runs, 42);
    }

    #[test]
    fn report_without_runs_uses_placeholders() {
        let report = RunStatusReport::from_snapshot(&snapshot(
            json!({
                "dag_id": "fresh",
                "is_paused": true,
                "next_dagrun_data_interval_start": null
            }),
            json!({ "dag_runs": [] }),
        ))
        .expect("report should derive");

        assert_eq!(report.dag_display_name, "fresh");
        assert!(report.is_paused);
        assert_eq!(report.next_dag_run_data_interval_start, "None");
        assert_eq!(report.next_dag_run_data_interval_end, "None");
        assert_eq!(report.last_dag_run_id, NO_DAG_RUN);
        assert_eq!(report.last_dag_run_state, NO_DAG_RUN);
        assert_eq!(report.total_dag_runs, 0);
    }

    #[test]
    fn report_requires_dag_id() {
        let error = RunStatusReport::from_snapshot(&snapshot(json!({}), json!({}))).expect_err("missing dag_id should fail");
        assert_eq!(error, ReportError::MissingField { field: "dag_id" });
    }

    #[test]
    fn deserializing_applies_run_defaults() {
        let report: RunStatusReport = serde_json::from_value(json!({
            "dag_id": "etl",
            "dag_display_name": "ETL",
            "is_paused": false,
            "next_dag_run_data_interval_start": "a",
            "next_dag_run_data_interval_end": "b",
            "total_dag_runs": 3
        }))
        .expect("report should deserialize");
        assert_eq!(report.last_dag_run_id, NO_DAG_RUN);
        assert_eq!(report.last_dag_run_state, NO_DAG_RUN);
    }

    #[test]
    fn schema_marks_run_fields_optional() {
        let schema = RunStatusReport::json_schema().expect("schema should serialize");
        let required = schema["required"].as_array().expect("schema should list required fields");
        let required = required.iter().filter_map(Value::as_str).collect::<Vec<&str>>();

        assert!(required.contains(&"dag_id"));
        assert!(required.contains(&"total_dag_runs"));
        assert!(!required.contains(&"last_dag_run_id"));
        assert!(!required.contains(&"last_dag_run_state"));
        assert_eq!(schema["properties"]["dag_id"]["description"], json!("ID of the DAG"));
    }
}
