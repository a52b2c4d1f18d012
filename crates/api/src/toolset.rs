use async_trait::async_trait;
use dagwatch_types::{StatusLookup, TriggerOutcome, WorkflowSummary};

use crate::ApiError;

/// The three operations an external planner may invoke.
///
/// Implementations hold no mutable state; calls may run concurrently and in
/// any order. Suggested ordering (list before status, trigger before
/// re-checking status) is guidance for the planner and is not enforced here.
#[async_trait]
pub trait WorkflowToolset: Send + Sync {
    /// List every known DAG as `{dag_id, dag_display_name}` pairs.
    async fn list_dags(&self) -> Result<Vec<WorkflowSummary>, ApiError>;

    /// Fetch DAG metadata plus its most recent run.
    async fn get_dag_status(&self, dag_id: &str) -> Result<StatusLookup, ApiError>;

    /// Request a new run with an empty configuration.
    async fn trigger_dag(&self, dag_id: &str) -> Result<TriggerOutcome, ApiError>;
}
