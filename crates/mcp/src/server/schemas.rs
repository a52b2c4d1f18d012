use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for tools that act on a single DAG.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct DagIdRequest {
    /// DAG identifier exactly as returned by `list_dags`.
    #[schemars(description = "DAG ID as returned by list_dags, for example: 'daily_payment_report'.")]
    pub dag_id: String,
}
