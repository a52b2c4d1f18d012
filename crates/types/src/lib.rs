//! Shared data model for the Dagwatch toolset.
//!
//! These types describe the connection parameters used to reach an Airflow
//! REST API, the transient values produced by the three toolset operations,
//! and the [`RunStatusReport`] contract that a consuming agent conforms its
//! final answer to.

mod connection;
mod outcome;
mod report;

pub use connection::{ConnectionConfig, DEFAULT_TIMEOUT_SECS};
pub use outcome::{DagStatusSnapshot, StatusLookup, TriggerOutcome, WorkflowSummary};
pub use report::{NO_DAG_RUN, ReportError, RunStatusReport};
