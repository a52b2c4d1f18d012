//! Airflow REST API client utilities.
//!
//! This crate provides the Workflow-Status Toolset: three remote operations
//! against an Airflow instance's `/api/v1` surface. It focuses on:
//!
//! - Building an HTTP client with basic auth and an explicit request timeout
//! - Listing DAGs, fetching a DAG's latest run status, triggering a new run
//! - Translating anticipated remote states (404, 409) into values while
//!   propagating everything else as [`ApiError`]
//! - Resolving [`dagwatch_types::ConnectionConfig`] from file, environment,
//!   and caller overrides
//!
//! The primary entry point is [`AirflowClient`], which implements the
//! [`WorkflowToolset`] capability trait.
//!
//! # Example
//!
//! ```ignore
//! use dagwatch_api::{AirflowClient, WorkflowToolset};
//! use dagwatch_types::ConnectionConfig;
//!
//! async fn run() -> Result<(), dagwatch_api::ApiError> {
//!     let client = AirflowClient::new(ConnectionConfig::default())?;
//!     for dag in client.list_dags().await? {
//!         println!("{} ({})", dag.dag_id, dag.dag_display_name);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
pub mod config;
mod error;
mod toolset;

pub use client::AirflowClient;
pub use error::ApiError;
pub use toolset::WorkflowToolset;
