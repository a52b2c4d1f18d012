use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use dagwatch_types::{ConnectionConfig, DagStatusSnapshot, StatusLookup, TriggerOutcome, WorkflowSummary};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url, header};
use serde_json::{Value, json};
use tracing::{debug, error, info};

use crate::{ApiError, WorkflowToolset};

/// Query selecting only the most recent run, newest execution date first.
const LATEST_RUN_QUERY: [(&str, &str); 2] = [("order_by", "-execution_date"), ("limit", "1")];

/// Thin wrapper around a configured `reqwest::Client` for Airflow API access.
///
/// The client carries basic-auth credentials, an explicit request timeout and
/// a validated `/api/v1` root. Cloning is cheap; the connection parameters are
/// shared read-only.
#[derive(Debug, Clone)]
pub struct AirflowClient {
    config: Arc<ConnectionConfig>,
    api_root: Url,
    http: Client,
    user_agent: String,
}

impl AirflowClient {
    /// Construct a client for the given connection parameters.
    pub fn new(config: ConnectionConfig) -> Result<Self, ApiError> {
        Self::from_shared(Arc::new(config))
    }

    /// Construct a client that shares an existing set of connection parameters.
    pub fn from_shared(config: Arc<ConnectionConfig>) -> Result<Self, ApiError> {
        let api_root = build_api_root(&config)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()?;

        Ok(Self {
            config,
            api_root,
            http,
            user_agent: format!("dagwatch/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// The resolved `/api/v1` root every endpoint is built from.
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// Build an endpoint URL by appending path segments to the API root.
    ///
    /// Each segment is percent-encoded. `Url` drops `.` and `..` segments
    /// rather than encoding them, so those and empty segments are refused.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(segment) = segments.iter().find(|segment| !is_addressable(segment)) {
            return Err(invalid_url(segment, "empty and dot path segments cannot be addressed"));
        }
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|_| invalid_url(self.api_root.as_str(), "URL cannot carry path segments"))?
            .extend(segments);
        Ok(url)
    }

    /// Build an authenticated `reqwest::RequestBuilder` for an endpoint.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "building request");

        self.http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent)
            .basic_auth(&self.config.username, Some(&self.config.password))
    }
}

#[async_trait]
impl WorkflowToolset for AirflowClient {
    async fn list_dags(&self) -> Result<Vec<WorkflowSummary>, ApiError> {
        info!("Getting available DAGs...");
        let url = self.endpoint(&["dags"])?;
        let response = self.request(Method::GET, url.clone()).send().await?;
        let payload = json_body(response).await?;

        let summaries = parse_dag_summaries(&payload).map_err(|message| ApiError::Decode {
            url: url.to_string(),
            message,
        })?;
        debug!(count = summaries.len(), dags = ?summaries, "available DAGs");
        Ok(summaries)
    }

    async fn get_dag_status(&self, dag_id: &str) -> Result<StatusLookup, ApiError> {
        info!(dag_id, "Getting status for DAG");
        let not_found = || StatusLookup::NotFound {
            dag_id: dag_id.to_string(),
        };
        if !is_addressable(dag_id) {
            debug!(dag_id, "DAG id cannot name a DAG resource");
            return Ok(not_found());
        }

        let dag_url = self.endpoint(&["dags", dag_id])?;
        let dag_response = self.request(Method::GET, dag_url).send().await?;
        if dag_response.status() == StatusCode::NOT_FOUND {
            debug!(dag_id, "DAG metadata not found");
            return Ok(not_found());
        }
        let dag_data = json_body(dag_response).await?;

        let runs_url = self.endpoint(&["dags", dag_id, "dagRuns"])?;
        let runs_response = self
            .request(Method::GET, runs_url)
            .query(&LATEST_RUN_QUERY)
            .send()
            .await?;
        if runs_response.status() == StatusCode::NOT_FOUND {
            debug!(dag_id, "DAG run history not found");
            return Ok(not_found());
        }
        let runs_data = json_body(runs_response).await?;

        let snapshot = DagStatusSnapshot { dag_data, runs_data };
        debug!(dag_id, snapshot = ?snapshot, "DAG status");
        Ok(StatusLookup::Found(snapshot))
    }

    async fn trigger_dag(&self, dag_id: &str) -> Result<TriggerOutcome, ApiError> {
        info!(dag_id, "Triggering DAG");
        if !is_addressable(dag_id) {
            debug!(dag_id, "DAG id cannot name a DAG resource");
            return Ok(TriggerOutcome::NotFound {
                dag_id: dag_id.to_string(),
            });
        }
        let url = self.endpoint(&["dags", dag_id, "dagRuns"])?;

        // The API rejects an empty body; an empty conf object is required.
        let response = self
            .request(Method::POST, url)
            .json(&json!({ "conf": {} }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            let run = serde_json::from_str::<Value>(&body).unwrap_or(Value::Null);
            let state = run.get("state").and_then(Value::as_str).unwrap_or("unknown").to_string();
            info!(dag_id, run = %body, "Successfully triggered DAG");
            return Ok(TriggerOutcome::Triggered {
                dag_id: dag_id.to_string(),
                state,
            });
        }

        error!(dag_id, status = status.as_u16(), %body, "Failed to trigger DAG");
        let dag_id = dag_id.to_string();
        Ok(match status {
            StatusCode::NOT_FOUND => TriggerOutcome::NotFound { dag_id },
            StatusCode::CONFLICT => TriggerOutcome::Conflict { dag_id },
            _ => TriggerOutcome::Rejected {
                dag_id,
                status: status.as_u16(),
                body,
            },
        })
    }
}

/// Resolve `{base_uri}:{port}/api/v1` into a URL.
///
/// Rules:
/// - the base URI must parse and use `http` or `https`
/// - the configured port replaces any port in the base URI
/// - any path on the base URI is kept as a prefix (reverse-proxy setups)
fn build_api_root(config: &ConnectionConfig) -> Result<Url, ApiError> {
    let base = config.base_uri.trim();
    let mut url = Url::parse(base).map_err(|error| invalid_url(base, &error.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid_url(base, "scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid_url(base, "a host is required"));
    }
    url.set_port(Some(config.port))
        .map_err(|_| invalid_url(base, "port cannot be set on this URL"))?;
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| invalid_url(base, "URL cannot carry path segments"))?
        .pop_if_empty()
        .extend(["api", "v1"]);
    Ok(url)
}

/// Whether a value maps onto exactly one path segment.
fn is_addressable(segment: &str) -> bool {
    !matches!(segment, "" | "." | "..")
}

fn invalid_url(value: &str, reason: &str) -> ApiError {
    ApiError::InvalidUrl {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Read a successful response as JSON, or turn a non-2xx answer into an error.
async fn json_body(response: Response) -> Result<Value, ApiError> {
    let url = response.url().to_string();
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            url,
            body,
        });
    }

    response.json::<Value>().await.map_err(|error| ApiError::Decode {
        url,
        message: error.to_string(),
    })
}

/// Reduce a `GET /dags` payload to id/display-name pairs, in server order.
///
/// Airflow versions before 2.9 omit `dag_display_name`; the id stands in for it.
fn parse_dag_summaries(payload: &Value) -> Result<Vec<WorkflowSummary>, String> {
    let dags = payload
        .get("dags")
        .and_then(Value::as_array)
        .ok_or_else(|| "response has no 'dags' array".to_string())?;

    dags.iter()
        .enumerate()
        .map(|(index, dag)| {
            let dag_id = dag
                .get("dag_id")
                .and_then(Value::as_str)
                .ok_or_else(|| format!("entry {index} has no 'dag_id'"))?;
            let dag_display_name = dag.get("dag_display_name").and_then(Value::as_str).unwrap_or(dag_id);
            Ok(WorkflowSummary {
                dag_id: dag_id.to_string(),
                dag_display_name: dag_display_name.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base_uri: &str, port: u16) -> AirflowClient {
        AirflowClient::new(ConnectionConfig::new(base_uri, port, "airflow", "airflow")).expect("client should build")
    }

    #[test]
    fn api_root_appends_port_and_version() {
        let client = client_for("http://localhost", 8080);
        assert_eq!(client.api_root().as_str(), "http://localhost:8080/api/v1");
    }

    #[test]
    fn api_root_keeps_path_prefix() {
        let client = client_for("https://ops.example.com/airflow/", 443);
        assert_eq!(client.api_root().path(), "/airflow/api/v1");
    }

    #[test]
    fn api_root_rejects_non_http_schemes() {
        let error = AirflowClient::new(ConnectionConfig::new("ftp://localhost", 21, "a", "b")).expect_err("ftp should be rejected");
        assert!(matches!(error, ApiError::InvalidUrl { .. }));
    }

    #[test]
    fn api_root_rejects_unparseable_base() {
        let error = AirflowClient::new(ConnectionConfig::new("localhost", 8080, "a", "b")).expect_err("missing scheme should be rejected");
        assert!(matches!(error, ApiError::InvalidUrl { .. }));
    }

    #[test]
    fn endpoint_percent_encodes_dag_ids() {
        let client = client_for("http://localhost", 8080);
        let url = client.endpoint(&["dags", "reports/daily run", "dagRuns"]).expect("endpoint should build");
        assert_eq!(url.path(), "/api/v1/dags/reports%2Fdaily%20run/dagRuns");
    }

    #[test]
    fn endpoint_refuses_dot_and_empty_segments() {
        let client = client_for("http://localhost", 8080);
        for dag_id in ["..", ".", ""] {
            let error = client.endpoint(&["dags", dag_id]).expect_err("segment should be refused");
            assert!(matches!(error, ApiError::InvalidUrl { .. }), "{dag_id:?} produced {error:?}");
        }
        let dotted = client.endpoint(&["dags", "etl.v2"]).expect("dots inside an id are fine");
        assert_eq!(dotted.path(), "/api/v1/dags/etl.v2");
    }

    #[test]
    fn parse_dag_summaries_keeps_only_id_and_display_name() {
        let payload = json!({
            "dags": [
                { "dag_id": "payments", "dag_display_name": "Daily payments", "is_paused": false, "owners": ["ops"] },
                { "dag_id": "legacy" }
            ],
            "total_entries": 2
        });

        let summaries = parse_dag_summaries(&payload).expect("payload should parse");
        assert_eq!(
            summaries,
            vec![
                WorkflowSummary {
                    dag_id: "payments".to_string(),
                    dag_display_name: "Daily payments".to_string(),
                },
                WorkflowSummary {
                    dag_id: "legacy".to_string(),
                    dag_display_name: "legacy".to_string(),
                },
            ]
        );
    }

    #[test]
    fn parse_dag_summaries_rejects_missing_collection() {
        let error = parse_dag_summaries(&json!({ "items": [] })).expect_err("missing dags should fail");
        assert!(error.contains("'dags'"));
    }
}
