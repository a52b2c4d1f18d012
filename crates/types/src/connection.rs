use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Request timeout applied when no explicit value is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection parameters for one Airflow REST API.
///
/// Built once per session and shared read-only by every toolset call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Scheme and host of the Airflow webserver, e.g. `http://localhost`.
    pub base_uri: String,
    /// Port the REST API listens on.
    pub port: u16,
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password. Never printed by `Debug`.
    pub password: String,
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ConnectionConfig {
    pub fn new(base_uri: impl Into<String>, port: u16, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            port,
            username: username.into(),
            password: password.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Root of the versioned REST API, e.g. `http://localhost:8080/api/v1`.
    pub fn api_root(&self) -> String {
        format!("{}:{}/api/v1", self.base_uri.trim_end_matches('/'), self.port)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new("http://localhost", 8080, "airflow", "airflow")
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("base_uri", &self.base_uri)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_root_joins_base_port_and_version() {
        let config = ConnectionConfig::new("http://airflow.internal/", 8080, "user", "pass");
        assert_eq!(config.api_root(), "http://airflow.internal:8080/api/v1");
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = ConnectionConfig::new("http://localhost", 8080, "airflow", "hunter2");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn timeout_defaults_when_missing_from_serialized_form() {
        let config: ConnectionConfig = serde_json::from_value(serde_json::json!({
            "base_uri": "http://localhost",
            "port": 8080,
            "username": "airflow",
            "password": "airflow"
        }))
        .expect("config should deserialize");
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
