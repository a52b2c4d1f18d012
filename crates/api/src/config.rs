//! Connection configuration loading.
//!
//! Values are layered, later sources winning:
//!
//! 1. built-in defaults ([`ConnectionConfig::default`])
//! 2. the JSON config file (`DAGWATCH_CONFIG_PATH` or `<config dir>/dagwatch/config.json`)
//! 3. `AIRFLOW_API_*` environment variables
//! 4. caller overrides (CLI flags)
//!
//! String values in the file may reference the environment with `${env:NAME}`.

use std::env;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use dagwatch_types::ConnectionConfig;
use dirs_next::{config_dir, home_dir};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const CONFIG_PATH_ENV: &str = "DAGWATCH_CONFIG_PATH";
pub const BASE_URI_ENV: &str = "AIRFLOW_API_BASE_URI";
pub const PORT_ENV: &str = "AIRFLOW_API_PORT";
pub const USER_ENV: &str = "AIRFLOW_API_USER";
pub const PASSWORD_ENV: &str = "AIRFLOW_API_PASS";
pub const TIMEOUT_ENV: &str = "AIRFLOW_API_TIMEOUT_SECS";

/// Loopback address the MCP HTTP host binds to when none is configured.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:62890";

static ENV_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{env:([\w-]+)\}").expect("placeholder regex is valid"));

/// Contents of the Dagwatch config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DagwatchConfig {
    #[serde(default)]
    pub airflow: AirflowSettings,
    #[serde(default)]
    pub http_server: HttpServerSettings,
}

/// Partial connection settings from one configuration source.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AirflowSettings {
    pub base_uri: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Settings for the local MCP HTTP host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpServerSettings {
    /// Bind address, e.g. `127.0.0.1:62890`. Must be a loopback address.
    pub bind_address: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing environment variable: {name}")]
    MissingEnvVar { name: String },

    #[error("invalid value '{value}' for {name}")]
    InvalidEnvValue { name: String, value: String },

    #[error("invalid Airflow base URI '{value}': {reason}")]
    InvalidBaseUri { value: String, reason: String },

    #[error("Airflow API port must be non-zero")]
    InvalidPort,

    #[error("Airflow API request timeout must be at least one second")]
    InvalidTimeout,

    #[error("Airflow API {field} must not be empty")]
    MissingField { field: &'static str },

    #[error("invalid MCP HTTP bind address '{value}': {reason}")]
    InvalidBindAddress { value: String, reason: String },
}

impl AirflowSettings {
    /// Read `AIRFLOW_API_*` variables. Unset variables stay `None`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_uri: env_string(BASE_URI_ENV),
            port: env_parsed(PORT_ENV)?,
            username: env_string(USER_ENV),
            password: env_string(PASSWORD_ENV),
            timeout_secs: env_parsed(TIMEOUT_ENV)?,
        })
    }

    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn overlay(self, other: AirflowSettings) -> AirflowSettings {
        AirflowSettings {
            base_uri: other.base_uri.or(self.base_uri),
            port: other.port.or(self.port),
            username: other.username.or(self.username),
            password: other.password.or(self.password),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
        }
    }

    /// Fill unset fields from the defaults and validate the result.
    pub fn into_connection_config(self) -> Result<ConnectionConfig, ConfigError> {
        let defaults = ConnectionConfig::default();
        let config = ConnectionConfig {
            base_uri: self.base_uri.unwrap_or(defaults.base_uri),
            port: self.port.unwrap_or(defaults.port),
            username: self.username.unwrap_or(defaults.username),
            password: self.password.unwrap_or(defaults.password),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
        };
        validate_connection_config(&config)?;
        Ok(config)
    }
}

impl fmt::Debug for AirflowSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AirflowSettings")
            .field("base_uri", &self.base_uri)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl HttpServerSettings {
    /// Resolve the configured bind address, refusing anything but loopback.
    pub fn resolve_bind_address(&self, override_address: Option<&str>) -> Result<SocketAddr, ConfigError> {
        let address = override_address
            .or(self.bind_address.as_deref())
            .unwrap_or(DEFAULT_BIND_ADDRESS);
        let parsed: SocketAddr = address.parse().map_err(|error: std::net::AddrParseError| ConfigError::InvalidBindAddress {
            value: address.to_string(),
            reason: error.to_string(),
        })?;
        if !parsed.ip().is_loopback() {
            return Err(ConfigError::InvalidBindAddress {
                value: address.to_string(),
                reason: "MCP HTTP server must bind to a loopback address".to_string(),
            });
        }
        Ok(parsed)
    }
}

/// Returns the default path for the config file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dagwatch")
        .join("config.json")
}

/// Loads the config file from a specific path.
///
/// A missing file yields the empty configuration.
pub fn load_config_from_path(path: &Path) -> Result<DagwatchConfig, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "config file not found; using defaults");
        return Ok(DagwatchConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: DagwatchConfig = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    interpolate_config(&mut config)?;
    Ok(config)
}

/// Resolve connection parameters from every source.
///
/// Returns the validated connection parameters together with the loaded file
/// so callers can read the remaining sections.
pub fn resolve_connection_config(
    config_path: Option<&Path>,
    overrides: AirflowSettings,
) -> Result<(ConnectionConfig, DagwatchConfig), ConfigError> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    let file_config = load_config_from_path(&path)?;

    let settings = file_config
        .airflow
        .clone()
        .overlay(AirflowSettings::from_env()?)
        .overlay(overrides);
    if settings.password.is_none() {
        warn!("no Airflow password configured; falling back to the default credentials");
    }

    let connection = settings.into_connection_config()?;
    debug!(connection = ?connection, "resolved Airflow connection");
    Ok((connection, file_config))
}

/// Check that connection parameters can address an Airflow API.
pub fn validate_connection_config(config: &ConnectionConfig) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBaseUri {
        value: config.base_uri.clone(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(config.base_uri.trim()).map_err(|error| invalid(&error.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("a host is required"));
    }
    if parsed.port().is_some() {
        return Err(invalid("set the port separately, not in the base URI"));
    }
    if config.port == 0 {
        return Err(ConfigError::InvalidPort);
    }
    if config.timeout_secs == 0 {
        return Err(ConfigError::InvalidTimeout);
    }
    if config.username.trim().is_empty() {
        return Err(ConfigError::MissingField { field: "username" });
    }
    Ok(())
}

fn interpolate_config(config: &mut DagwatchConfig) -> Result<(), ConfigError> {
    let airflow = &mut config.airflow;
    for value in [
        &mut airflow.base_uri,
        &mut airflow.username,
        &mut airflow.password,
        &mut config.http_server.bind_address,
    ]
    .into_iter()
    .flatten()
    {
        *value = interpolate_string(value)?;
    }
    Ok(())
}

/// Replace every `${env:NAME}` placeholder with the variable's value.
fn interpolate_string(value: &str) -> Result<String, ConfigError> {
    let mut result = value.to_string();
    for capture in ENV_PLACEHOLDER.captures_iter(value) {
        let name = &capture[1];
        let resolved = env::var(name).map_err(|_| ConfigError::MissingEnvVar { name: name.to_string() })?;
        debug!("Interpolated env var: {} -> [REDACTED]", name);
        result = result.replace(&capture[0], &resolved);
    }
    Ok(result)
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    let Some(raw) = env_string(name) else {
        return Ok(None);
    };
    match raw.trim().parse::<T>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(ConfigError::InvalidEnvValue {
            name: name.to_string(),
            value: raw,
        }),
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
