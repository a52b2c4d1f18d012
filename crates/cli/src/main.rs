use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use dagwatch_api::config::{AirflowSettings, DagwatchConfig, resolve_connection_config};
use dagwatch_api::{AirflowClient, WorkflowToolset};
use dagwatch_mcp::{McpHttpServer, serve_stdio};
use dagwatch_types::{RunStatusReport, StatusLookup};
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "dagwatch", version, about = "Check and trigger Airflow DAG runs, directly or over MCP")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

/// Connection overrides; anything unset falls back to env, config file, then defaults.
#[derive(Args)]
struct ConnectionArgs {
    /// Path to the JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Airflow webserver scheme and host, e.g. http://localhost
    #[arg(long, global = true, value_name = "URI")]
    base_uri: Option<String>,
    #[arg(long, global = true)]
    port: Option<u16>,
    #[arg(long, global = true)]
    user: Option<String>,
    /// Prefer AIRFLOW_API_PASS; command-line values are visible to other processes
    #[arg(long, global = true)]
    password: Option<String>,
    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,
}

impl ConnectionArgs {
    fn overrides(&self) -> AirflowSettings {
        AirflowSettings {
            base_uri: self.base_uri.clone(),
            port: self.port,
            username: self.user.clone(),
            password: self.password.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List DAGs with their IDs and display names
    List,
    /// Show the run status report for a DAG
    Status {
        dag_id: String,
        /// Print the raw DAG metadata and latest run instead of the report
        #[arg(long)]
        raw: bool,
    },
    /// Trigger a new run for a DAG
    Trigger {
        dag_id: String,
        /// Fetch and print the refreshed status after triggering
        #[arg(long)]
        follow: bool,
    },
    /// Print the JSON Schema of the run status report
    Schema,
    /// Serve the toolset over MCP (stdio unless --http is given)
    Mcp {
        /// Serve streamable HTTP on a loopback address instead of stdio
        #[arg(long)]
        http: bool,
        /// Bind address for --http (defaults to the config file value)
        #[arg(long, value_name = "ADDR", requires = "http")]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Schema => print_json(&RunStatusReport::json_schema()?),
        Command::List => {
            let (client, _) = connect(&cli.connection)?;
            print_json(&client.list_dags().await?)
        }
        Command::Status { dag_id, raw } => {
            let (client, _) = connect(&cli.connection)?;
            print_status(&client, &dag_id, raw).await
        }
        Command::Trigger { dag_id, follow } => {
            let (client, _) = connect(&cli.connection)?;
            let outcome = client.trigger_dag(&dag_id).await?;
            if !outcome.is_triggered() {
                bail!("{outcome}");
            }
            println!("{outcome}");
            if follow {
                print_status(&client, &dag_id, false).await?;
            }
            Ok(())
        }
        Command::Mcp { http, bind } => {
            let (client, file_config) = connect(&cli.connection)?;
            let toolset: Arc<dyn WorkflowToolset> = Arc::new(client);
            if !http {
                return serve_stdio(toolset).await;
            }
            let bind_address = file_config.http_server.resolve_bind_address(bind.as_deref())?;
            let running = McpHttpServer::new(bind_address, toolset).start().await?;
            eprintln!("MCP server listening on http://{}/mcp", running.bound_address());
            tokio::signal::ctrl_c().await.context("wait for Ctrl-C")?;
            info!("shutting down MCP HTTP server");
            running.stop().await
        }
    }
}

/// Resolve the layered connection settings and build a client for them.
fn connect(args: &ConnectionArgs) -> Result<(AirflowClient, DagwatchConfig)> {
    let (connection, file_config) =
        resolve_connection_config(args.config.as_deref(), args.overrides()).context("resolve Airflow connection")?;
    let client = AirflowClient::new(connection).context("build Airflow client")?;
    Ok((client, file_config))
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    // stdout carries command output and the MCP stdio transport
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn print_status(client: &AirflowClient, dag_id: &str, raw: bool) -> Result<()> {
    match client.get_dag_status(dag_id).await? {
        StatusLookup::Found(snapshot) if raw => print_json(&snapshot),
        StatusLookup::Found(snapshot) => print_json(&RunStatusReport::from_snapshot(&snapshot)?),
        not_found @ StatusLookup::NotFound { .. } => bail!("{}", not_found.tool_text()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_connection_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["dagwatch", "status", "daily_payment_report", "--port", "9090", "--raw"])
            .expect("arguments should parse");
        assert_eq!(cli.connection.port, Some(9090));
        assert!(matches!(cli.command, Command::Status { ref dag_id, raw: true } if dag_id == "daily_payment_report"));
    }

    #[test]
    fn bind_requires_http() {
        assert!(Cli::try_parse_from(["dagwatch", "mcp", "--bind", "127.0.0.1:9000"]).is_err());
        assert!(Cli::try_parse_from(["dagwatch", "mcp", "--http", "--bind", "127.0.0.1:9000"]).is_ok());
    }

    #[test]
    fn connect_applies_flag_overrides() {
        let cli = Cli::try_parse_from([
            "dagwatch",
            "--config",
            "/no/such/dagwatch.json",
            "--base-uri",
            "http://airflow.internal",
            "--port",
            "9090",
            "--user",
            "ops",
            "--password",
            "secret",
            "list",
        ])
        .expect("arguments should parse");

        let (client, file_config) = connect(&cli.connection).expect("connection should resolve");

        assert_eq!(client.api_root().as_str(), "http://airflow.internal:9090/api/v1");
        assert_eq!(client.config().username, "ops");
        assert_eq!(file_config, DagwatchConfig::default());
    }

    #[test]
    fn connect_rejects_zero_timeout() {
        let cli = Cli::try_parse_from(["dagwatch", "--config", "/no/such/dagwatch.json", "--timeout-secs", "0", "list"])
            .expect("arguments should parse");
        assert!(connect(&cli.connection).is_err());
    }

    #[test]
    fn overrides_leave_unset_flags_empty() {
        let cli = Cli::try_parse_from(["dagwatch", "--user", "ops", "list"]).expect("arguments should parse");
        let overrides = cli.connection.overrides();
        assert_eq!(overrides.username.as_deref(), Some("ops"));
        assert_eq!(overrides.base_uri, None);
        assert_eq!(overrides.password, None);
    }
}
