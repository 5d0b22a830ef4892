//! Invoke one data source from the command line and print the result as JSON.
//!
//! Milestones go to stderr as they arrive; the result goes to stdout. The
//! exit status is non-zero whenever the result carries a failure.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use datasource_client::logging::{init_tracing, LogFormat};
use datasource_client::{
    build_connector, build_soap_connector, ClientConfig, DataSource, DataSourceCallback,
    DynamicShape, WebServiceCall,
};
use datasource_core::{
    Credentials, DataSourceKey, DataSourceResult, Environment, Failure, GenericRow, Progress,
    Value, WireFormat,
};
use serde::Serialize;
use serde_json::json;

/// Data source command-line client
#[derive(Parser, Debug)]
#[command(name = "datasource-cli")]
#[command(version)]
#[command(about = "Execute a data source and print its result as JSON", long_about = None)]
struct Cli {
    /// Customer server name (the subdomain of the API host)
    #[arg(short = 's', long = "server", default_value = "")]
    server: String,

    /// Target the test tier instead of production
    #[arg(long = "test")]
    test: bool,

    /// API user name
    #[arg(short = 'u', long = "user", env = "DATASOURCE_USER")]
    user: String,

    /// API password
    #[arg(short = 'p', long = "password", env = "DATASOURCE_PASSWORD", hide_env_values = true)]
    password: String,

    /// Data source key to execute
    #[arg(short = 'k', long = "key")]
    key: u32,

    /// Input parameter as NAME=VALUE; repeatable
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, Value)>,

    /// JSON request generation: named or tabular
    #[arg(long = "wire", default_value = "named")]
    wire: WireFormat,

    /// Use the legacy web-service endpoint
    #[arg(long = "soap", conflicts_with = "wire")]
    soap: bool,

    /// Invocation timeout in milliseconds (0 disables it)
    #[arg(long = "timeout-ms", default_value = "30000")]
    timeout_ms: u64,

    /// Override the JSON endpoint base, e.g. http://localhost:8080
    #[arg(long = "base-url")]
    base_url: Option<String>,

    /// Log format: compact or json
    #[arg(long = "log-format", default_value = "compact")]
    log_format: LogFormat,

    /// Base log level; RUST_LOG takes precedence
    #[arg(long = "log-level", default_value = "warn")]
    log_level: String,
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("parameter name missing in '{raw}'"));
    }
    Ok((name.to_string(), Value::parse_literal(value)))
}

/// Echoes milestones to stderr and keeps the result.
struct Printer<O> {
    result: Option<DataSourceResult<O, GenericRow>>,
}

impl<O> DataSourceCallback<O, GenericRow> for Printer<O> {
    fn on_progress(&mut self, milestone: Progress) {
        eprintln!("[{milestone}]");
    }

    fn on_complete(&mut self, result: DataSourceResult<O, GenericRow>) {
        self.result = Some(result);
    }
}

fn render<O: Serialize>(result: &DataSourceResult<O, GenericRow>) -> serde_json::Value {
    match result {
        DataSourceResult::Success(success) => json!({
            "transactionNo": success.transaction_no,
            "outputs": success.outputs,
            "table": success.table,
        }),
        DataSourceResult::Failure(failure) => {
            let mut view = json!({
                "error": failure.to_string(),
                "status": failure.status(),
            });
            if let Failure::Server { errors, .. } = failure {
                view["errors"] = json!(errors);
            }
            view
        }
    }
}

fn config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig {
        environment: Environment::from_test_flag(cli.test),
        wire_format: cli.wire,
        request_timeout: (cli.timeout_ms > 0).then(|| Duration::from_millis(cli.timeout_ms)),
        ..ClientConfig::new(cli.server.clone())
    };
    if let Some(base) = &cli.base_url {
        config = config.with_base_url(base);
    }
    // The web-service endpoint is fixed; the server name only shapes JSON URLs.
    if !cli.soap {
        config.validate()?;
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = Arc::new(config(&cli)?);
    let credentials = Arc::new(Credentials::new(cli.user, cli.password));
    let key = DataSourceKey(cli.key);

    let view = if cli.soap {
        let connector = build_soap_connector(&config).context("building web-service connector")?;
        let mut call = WebServiceCall::new(key, credentials, config, connector);
        for (name, value) in cli.params {
            call.add_input_parameter(name, value);
        }
        let printer = call.execute()?.deliver(Printer { result: None }).await;
        printer.result.map(|r| (render(&r), r.is_error()))
    } else {
        let connector = build_connector(&config).context("building connector")?;
        let inputs = cli.params.into_iter().collect();
        let mut ds = DataSource::new(DynamicShape::new(key), credentials, config, connector)
            .with_inputs(inputs);
        let printer = ds.execute()?.deliver(Printer { result: None }).await;
        printer.result.map(|r| (render(&r), r.is_error()))
    };

    let (view, failed) = view.context("invocation finished without a result")?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(!failed)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.log_format, &cli.log_level) {
        eprintln!("warning: {e:#}");
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
