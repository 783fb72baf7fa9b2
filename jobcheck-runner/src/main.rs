//! Jobcheck
//!
//! Deploys a function as a one-shot job, waits for it to report that it is
//! listening, checks database liveness and removes the job again. Exits
//! non-zero if any check fails.

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobcheck_core::descriptor::{DEFAULT_IMAGE, DEFAULT_NAMESPACE};
use jobcheck_runner::config::DEFAULT_PROXY_PORT;
use jobcheck_runner::{
    DatabaseCheck, DatabaseConfig, HarnessConfig, PollConfig, ProxyConfig, Suite,
    ensure_succeeded,
};

#[derive(Parser)]
#[command(name = "jobcheck")]
#[command(about = "Verify that a function workload boots on the cluster", long_about = None)]
struct Cli {
    /// Function under test (base of the job name)
    #[arg(long, env = "FUNCTION_NAME")]
    function_name: String,

    /// Namespace to run the job in
    #[arg(long, env = "JOBCHECK_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Container image hosting the function runtime
    #[arg(long, default_value = DEFAULT_IMAGE)]
    image: String,

    /// Local port of kubectl proxy
    #[arg(long, env = "JOBCHECK_PROXY_PORT", default_value_t = DEFAULT_PROXY_PORT)]
    proxy_port: u16,

    /// Maximum number of poll ticks
    #[arg(long, default_value_t = 30)]
    max_attempts: u32,

    /// Seconds between poll ticks
    #[arg(long, default_value_t = 2)]
    poll_interval_secs: u64,

    /// Log lines fetched per tick
    #[arg(long, default_value_t = 50)]
    tail_lines: u32,

    /// Stop early when the job is reported as failed
    #[arg(long)]
    watch_status: bool,

    /// Use an already running proxy instead of spawning one
    #[arg(long)]
    no_proxy: bool,

    /// Skip the database liveness check
    #[arg(long)]
    skip_database: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobcheck_runner=info,jobcheck_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = build_config(&cli)?;
    info!(
        "Verifying function {} in namespace {} (budget: {} x {:?})",
        config.function_name, config.namespace, config.poll.max_attempts, config.poll.poll_interval
    );

    let report = Suite::new(config)
        .run()
        .await
        .context("Verification run failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if let DatabaseCheck::Failed(reason) = &report.database {
        error!("Database check failed: {}", reason);
    }

    let workload = ensure_succeeded(report.workload.clone())?;
    info!(
        "Function {} is listening (pod {}, {} attempt(s))",
        cli.function_name,
        workload.pod_name.as_deref().unwrap_or("unknown"),
        workload.attempts
    );

    if !report.passed() {
        anyhow::bail!("Database check failed");
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<HarnessConfig> {
    let database = DatabaseConfig::from_env(&cli.function_name)
        .context("Failed to load database configuration")?;

    let poll = PollConfig {
        max_attempts: cli.max_attempts,
        poll_interval: Duration::from_secs(cli.poll_interval_secs),
        tail_lines: cli.tail_lines,
        watch_status: cli.watch_status,
        ..PollConfig::default()
    };

    let proxy = ProxyConfig {
        enabled: !cli.no_proxy,
        port: cli.proxy_port,
        ..ProxyConfig::default()
    };

    let mut config = HarnessConfig::new(cli.function_name.clone(), database)
        .with_namespace(cli.namespace.clone())
        .with_image(cli.image.clone())
        .with_poll(poll)
        .with_proxy(proxy);
    config.check_database = !cli.skip_database;

    config.validate()?;
    Ok(config)
}
