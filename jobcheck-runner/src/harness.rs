//! Verification suite
//!
//! Sequences one verification run:
//! 1. Acquire the kubectl proxy (if enabled)
//! 2. Deploy the function workload and poll it until ready
//! 3. Check database liveness (if enabled)
//! 4. Release the proxy, whatever happened before

use jobcheck_client::{KubeProxyClient, LifecycleClient};
use jobcheck_core::domain::poll::PollResult;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::HarnessConfig;
use crate::db;
use crate::error::{HarnessError, Result};
use crate::proxy::KubectlProxy;
use crate::scheduler::ReadinessPoller;

/// Result of the database liveness check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DatabaseCheck {
    Passed,
    Failed(String),
    Skipped,
}

/// Outcome of every check in one run
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub workload: PollResult,
    pub database: DatabaseCheck,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.workload.is_success() && !matches!(self.database, DatabaseCheck::Failed(_))
    }
}

/// Turns a non-successful poll into an error carrying the captured logs
pub fn ensure_succeeded(result: PollResult) -> Result<PollResult> {
    if result.is_success() {
        return Ok(result);
    }
    Err(HarnessError::NotReady {
        outcome: result.outcome,
        logs: result.captured_log,
    })
}

/// Deploys the configured function and waits for it to be ready
pub async fn verify_workload(
    client: Arc<dyn LifecycleClient>,
    config: &HarnessConfig,
) -> Result<PollResult> {
    let descriptor = config.descriptor_builder().build()?;
    info!("Orchestrating job {}", descriptor.identity);

    ReadinessPoller::new(client, config.poll.clone())
        .run(&descriptor)
        .await
}

/// One verification run
pub struct Suite {
    config: HarnessConfig,
}

impl Suite {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Runs every check against the real control plane
    pub async fn run(&self) -> Result<SuiteReport> {
        self.config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(self.config.request_timeout)
            .build()?;
        let client: Arc<dyn LifecycleClient> = Arc::new(KubeProxyClient::with_client(
            self.config.proxy.base_url(),
            http_client,
        ));

        let proxy = if self.config.proxy.enabled {
            Some(KubectlProxy::spawn(&self.config.proxy).await?)
        } else {
            info!("Using existing proxy at {}", self.config.proxy.base_url());
            None
        };

        let report = self.run_checks(client).await;

        if let Some(proxy) = proxy {
            proxy.shutdown().await;
        }

        report
    }

    /// Runs the checks with an already reachable lifecycle client
    pub async fn run_checks(&self, client: Arc<dyn LifecycleClient>) -> Result<SuiteReport> {
        let workload = verify_workload(client, &self.config).await?;

        let database = if self.config.check_database {
            self.check_database().await
        } else {
            DatabaseCheck::Skipped
        };

        Ok(SuiteReport { workload, database })
    }

    async fn check_database(&self) -> DatabaseCheck {
        match db::probe(&self.config.database).await {
            Ok(()) => {
                info!("Database at {} is live", self.config.database.host);
                DatabaseCheck::Passed
            }
            Err(e) => {
                error!("Database check failed: {}", e);
                DatabaseCheck::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, PollConfig};
    use crate::testing::{Call, ScriptedClient};
    use jobcheck_core::domain::poll::Outcome;

    fn config() -> HarnessConfig {
        let database = DatabaseConfig::from_lookup("echo", |_| None).unwrap();
        let mut config = HarnessConfig::new("echo", database).with_poll(PollConfig {
            max_attempts: 5,
            ..PollConfig::default()
        });
        config.check_database = false;
        config
    }

    #[test]
    fn test_ensure_succeeded_attaches_logs() {
        let result = PollResult {
            outcome: Outcome::TimedOut,
            captured_log: "npm ERR! missing script".to_string(),
            attempts: 30,
            pod_name: None,
        };

        let err = ensure_succeeded(result).unwrap_err();
        assert_eq!(
            err.to_string(),
            "service failed to start or log listening (timed out). Logs: npm ERR! missing script"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_checks_reports_ready_workload() {
        let client = Arc::new(
            ScriptedClient::new()
                .with_pod("echo-pod")
                .with_default_log("listening on port 8080"),
        );
        let suite = Suite::new(config());

        let report = suite.run_checks(client.clone()).await.unwrap();

        assert!(report.passed());
        assert_eq!(report.database, DatabaseCheck::Skipped);
        assert!(matches!(client.calls().last(), Some(Call::Delete(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_checks_reports_timeout() {
        let client = Arc::new(ScriptedClient::new().with_pod("echo-pod").with_default_log("booting"));
        let suite = Suite::new(config());

        let report = suite.run_checks(client).await.unwrap();

        assert!(!report.passed());
        assert_eq!(report.workload.outcome, Outcome::TimedOut);
        assert_eq!(report.workload.captured_log, "booting");
    }

    #[test]
    fn test_failed_database_fails_report() {
        let report = SuiteReport {
            workload: PollResult {
                outcome: Outcome::Succeeded,
                captured_log: "listening on port 8080".to_string(),
                attempts: 1,
                pod_name: Some("echo-pod".to_string()),
            },
            database: DatabaseCheck::Failed("connection refused".to_string()),
        };
        assert!(!report.passed());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["workload"]["outcome"], "Succeeded");
        assert_eq!(json["database"]["Failed"], "connection refused");
    }
}
