//! Readiness poller
//!
//! Drives one workload through an explicit state machine:
//!
//! ```text
//! Start -> LookingForPod -> TailingLogs -> Succeeded | Failed | TimedOut
//! ```
//!
//! Every backend error inside the loop is classified locally: a container
//! that is not ready yet just means "no new data", anything else is logged
//! as transient and retried on the next tick. Only the terminal outcome
//! leaves the loop. The workload is removed on every exit path.

use jobcheck_client::LifecycleClient;
use jobcheck_core::domain::poll::{Outcome, PollResult};
use jobcheck_core::domain::workload::{PodRef, WorkloadDescriptor, WorkloadIdentity};
use std::sync::Arc;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::cleanup::CleanupCoordinator;
use crate::config::PollConfig;
use crate::error::{HarnessError, Result};
use crate::scheduler::state::PollState;

/// Position of the poll loop in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Start,
    LookingForPod,
    TailingLogs(PodRef),
    Succeeded,
    Failed,
    TimedOut,
}

impl Phase {
    fn outcome(&self) -> Option<Outcome> {
        match self {
            Self::Succeeded => Some(Outcome::Succeeded),
            Self::Failed => Some(Outcome::Failed),
            Self::TimedOut => Some(Outcome::TimedOut),
            Self::Start | Self::LookingForPod | Self::TailingLogs(_) => None,
        }
    }
}

/// Polls one workload until its logs show the success marker
pub struct ReadinessPoller {
    client: Arc<dyn LifecycleClient>,
    cleanup: CleanupCoordinator,
    config: PollConfig,
}

impl ReadinessPoller {
    /// Creates a new poller
    pub fn new(client: Arc<dyn LifecycleClient>, config: PollConfig) -> Self {
        let cleanup = CleanupCoordinator::new(Arc::clone(&client));
        Self {
            client,
            cleanup,
            config,
        }
    }

    /// Creates the workload, polls it to a terminal outcome and removes it
    ///
    /// Returns an error only if the workload could not be created. The
    /// final removal runs whether polling succeeded, failed, timed out or
    /// never started.
    pub async fn run(&self, descriptor: &WorkloadDescriptor) -> Result<PollResult> {
        let identity = &descriptor.identity;

        let result = self.drive(descriptor).await;

        match &result {
            Ok(poll) => info!(
                "Workload {} {} after {} attempt(s)",
                identity, poll.outcome, poll.attempts
            ),
            Err(e) => error!("Workload {} did not start: {}", identity, e),
        }

        self.cleanup.ensure_removed(identity).await;

        result
    }

    async fn drive(&self, descriptor: &WorkloadDescriptor) -> Result<PollResult> {
        let mut state = PollState::new();
        let mut phase = Phase::Start;

        loop {
            if let Some(outcome) = phase.outcome() {
                return Ok(state.finish(outcome));
            }

            phase = match phase {
                Phase::Start => {
                    self.start(descriptor).await?;
                    Phase::LookingForPod
                }
                active => self.tick(&descriptor.identity, active, &mut state).await,
            };
        }
    }

    /// Clears leftovers with the same identity, then creates the workload
    async fn start(&self, descriptor: &WorkloadDescriptor) -> Result<()> {
        let identity = &descriptor.identity;

        self.cleanup.ensure_removed(identity).await;

        self.client
            .create(descriptor)
            .await
            .map_err(|source| HarnessError::Create {
                identity: identity.to_string(),
                source,
            })?;

        info!(
            "Created workload {}, waiting up to {} attempt(s) for it to be ready",
            identity, self.config.max_attempts
        );
        Ok(())
    }

    /// Runs one poll tick and returns the next phase
    ///
    /// Order within a tick: pod lookup, log check, status check, budget
    /// check. A marker seen on the last permitted tick therefore wins over
    /// the timeout.
    async fn tick(&self, identity: &WorkloadIdentity, phase: Phase, state: &mut PollState) -> Phase {
        state.elapsed_attempts += 1;

        let mut phase = phase;

        if phase == Phase::LookingForPod {
            phase = self.look_for_pod(identity, state).await;
        }

        if let Phase::TailingLogs(pod) = &phase {
            if self.tail_logs(pod, state).await {
                return Phase::Succeeded;
            }
        }

        if self.config.watch_status && self.workload_failed(identity).await {
            return Phase::Failed;
        }

        if state.elapsed_attempts >= self.config.max_attempts {
            warn!(
                "Workload {} not ready after {} attempt(s)",
                identity, state.elapsed_attempts
            );
            return Phase::TimedOut;
        }

        time::sleep(self.config.poll_interval).await;
        phase
    }

    async fn look_for_pod(&self, identity: &WorkloadIdentity, state: &mut PollState) -> Phase {
        let selector = identity.pod_selector();

        match self.client.list_by_label(&identity.namespace, &selector).await {
            Ok(pods) => match pods.into_iter().next() {
                Some(pod) => {
                    info!("Found pod {} for workload {}", pod.name, identity);
                    state.pod_name = Some(pod.name.clone());
                    Phase::TailingLogs(pod)
                }
                None => {
                    debug!(
                        "No pod scheduled for {} yet (attempt {}/{})",
                        identity, state.elapsed_attempts, self.config.max_attempts
                    );
                    Phase::LookingForPod
                }
            },
            Err(e) => {
                warn!(
                    "Failed to list pods for {} (attempt {}/{}): {}",
                    identity, state.elapsed_attempts, self.config.max_attempts, e
                );
                Phase::LookingForPod
            }
        }
    }

    /// Returns true once the fetched tail contains the success marker
    async fn tail_logs(&self, pod: &PodRef, state: &mut PollState) -> bool {
        match self.client.fetch_log_tail(pod, self.config.tail_lines).await {
            Ok(tail) => {
                if tail.contains(&self.config.success_marker) {
                    info!("Pod {} is listening", pod.name);
                    state.last_log_tail = tail;
                    return true;
                }
                state.record_tail(tail);
                false
            }
            Err(e) if e.is_not_ready() => {
                debug!("Pod {} has no logs yet: {}", pod.name, e);
                false
            }
            Err(e) => {
                warn!(
                    "Log fetch for pod {} failed (attempt {}/{}): {}",
                    pod.name, state.elapsed_attempts, self.config.max_attempts, e
                );
                false
            }
        }
    }

    async fn workload_failed(&self, identity: &WorkloadIdentity) -> bool {
        match self.client.workload_status(identity).await {
            Ok(status) if status.has_failed() => {
                warn!(
                    "Backend reports workload {} as failed ({} failed pod(s))",
                    identity, status.failed
                );
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!("Failed to read status of workload {}: {}", identity, e);
                false
            }
        }
    }
}
