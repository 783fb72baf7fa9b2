//! Cleanup coordinator
//!
//! Removes the ephemeral workload before creation (to clear leftovers of an
//! aborted run) and after polling ends, whatever the outcome. Cleanup never
//! fails the run: problems are logged and reported as [`Removal::Failed`].

use jobcheck_client::LifecycleClient;
use jobcheck_core::domain::workload::WorkloadIdentity;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a removal request achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The workload existed and a cascading delete was accepted
    Deleted,
    /// Nothing to remove
    AlreadyGone,
    /// The backend rejected or did not answer the delete; logged only
    Failed,
}

/// Issues idempotent, cascading removals of workloads
#[derive(Clone)]
pub struct CleanupCoordinator {
    client: Arc<dyn LifecycleClient>,
}

impl CleanupCoordinator {
    pub fn new(client: Arc<dyn LifecycleClient>) -> Self {
        Self { client }
    }

    /// Ensures the workload with `identity` is gone or being removed
    pub async fn ensure_removed(&self, identity: &WorkloadIdentity) -> Removal {
        match self.client.delete(identity).await {
            Ok(()) => {
                info!("Deleted workload {}", identity);
                Removal::Deleted
            }
            Err(e) if e.is_not_found() => {
                debug!("Workload {} already gone", identity);
                Removal::AlreadyGone
            }
            Err(e) => {
                warn!("Failed to delete workload {}: {}", identity, e);
                Removal::Failed
            }
        }
    }
}
