//! Lifecycle client abstraction
//!
//! The readiness harness depends only on this trait, so tests can drive it
//! with scripted in-memory backends instead of a real control plane.

use async_trait::async_trait;
use jobcheck_core::domain::workload::{
    PodRef, WorkloadDescriptor, WorkloadIdentity, WorkloadStatus,
};

use crate::KubeProxyClient;
use crate::error::Result;

/// Operations the harness performs against the orchestration backend
#[async_trait]
pub trait LifecycleClient: Send + Sync {
    /// Creates the workload
    ///
    /// Fails with `ClientError::Conflict` if the identity is already taken;
    /// the caller must clean up first.
    async fn create(&self, descriptor: &WorkloadDescriptor) -> Result<()>;

    /// Lists pods matching a label selector, oldest first
    ///
    /// An empty list means nothing has been scheduled yet.
    async fn list_by_label(&self, namespace: &str, label_selector: &str) -> Result<Vec<PodRef>>;

    /// Fetches the last `max_lines` lines of a pod's log
    ///
    /// Fails with `ClientError::NotReady` while the container has not started.
    async fn fetch_log_tail(&self, pod: &PodRef, max_lines: u32) -> Result<String>;

    /// Deletes the workload with cascading removal of its pods
    ///
    /// Fails with `ClientError::NotFound` if it is already gone.
    async fn delete(&self, identity: &WorkloadIdentity) -> Result<()>;

    /// Reads the backend's execution counters for the workload
    async fn workload_status(&self, identity: &WorkloadIdentity) -> Result<WorkloadStatus>;
}

#[async_trait]
impl LifecycleClient for KubeProxyClient {
    async fn create(&self, descriptor: &WorkloadDescriptor) -> Result<()> {
        self.create_job(descriptor).await
    }

    async fn list_by_label(&self, namespace: &str, label_selector: &str) -> Result<Vec<PodRef>> {
        self.list_pods(namespace, label_selector).await
    }

    async fn fetch_log_tail(&self, pod: &PodRef, max_lines: u32) -> Result<String> {
        self.fetch_pod_log(pod, max_lines).await
    }

    async fn delete(&self, identity: &WorkloadIdentity) -> Result<()> {
        self.delete_job(identity).await
    }

    async fn workload_status(&self, identity: &WorkloadIdentity) -> Result<WorkloadStatus> {
        self.get_job_status(identity).await
    }
}
