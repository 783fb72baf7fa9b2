//! Job-related API endpoints

use jobcheck_core::domain::workload::{WorkloadDescriptor, WorkloadIdentity, WorkloadStatus};
use jobcheck_core::dto::job::{Job, JobStatusView};
use tracing::debug;

use crate::KubeProxyClient;
use crate::error::Result;

impl KubeProxyClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    fn jobs_url(&self, namespace: &str) -> String {
        format!("{}/apis/batch/v1/namespaces/{}/jobs", self.base_url, namespace)
    }

    /// Submit the job manifest built from `descriptor`
    ///
    /// Fails with `ClientError::Conflict` if a job with the same identity
    /// already exists. Never retried here.
    pub async fn create_job(&self, descriptor: &WorkloadDescriptor) -> Result<()> {
        let url = self.jobs_url(&descriptor.identity.namespace);
        let manifest = Job::from(descriptor);

        debug!("Creating job {}", descriptor.identity);
        let response = self.client.post(&url).json(&manifest).send().await?;

        self.handle_empty_response(response).await
    }

    /// Delete a job and, in the background, the pods it owns
    ///
    /// Fails with `ClientError::NotFound` if the job does not exist.
    pub async fn delete_job(&self, identity: &WorkloadIdentity) -> Result<()> {
        let url = format!("{}/{}", self.jobs_url(&identity.namespace), identity.name);

        debug!("Deleting job {}", identity);
        let response = self
            .client
            .delete(&url)
            .query(&[("propagationPolicy", "Background")])
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Read the execution counters of a job
    pub async fn get_job_status(&self, identity: &WorkloadIdentity) -> Result<WorkloadStatus> {
        let url = format!("{}/{}", self.jobs_url(&identity.namespace), identity.name);
        let response = self.client.get(&url).send().await?;

        let job: JobStatusView = self.handle_response(response).await?;
        Ok(job
            .status
            .as_ref()
            .map(WorkloadStatus::from)
            .unwrap_or_default())
    }
}
