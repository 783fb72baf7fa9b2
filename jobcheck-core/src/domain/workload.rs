//! Workload domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label key the control plane puts on every pod it creates for a job
pub const JOB_NAME_LABEL: &str = "job-name";

/// Label key identifying which function a workload belongs to
pub const APP_LABEL: &str = "app";

/// Identity of one ephemeral workload
///
/// Generated once per verification run and never reused. At most one live
/// workload exists per identity at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadIdentity {
    pub name: String,
    pub namespace: String,
}

impl WorkloadIdentity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Label selector matching the pods created for this workload
    pub fn pod_selector(&self) -> String {
        format!("{}={}", JOB_NAME_LABEL, self.name)
    }
}

impl fmt::Display for WorkloadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Pod restart policy
///
/// Only `Never` is supported: retries belong to the poller, not the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RestartPolicy {
    #[default]
    Never,
}

impl RestartPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Never => "Never",
        }
    }
}

/// Image pull policy for the workload container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImagePullPolicy {
    Always,
    #[default]
    IfNotPresent,
    Never,
}

impl ImagePullPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "Always",
            Self::IfNotPresent => "IfNotPresent",
            Self::Never => "Never",
        }
    }
}

/// Declarative definition of an ephemeral one-shot workload
///
/// `backoff_limit == 0` together with `RestartPolicy::Never` means the
/// backend runs the workload at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadDescriptor {
    pub identity: WorkloadIdentity,
    pub labels: BTreeMap<String, String>,
    pub container_name: String,
    pub container_image: String,
    pub image_pull_policy: ImagePullPolicy,
    pub command: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub restart_policy: RestartPolicy,
    pub backoff_limit: i32,
}

/// Lifecycle phase reported for a pod
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[default]
    Unknown,
}

impl PodPhase {
    /// Parses the phase string used by the control plane
    pub fn parse(phase: &str) -> Self {
        match phase {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

/// Reference to a pod scheduled for a workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodRef {
    pub name: String,
    pub namespace: String,
    pub phase: PodPhase,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Execution counters reported by the backend for a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkloadStatus {
    pub active: u32,
    pub succeeded: u32,
    pub failed: u32,
}

impl WorkloadStatus {
    /// Whether the backend reports the workload as failed
    pub fn has_failed(&self) -> bool {
        self.failed > 0
    }
}
