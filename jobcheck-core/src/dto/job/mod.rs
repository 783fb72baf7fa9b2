//! Job DTOs for the `batch/v1` API group

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::workload::{JOB_NAME_LABEL, WorkloadDescriptor, WorkloadStatus};

/// Object metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

/// `batch/v1 Job` as submitted and as read back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<JobSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

/// Status-only view of a `Job`; `.spec` is not read
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatusView {
    #[serde(default)]
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    pub backoff_limit: i32,
    pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    pub restart_policy: String,
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    pub image_pull_policy: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Job execution counters; absent fields mean zero
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub active: Option<u32>,
    #[serde(default)]
    pub succeeded: Option<u32>,
    #[serde(default)]
    pub failed: Option<u32>,
}

impl From<&JobStatus> for WorkloadStatus {
    fn from(status: &JobStatus) -> Self {
        Self {
            active: status.active.unwrap_or(0),
            succeeded: status.succeeded.unwrap_or(0),
            failed: status.failed.unwrap_or(0),
        }
    }
}

impl From<&WorkloadDescriptor> for Job {
    fn from(descriptor: &WorkloadDescriptor) -> Self {
        let identity = &descriptor.identity;

        let mut template_labels = BTreeMap::new();
        template_labels.insert(JOB_NAME_LABEL.to_string(), identity.name.clone());

        let env = descriptor
            .env
            .iter()
            .map(|(name, value)| EnvVar {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();

        Self {
            api_version: "batch/v1".to_string(),
            kind: "Job".to_string(),
            metadata: ObjectMeta {
                name: Some(identity.name.clone()),
                namespace: Some(identity.namespace.clone()),
                labels: descriptor.labels.clone(),
                creation_timestamp: None,
            },
            spec: Some(JobSpec {
                backoff_limit: descriptor.backoff_limit,
                template: PodTemplateSpec {
                    metadata: ObjectMeta {
                        labels: template_labels,
                        ..Default::default()
                    },
                    spec: PodSpec {
                        restart_policy: descriptor.restart_policy.as_str().to_string(),
                        containers: vec![Container {
                            name: descriptor.container_name.clone(),
                            image: descriptor.container_image.clone(),
                            image_pull_policy: descriptor.image_pull_policy.as_str().to_string(),
                            command: descriptor.command.clone(),
                            env,
                        }],
                    },
                },
            }),
            status: None,
        }
    }
}
