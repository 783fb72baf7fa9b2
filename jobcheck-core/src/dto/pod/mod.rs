//! Pod DTOs for the core `v1` API group

use serde::{Deserialize, Serialize};

use crate::domain::workload::{PodPhase, PodRef};
use crate::dto::job::ObjectMeta;

/// Response of a pod list call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodList {
    #[serde(default)]
    pub items: Vec<Pod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pod {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: Option<PodStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodStatus {
    #[serde(default)]
    pub phase: Option<String>,
}

impl PodList {
    /// Converts the listed pods into references, oldest first
    ///
    /// Pods without a name are skipped. Ties on creation time are broken by
    /// name so the first element is stable across calls.
    pub fn into_pod_refs(self, namespace: &str) -> Vec<PodRef> {
        let mut pods: Vec<PodRef> = self
            .items
            .into_iter()
            .filter_map(|pod| {
                let name = pod.metadata.name?;
                let phase = pod
                    .status
                    .and_then(|s| s.phase)
                    .map(|p| PodPhase::parse(&p))
                    .unwrap_or_default();
                Some(PodRef {
                    name,
                    namespace: pod
                        .metadata
                        .namespace
                        .unwrap_or_else(|| namespace.to_string()),
                    phase,
                    created_at: pod.metadata.creation_timestamp,
                })
            })
            .collect();

        pods.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        pods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pods_ordered_by_creation() {
        let list: PodList = serde_json::from_str(
            r#"{
                "items": [
                    {"metadata": {"name": "echo-b", "creationTimestamp": "2024-01-01T00:00:05Z"},
                     "status": {"phase": "Running"}},
                    {"metadata": {"name": "echo-a", "creationTimestamp": "2024-01-01T00:00:01Z"},
                     "status": {"phase": "Pending"}},
                    {"metadata": {}}
                ]
            }"#,
        )
        .unwrap();

        let pods = list.into_pod_refs("default");
        assert_eq!(pods.len(), 2);
        assert_eq!(pods[0].name, "echo-a");
        assert_eq!(pods[0].phase, PodPhase::Pending);
        assert_eq!(pods[0].namespace, "default");
        assert_eq!(pods[1].name, "echo-b");
    }

    #[test]
    fn test_empty_list() {
        let list: PodList = serde_json::from_str(r#"{"kind": "PodList"}"#).unwrap();
        assert!(list.into_pod_refs("default").is_empty());
    }
}
