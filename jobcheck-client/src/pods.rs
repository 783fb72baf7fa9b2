//! Pod discovery and log endpoints

use jobcheck_core::domain::workload::PodRef;
use jobcheck_core::dto::ApiStatus;
use jobcheck_core::dto::pod::PodList;

use crate::KubeProxyClient;
use crate::error::{ClientError, Result};

/// Messages the API server uses while a container has not started yet
const WAITING_MARKERS: &[&str] = &[
    "is waiting to start",
    "ContainerCreating",
    "PodInitializing",
];

fn is_waiting_message(message: &str) -> bool {
    WAITING_MARKERS.iter().any(|m| message.contains(m))
}

impl KubeProxyClient {
    // =============================================================================
    // Pods
    // =============================================================================

    /// List pods in `namespace` matching `label_selector`, oldest first
    pub async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<PodRef>> {
        let url = format!("{}/api/v1/namespaces/{}/pods", self.base_url, namespace);
        let response = self
            .client
            .get(&url)
            .query(&[("labelSelector", label_selector)])
            .send()
            .await?;

        let list: PodList = self.handle_response(response).await?;
        Ok(list.into_pod_refs(namespace))
    }

    /// Fetch the last `max_lines` lines of a pod's log as plain text
    ///
    /// Fails with `ClientError::NotReady` while the container is still
    /// being created. An empty body is returned as an empty string.
    pub async fn fetch_pod_log(&self, pod: &PodRef, max_lines: u32) -> Result<String> {
        let url = format!(
            "{}/api/v1/namespaces/{}/pods/{}/log",
            self.base_url, pod.namespace, pod.name
        );
        let response = self
            .client
            .get(&url)
            .query(&[("tailLines", max_lines)])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 400 {
            let body = response.text().await.unwrap_or_default();
            let message = ApiStatus::message_from_body(&body);
            if is_waiting_message(&message) {
                return Err(ClientError::NotReady(message));
            }
            return Err(ClientError::api_error(400, message));
        }

        let response = self.check_status(response).await?;
        response
            .text()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to read log body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobcheck_core::domain::workload::PodPhase;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pod() -> PodRef {
        PodRef {
            name: "echo-exec-1-abcde".to_string(),
            namespace: "default".to_string(),
            phase: PodPhase::Running,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_list_pods_by_selector() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/default/pods"))
            .and(query_param("labelSelector", "job-name=echo-exec-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "PodList",
                "items": [
                    {"metadata": {"name": "echo-exec-1-abcde", "namespace": "default",
                                  "creationTimestamp": "2024-01-01T00:00:00Z"},
                     "status": {"phase": "Pending"}}
                ]
            })))
            .mount(&server)
            .await;

        let client = KubeProxyClient::new(server.uri());
        let pods = client
            .list_pods("default", "job-name=echo-exec-1")
            .await
            .unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].name, "echo-exec-1-abcde");
        assert_eq!(pods[0].phase, PodPhase::Pending);
    }

    #[tokio::test]
    async fn test_list_pods_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/default/pods"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})),
            )
            .mount(&server)
            .await;

        let client = KubeProxyClient::new(server.uri());
        assert!(client.list_pods("default", "job-name=x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_pod_log_tail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/default/pods/echo-exec-1-abcde/log"))
            .and(query_param("tailLines", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_string("listening on port 8080\n"))
            .mount(&server)
            .await;

        let client = KubeProxyClient::new(server.uri());
        let log = client.fetch_pod_log(&pod(), 50).await.unwrap();
        assert_eq!(log, "listening on port 8080\n");
    }

    #[tokio::test]
    async fn test_fetch_pod_log_waiting_container_is_not_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/default/pods/echo-exec-1-abcde/log"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "kind": "Status",
                "message": "container \"echo\" in pod \"echo-exec-1-abcde\" is waiting to start: ContainerCreating",
                "reason": "BadRequest",
                "code": 400
            })))
            .mount(&server)
            .await;

        let client = KubeProxyClient::new(server.uri());
        let err = client.fetch_pod_log(&pod(), 50).await.unwrap_err();
        assert!(err.is_not_ready());
    }

    #[tokio::test]
    async fn test_fetch_pod_log_other_bad_request_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid tailLines"))
            .mount(&server)
            .await;

        let client = KubeProxyClient::new(server.uri());
        let err = client.fetch_pod_log(&pod(), 50).await.unwrap_err();
        assert!(!err.is_not_ready());
        assert!(err.is_client_error());
    }
}
