//! Jobcheck Lifecycle Client
//!
//! A small, type-safe HTTP client for the Kubernetes control plane, reached
//! through a local `kubectl proxy` that takes care of authentication.
//!
//! The [`LifecycleClient`] trait exposes the five operations the readiness
//! harness needs; [`KubeProxyClient`] implements it over HTTP.
//!
//! # Example
//!
//! ```no_run
//! use jobcheck_client::{KubeProxyClient, LifecycleClient};
//! use jobcheck_core::DescriptorBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = KubeProxyClient::new("http://127.0.0.1:8001");
//!
//!     let descriptor = DescriptorBuilder::new("echo").build()?;
//!     client.create(&descriptor).await?;
//!
//!     let pods = client
//!         .list_by_label(&descriptor.identity.namespace, &descriptor.identity.pod_selector())
//!         .await?;
//!     println!("Scheduled {} pod(s)", pods.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod lifecycle;
mod pods;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use lifecycle::LifecycleClient;

use reqwest::Client;
use serde::de::DeserializeOwned;

/// Default address of a local `kubectl proxy`
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:8001";

/// HTTP client for the Kubernetes API behind `kubectl proxy`
///
/// Methods are organized into logical groups:
/// - Job lifecycle (create, delete, status)
/// - Pod discovery and log retrieval
#[derive(Debug, Clone)]
pub struct KubeProxyClient {
    /// Base URL of the proxy (e.g., "http://127.0.0.1:8001")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl KubeProxyClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the proxy (e.g., "http://127.0.0.1:8001")
    ///
    /// # Example
    /// ```
    /// use jobcheck_client::KubeProxyClient;
    ///
    /// let client = KubeProxyClient::new("http://127.0.0.1:8001");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use jobcheck_client::KubeProxyClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(10))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = KubeProxyClient::with_client("http://127.0.0.1:8001", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the proxy
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        self.check_status(response).await?;
        Ok(())
    }

    /// Turns non-success status codes into classified errors
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::from_status(status.as_u16(), &error_text));
        }

        Ok(response)
    }
}

impl Default for KubeProxyClient {
    fn default() -> Self {
        Self::new(DEFAULT_PROXY_URL)
    }
}
