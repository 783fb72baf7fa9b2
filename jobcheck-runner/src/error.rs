//! Error types for the harness

use jobcheck_client::ClientError;
use jobcheck_core::DescriptorError;
use jobcheck_core::domain::poll::Outcome;
use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DatabaseError;
use crate::proxy::ProxyError;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that end a verification run
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid workload descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The workload could not be submitted; never retried
    #[error("failed to create workload {identity}: {source}")]
    Create {
        identity: String,
        #[source]
        source: ClientError,
    },

    #[error("kubectl proxy error: {0}")]
    Proxy(#[from] ProxyError),

    #[error("database check failed: {0}")]
    Database(#[from] DatabaseError),

    /// The workload reached a terminal outcome other than success
    #[error("service failed to start or log listening ({outcome}). Logs: {logs}")]
    NotReady { outcome: Outcome, logs: String },
}
