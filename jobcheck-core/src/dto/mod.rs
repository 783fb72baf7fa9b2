//! Data Transfer Objects
//!
//! Wire representations of the Kubernetes objects the lifecycle client sends
//! and receives. Only the fields this workspace reads or writes are modeled.

pub mod job;
pub mod pod;

use serde::{Deserialize, Serialize};

/// `Status` object returned by the control plane alongside error codes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub code: Option<u16>,
}

impl ApiStatus {
    /// Extracts the human readable message from an error body
    ///
    /// Falls back to the raw body when it is not a `Status` object.
    pub fn message_from_body(body: &str) -> String {
        serde_json::from_str::<ApiStatus>(body)
            .ok()
            .and_then(|status| status.message)
            .unwrap_or_else(|| body.trim().to_string())
    }
}
