//! Error types for the lifecycle client

use jobcheck_core::dto::ApiStatus;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the control plane
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an unexpected error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// An object with the same identity already exists
    #[error("Resource already exists: {0}")]
    Conflict(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The pod exists but its container has not produced logs yet
    #[error("Container not ready: {0}")]
    NotReady(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Classifies a non-success response by status code
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = ApiStatus::message_from_body(body);
        match status {
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::api_error(status, message),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is an identity collision
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_)) || matches!(self, Self::ApiError { status: 409, .. })
    }

    /// Check if this error means "no logs yet"
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady(_))
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        let body = r#"{"kind":"Status","message":"jobs.batch \"echo\" already exists","reason":"AlreadyExists","code":409}"#;
        let err = ClientError::from_status(409, body);
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "Resource already exists: jobs.batch \"echo\" already exists");

        assert!(ClientError::from_status(404, "").is_not_found());
        assert!(ClientError::from_status(503, "unavailable").is_server_error());
        assert!(ClientError::from_status(400, "bad").is_client_error());
    }

    #[test]
    fn test_not_ready_is_distinct() {
        let err = ClientError::NotReady("ContainerCreating".to_string());
        assert!(err.is_not_ready());
        assert!(!err.is_not_found());
        assert!(!err.is_client_error());
    }
}
