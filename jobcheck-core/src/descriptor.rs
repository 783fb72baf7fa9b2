//! Workload descriptor builder
//!
//! Produces the declarative definition of the ephemeral job for one
//! verification run. Each call to [`DescriptorBuilder::build`] yields a
//! fresh identity of the form `<base>-exec-<unix seconds>-<nonce>`, so a
//! run never collides with a previous run that may still be terminating.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::workload::{
    APP_LABEL, ImagePullPolicy, JOB_NAME_LABEL, RestartPolicy, WorkloadDescriptor,
    WorkloadIdentity,
};

/// Namespace used when none is given
pub const DEFAULT_NAMESPACE: &str = "default";

/// Image that hosts the function runtime under test
pub const DEFAULT_IMAGE: &str = "constructive/function-test-runner:v2";

/// Kubernetes object names are DNS-1123 labels
const MAX_NAME_LEN: usize = 63;

/// `-exec-` + 10 digit timestamp + `-` + 4 hex digits
const SUFFIX_LEN: usize = 21;

/// Errors produced while building a descriptor
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("invalid base name '{0}': must be lowercase alphanumerics or '-', starting and ending alphanumeric")]
    InvalidBaseName(String),

    #[error("base name '{name}' is too long ({len} > {max} characters)")]
    BaseNameTooLong { name: String, len: usize, max: usize },

    #[error("invalid namespace '{0}'")]
    InvalidNamespace(String),

    #[error("container image cannot be empty")]
    EmptyImage,

    #[error("container command cannot be empty")]
    EmptyCommand,
}

/// Command that boots the function runtime for `base_name`
pub fn default_command(base_name: &str) -> Vec<String> {
    vec![
        "npx".to_string(),
        "ts-node".to_string(),
        "functions/_runtimes/node/runner.js".to_string(),
        format!("functions/{}/src/index.ts", base_name),
    ]
}

fn is_dns_label(s: &str) -> bool {
    let bytes = s.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= MAX_NAME_LEN
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes[0].is_ascii_alphanumeric()
        && bytes[bytes.len() - 1].is_ascii_alphanumeric()
}

/// Builder for [`WorkloadDescriptor`]
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    base_name: String,
    namespace: String,
    image: String,
    image_pull_policy: ImagePullPolicy,
    command: Option<Vec<String>>,
    env: BTreeMap<String, String>,
    labels: BTreeMap<String, String>,
}

impl DescriptorBuilder {
    /// Creates a builder with the defaults used by the function test runner
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            image_pull_policy: ImagePullPolicy::default(),
            command: None,
            env: BTreeMap::new(),
            labels: BTreeMap::new(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn image_pull_policy(mut self, policy: ImagePullPolicy) -> Self {
        self.image_pull_policy = policy;
        self
    }

    /// Overrides the container command (defaults to [`default_command`])
    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = Some(command.into_iter().map(Into::into).collect());
        self
    }

    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Adds an extra label to the job object
    ///
    /// `job-name` and `app` are always set by the builder and win over
    /// labels given here.
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Builds a descriptor with a fresh identity
    pub fn build(&self) -> Result<WorkloadDescriptor, DescriptorError> {
        let nonce = (uuid::Uuid::new_v4().as_u128() & 0xffff) as u16;
        self.build_at(chrono::Utc::now(), nonce)
    }

    /// Builds a descriptor whose identity is derived from `now` and `nonce`
    pub fn build_at(
        &self,
        now: chrono::DateTime<chrono::Utc>,
        nonce: u16,
    ) -> Result<WorkloadDescriptor, DescriptorError> {
        self.validate()?;

        let name = format!("{}-exec-{}-{:04x}", self.base_name, now.timestamp(), nonce);
        let identity = WorkloadIdentity::new(name, self.namespace.clone());

        let mut labels = self.labels.clone();
        labels.insert(JOB_NAME_LABEL.to_string(), identity.name.clone());
        labels.insert(APP_LABEL.to_string(), self.base_name.clone());

        let command = self
            .command
            .clone()
            .unwrap_or_else(|| default_command(&self.base_name));
        if command.is_empty() {
            return Err(DescriptorError::EmptyCommand);
        }

        Ok(WorkloadDescriptor {
            identity,
            labels,
            container_name: self.base_name.clone(),
            container_image: self.image.clone(),
            image_pull_policy: self.image_pull_policy,
            command,
            env: self.env.clone(),
            restart_policy: RestartPolicy::Never,
            backoff_limit: 0,
        })
    }

    fn validate(&self) -> Result<(), DescriptorError> {
        let max = MAX_NAME_LEN - SUFFIX_LEN;
        if self.base_name.len() > max {
            return Err(DescriptorError::BaseNameTooLong {
                name: self.base_name.clone(),
                len: self.base_name.len(),
                max,
            });
        }
        if !is_dns_label(&self.base_name) {
            return Err(DescriptorError::InvalidBaseName(self.base_name.clone()));
        }
        if !is_dns_label(&self.namespace) {
            return Err(DescriptorError::InvalidNamespace(self.namespace.clone()));
        }
        if self.image.trim().is_empty() {
            return Err(DescriptorError::EmptyImage);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_time() -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_defaults() {
        let descriptor = DescriptorBuilder::new("send-email")
            .build_at(fixed_time(), 0x00ff)
            .unwrap();

        assert_eq!(descriptor.identity.name, "send-email-exec-1700000000-00ff");
        assert_eq!(descriptor.identity.namespace, DEFAULT_NAMESPACE);
        assert_eq!(descriptor.container_name, "send-email");
        assert_eq!(descriptor.container_image, DEFAULT_IMAGE);
        assert_eq!(descriptor.restart_policy, RestartPolicy::Never);
        assert_eq!(descriptor.backoff_limit, 0);
        assert_eq!(
            descriptor.command.last().map(String::as_str),
            Some("functions/send-email/src/index.ts")
        );
        assert_eq!(
            descriptor.labels.get(JOB_NAME_LABEL),
            Some(&descriptor.identity.name)
        );
        assert_eq!(descriptor.labels.get(APP_LABEL).map(String::as_str), Some("send-email"));
    }

    #[test]
    fn test_builder_overrides() {
        let descriptor = DescriptorBuilder::new("echo")
            .namespace("functions")
            .image("registry.local/echo:dev")
            .image_pull_policy(ImagePullPolicy::Always)
            .command(["node", "server.js"])
            .env("PGHOST", "postgres")
            .label("team", "platform")
            .label(APP_LABEL, "ignored")
            .build_at(fixed_time(), 1)
            .unwrap();

        assert_eq!(descriptor.identity.namespace, "functions");
        assert_eq!(descriptor.container_image, "registry.local/echo:dev");
        assert_eq!(descriptor.image_pull_policy, ImagePullPolicy::Always);
        assert_eq!(descriptor.command, vec!["node", "server.js"]);
        assert_eq!(descriptor.env.get("PGHOST").map(String::as_str), Some("postgres"));
        assert_eq!(descriptor.labels.get("team").map(String::as_str), Some("platform"));
        assert_eq!(descriptor.labels.get(APP_LABEL).map(String::as_str), Some("echo"));
    }

    #[test]
    fn test_fresh_identity_per_build() {
        let builder = DescriptorBuilder::new("echo");
        let a = builder.build_at(fixed_time(), 1).unwrap();
        let b = builder.build_at(fixed_time(), 2).unwrap();
        assert_ne!(a.identity, b.identity);
    }

    #[test]
    fn test_generated_name_fits_dns_label() {
        let base = "a".repeat(MAX_NAME_LEN - SUFFIX_LEN);
        let descriptor = DescriptorBuilder::new(base)
            .build_at(fixed_time(), 0xffff)
            .unwrap();
        assert_eq!(descriptor.identity.name.len(), MAX_NAME_LEN);
        assert!(is_dns_label(&descriptor.identity.name));
    }

    #[test]
    fn test_rejects_invalid_base_names() {
        for name in ["", "Echo", "echo_fn", "-echo", "echo-", "echo fn"] {
            let err = DescriptorBuilder::new(name).build_at(fixed_time(), 0).unwrap_err();
            assert_eq!(err, DescriptorError::InvalidBaseName(name.to_string()));
        }

        let long = "a".repeat(50);
        assert!(matches!(
            DescriptorBuilder::new(long).build_at(fixed_time(), 0),
            Err(DescriptorError::BaseNameTooLong { len: 50, .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_namespace_image_and_command() {
        assert!(matches!(
            DescriptorBuilder::new("echo").namespace("").build_at(fixed_time(), 0),
            Err(DescriptorError::InvalidNamespace(_))
        ));
        assert_eq!(
            DescriptorBuilder::new("echo").image(" ").build_at(fixed_time(), 0),
            Err(DescriptorError::EmptyImage)
        );
        assert_eq!(
            DescriptorBuilder::new("echo")
                .command(Vec::<String>::new())
                .build_at(fixed_time(), 0),
            Err(DescriptorError::EmptyCommand)
        );
    }
}
