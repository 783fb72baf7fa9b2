//! Harness configuration
//!
//! Defines all configurable parameters for a verification run: which
//! function to deploy, how long to poll, how to reach the control plane,
//! and how to reach the database collaborator.

use jobcheck_core::DescriptorBuilder;
use jobcheck_core::descriptor::{DEFAULT_IMAGE, DEFAULT_NAMESPACE};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Substring the function runtime logs once it accepts connections
pub const SUCCESS_MARKER: &str = "listening on port";

/// Port `kubectl proxy` listens on by default
pub const DEFAULT_PROXY_PORT: u16 = 8001;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than 0")]
    Zero(&'static str),

    #[error("invalid PGPORT '{0}'")]
    InvalidPort(String),
}

/// Readiness polling parameters
///
/// `max_attempts * poll_interval` is the upper bound on time spent waiting
/// for the workload, excluding request latency.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Maximum number of poll ticks
    pub max_attempts: u32,

    /// Delay between two ticks
    pub poll_interval: Duration,

    /// Number of log lines requested per fetch
    pub tail_lines: u32,

    /// Substring that marks the workload as ready
    pub success_marker: String,

    /// Also read the backend job status and stop early if it failed
    pub watch_status: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            poll_interval: Duration::from_secs(2),
            tail_lines: 50,
            success_marker: SUCCESS_MARKER.to_string(),
            watch_status: false,
        }
    }
}

impl PollConfig {
    /// Upper bound on the time spent sleeping between ticks
    pub fn budget(&self) -> Duration {
        self.poll_interval * self.max_attempts.saturating_sub(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Zero("max_attempts"));
        }
        if self.tail_lines == 0 {
            return Err(ConfigError::Zero("tail_lines"));
        }
        if self.success_marker.is_empty() {
            return Err(ConfigError::Empty("success_marker"));
        }
        Ok(())
    }
}

/// `kubectl proxy` settings
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    /// Spawn a proxy for the duration of the run
    ///
    /// When false, a proxy is expected to already listen on `port`.
    pub enabled: bool,

    /// Executable used to start the proxy
    pub program: String,

    /// Local port the proxy listens on
    pub port: u16,

    /// How long to wait for the proxy to accept connections
    pub startup_timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "kubectl".to_string(),
            port: DEFAULT_PROXY_PORT,
            startup_timeout: Duration::from_secs(10),
        }
    }
}

impl ProxyConfig {
    /// Base URL of the control plane as seen through the proxy
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

/// Connection settings for the database collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

impl DatabaseConfig {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - PGHOST (optional, default: localhost)
    /// - PGPORT (optional, default: 5432)
    /// - PGPASSWORD (optional)
    /// - PGDATABASE (optional, default: `<function>_test_<random>`)
    pub fn from_env(function_name: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(function_name, |key| std::env::var(key).ok())
    }

    /// Same as [`DatabaseConfig::from_env`] with an explicit variable source
    pub fn from_lookup<F>(function_name: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("PGHOST").unwrap_or_else(|| "localhost".to_string());

        let port = match lookup("PGPORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => 5432,
        };

        let database = lookup("PGDATABASE").unwrap_or_else(|| {
            let suffix = uuid::Uuid::new_v4().as_u128() % 100_000;
            format!("{}_test_{}", function_name.replace('-', "_"), suffix)
        });

        Ok(Self {
            host,
            port,
            user: "postgres".to_string(),
            password: lookup("PGPASSWORD"),
            database,
        })
    }
}

/// Configuration for one verification run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Function under test; also the base of the workload name
    pub function_name: String,

    /// Namespace the workload is created in
    pub namespace: String,

    /// Container image hosting the function runtime
    pub image: String,

    /// Environment passed to the workload container
    pub workload_env: BTreeMap<String, String>,

    /// Timeout applied to every request to the control plane
    pub request_timeout: Duration,

    pub proxy: ProxyConfig,

    pub poll: PollConfig,

    pub database: DatabaseConfig,

    /// Run the database liveness check after the workload check
    pub check_database: bool,
}

impl HarnessConfig {
    /// Creates a configuration with defaults
    ///
    /// The workload reaches the database through the in-cluster `postgres`
    /// service and receives the harness's database password, if any.
    pub fn new(function_name: impl Into<String>, database: DatabaseConfig) -> Self {
        let mut workload_env = BTreeMap::new();
        workload_env.insert("PGHOST".to_string(), "postgres".to_string());
        if let Some(password) = &database.password {
            workload_env.insert("PGPASSWORD".to_string(), password.clone());
        }

        Self {
            function_name: function_name.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            workload_env,
            request_timeout: Duration::from_secs(10),
            proxy: ProxyConfig::default(),
            poll: PollConfig::default(),
            database,
            check_database: true,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = proxy;
        self
    }

    /// Descriptor builder preloaded with this run's workload settings
    pub fn descriptor_builder(&self) -> DescriptorBuilder {
        self.workload_env.iter().fold(
            DescriptorBuilder::new(self.function_name.clone())
                .namespace(self.namespace.clone())
                .image(self.image.clone()),
            |builder, (name, value)| builder.env(name.clone(), value.clone()),
        )
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.function_name.is_empty() {
            return Err(ConfigError::Empty("function_name"));
        }
        if self.namespace.is_empty() {
            return Err(ConfigError::Empty("namespace"));
        }
        if self.image.is_empty() {
            return Err(ConfigError::Empty("image"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Zero("request_timeout"));
        }
        if self.proxy.port == 0 {
            return Err(ConfigError::Zero("proxy port"));
        }
        self.poll.validate()
    }
}
