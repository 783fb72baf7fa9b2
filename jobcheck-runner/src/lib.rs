//! Jobcheck Runner
//!
//! Verifies that a function workload boots on the cluster.
//!
//! Architecture:
//! - Configuration: Poll budget, proxy and database settings
//! - Proxy: Scoped `kubectl proxy` process that authenticates API calls
//! - Scheduler: Readiness state machine driving one workload to an outcome
//! - Cleanup: Idempotent removal of the workload on every exit path
//! - Database: `SELECT 1` liveness probe against the database collaborator
//! - Harness: Sequences the checks and collects a report

pub mod cleanup;
pub mod config;
pub mod db;
pub mod error;
pub mod harness;
pub mod proxy;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use cleanup::{CleanupCoordinator, Removal};
pub use config::{DatabaseConfig, HarnessConfig, PollConfig, ProxyConfig};
pub use error::{HarnessError, Result};
pub use harness::{DatabaseCheck, Suite, SuiteReport, ensure_succeeded, verify_workload};
pub use scheduler::ReadinessPoller;
