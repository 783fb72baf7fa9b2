//! Scheduler layer for the harness
//!
//! This layer drives one workload from creation to a terminal outcome:
//! it creates the job, waits for its pod, tails the pod's logs for the
//! success marker and hands the workload back to the cleanup coordinator.

pub mod poller;
pub mod state;

pub use poller::ReadinessPoller;
pub use state::PollState;
