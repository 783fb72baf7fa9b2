//! Mutable state of one poll loop

use jobcheck_core::domain::poll::{Outcome, PollResult};

/// State owned by a single [`ReadinessPoller`](super::ReadinessPoller) run
///
/// Never shared between runs. `outcome` is `None` while the poll is pending
/// and is set exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    pub pod_name: Option<String>,
    pub last_log_tail: String,
    pub elapsed_attempts: u32,
    pub outcome: Option<Outcome>,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }

    /// Keeps `tail` unless it is empty, so the last useful output survives
    pub fn record_tail(&mut self, tail: String) {
        if !tail.is_empty() {
            self.last_log_tail = tail;
        }
    }

    /// Moves to a terminal outcome and produces the result
    pub fn finish(&mut self, outcome: Outcome) -> PollResult {
        debug_assert!(self.is_pending(), "poll state finished twice");
        self.outcome = Some(outcome);

        PollResult {
            outcome,
            captured_log: self.last_log_tail.clone(),
            attempts: self.elapsed_attempts,
            pod_name: self.pod_name.clone(),
        }
    }
}
