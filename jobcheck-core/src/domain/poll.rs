//! Poll outcome types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal outcome of a readiness poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The success marker appeared in the log tail
    Succeeded,
    /// The backend reported the workload as failed
    Failed,
    /// The attempt budget ran out without a match
    TimedOut,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
        };
        f.write_str(s)
    }
}

/// Result of a readiness poll, returned to the caller for assertions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResult {
    pub outcome: Outcome,
    /// Log tail that matched on success, otherwise the last non-empty tail seen
    pub captured_log: String,
    /// Number of poll ticks spent
    pub attempts: u32,
    /// Pod the logs were read from, if one was ever scheduled
    pub pod_name: Option<String>,
}

impl PollResult {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Succeeded
    }
}
