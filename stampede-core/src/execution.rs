//! Execution lifecycle types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution status
///
/// `Pending → Running → {Completed, Cancelled, Failed, TimedOut}`; the four
/// terminal states admit no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Execution is registered but workers are not yet running
    Pending,
    /// Workers are issuing requests
    Running,
    /// Deadline reached and all workers exited normally
    Completed,
    /// An unrecoverable orchestration error occurred
    Failed,
    /// An explicit stop cancelled the run before its deadline
    Cancelled,
    /// Workers did not exit within the drain window and were aborted
    TimedOut,
}

impl ExecutionStatus {
    /// Check if the execution is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed
                | ExecutionStatus::Failed
                | ExecutionStatus::Cancelled
                | ExecutionStatus::TimedOut
        )
    }

    /// Check if the execution is still active
    pub fn is_active(&self) -> bool {
        matches!(self, ExecutionStatus::Pending | ExecutionStatus::Running)
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: ExecutionStatus) -> bool {
        match self {
            ExecutionStatus::Pending => {
                matches!(next, ExecutionStatus::Running) || next.is_terminal()
            }
            ExecutionStatus::Running => next.is_terminal(),
            _ => false,
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
            ExecutionStatus::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an execution's cancellation signal fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The configured duration elapsed
    Deadline,
    /// A caller asked for the run to stop
    Stopped,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Deadline => write!(f, "deadline"),
            CancelReason::Stopped => write!(f, "stopped"),
        }
    }
}
