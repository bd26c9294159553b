//! Task graph construction, command synthesis, and the execution engine.

pub mod command;
pub mod graph;
pub mod runner;

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Lifecycle state of one task during a run.
///
/// Transitions are monotonic: `Pending → Running → {Success, Failed}`, with
/// `Skipped` reachable directly from `Pending` when a dependency failed or an
/// `exit_on_failure` task stopped the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not yet scheduled.
    Pending,
    /// Currently executing commands.
    Running,
    /// All commands exited zero (or the run was a dry run).
    Success,
    /// A command exited non-zero or could not be spawned.
    Failed,
    /// Never ran: a dependency failed, or the run was cut short.
    Skipped,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-task run record, owned by the execution engine for the duration of a
/// run and exposed read-only afterwards for reporting.
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// Display name of the task.
    pub name: String,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// When the task entered `Running`.
    pub started: Option<Instant>,
    /// When the task reached a terminal state after running.
    pub finished: Option<Instant>,
    /// Error detail for `Failed` tasks (captured stderr or fault text).
    pub error: Option<String>,
}

impl TaskResult {
    /// Create a fresh `Pending` record for the named task.
    #[must_use]
    pub const fn new(name: String) -> Self {
        Self {
            name,
            status: TaskStatus::Pending,
            started: None,
            finished: None,
            error: None,
        }
    }

    /// Wall-clock duration of the task, or `None` until both timestamps are
    /// recorded.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        match (self.started, self.finished) {
            (Some(started), Some(finished)) => Some(finished.duration_since(started)),
            _ => None,
        }
    }
}
