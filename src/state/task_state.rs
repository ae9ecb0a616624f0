/// Traversal task state definitions
///
/// Every traversal task moves through these states exactly once and always
/// ends in a terminal state with its output stream closed.
use std::fmt;

/// Represents the current state of a single traversal task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    // ===== Active States =====
    /// Task has been spawned but has not yet checked its depth or claim
    Pending,

    /// Task won the claim and is waiting on the fetcher
    Fetching,

    /// Fetch succeeded and the task's own item has been emitted
    Fetched,

    /// Task is spawning one child per discovered link
    Spawning,

    /// Task is relaying child items upward
    Draining,

    // ===== Terminal States =====
    /// Task and all of its children have finished
    Done,

    /// Remaining depth was zero, nothing was fetched
    DepthExhausted,

    /// Another task already claimed this identifier
    Duplicate,

    /// The fetcher returned an error; the subtree is pruned
    Failed,

    /// The run's consumer went away, so the task quit without finishing
    Stopped,
}

impl TaskState {
    /// Returns true if the task has finished and closed its output
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Done | Self::DepthExhausted | Self::Duplicate | Self::Failed | Self::Stopped
        )
    }

    /// Returns true if the task ended without fetching anything
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::DepthExhausted | Self::Duplicate)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// ```text
    /// Pending -> DepthExhausted | Duplicate | Stopped | Fetching
    /// Fetching -> Failed | Fetched
    /// Fetched -> Spawning -> Draining -> Done
    /// Fetched | Draining -> Stopped
    /// ```
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::DepthExhausted)
                | (Self::Pending, Self::Duplicate)
                | (Self::Pending, Self::Stopped)
                | (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Failed)
                | (Self::Fetching, Self::Fetched)
                | (Self::Fetched, Self::Spawning)
                | (Self::Spawning, Self::Draining)
                | (Self::Draining, Self::Done)
                | (Self::Fetched, Self::Stopped)
                | (Self::Draining, Self::Stopped)
        )
    }

    /// Short lowercase name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Spawning => "spawning",
            Self::Draining => "draining",
            Self::Done => "done",
            Self::DepthExhausted => "depth_exhausted",
            Self::Duplicate => "duplicate",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
