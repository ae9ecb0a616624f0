//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitedSet`: The run-scoped set of claimed identifiers shared by all tasks
//! - `TaskState`: The lifecycle of a single traversal task

mod task_state;
mod visited;

// Re-export main types
pub use task_state::TaskState;
pub use visited::VisitedSet;
