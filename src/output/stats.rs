//! Run statistics
//!
//! Traversal tasks record their terminal state into a shared [`RunTally`]; a
//! [`CrawlReport`] is a point-in-time snapshot of it for display.

use crate::state::TaskState;
use crate::FetchError;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A fetch that failed during the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// The identifier that could not be fetched
    pub id: String,

    /// Why it failed
    pub error: FetchError,
}

/// Snapshot of a crawl run's counters
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// When the run was started
    pub started_at: DateTime<Utc>,

    /// Identifiers fetched successfully (one result item each)
    pub fetched: u64,

    /// Tasks that lost the claim for their identifier
    pub duplicates: u64,

    /// Tasks spawned with no depth budget left
    pub depth_exhausted: u64,

    /// Fetch failures in the order they were observed
    pub failures: Vec<FetchFailure>,

    /// Identifiers claimed in the visited set
    pub visited: usize,
}

impl CrawlReport {
    /// Returns true if a fetch for `id` failed during the run
    pub fn failed(&self, id: &str) -> bool {
        self.failures.iter().any(|f| f.id == id)
    }
}

/// Concurrently updated counters for one run
#[derive(Debug)]
pub struct RunTally {
    started_at: DateTime<Utc>,
    fetched: AtomicU64,
    duplicates: AtomicU64,
    depth_exhausted: AtomicU64,
    failures: Mutex<Vec<FetchFailure>>,
}

impl RunTally {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            fetched: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            depth_exhausted: AtomicU64::new(0),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Records a task reaching one of its counted states
    ///
    /// States other than `Fetched`, `Duplicate` and `DepthExhausted` are
    /// ignored; failures carry an error and go through [`Self::record_failure`].
    pub fn record(&self, state: TaskState) {
        let counter = match state {
            TaskState::Fetched => &self.fetched,
            TaskState::Duplicate => &self.duplicates,
            TaskState::DepthExhausted => &self.depth_exhausted,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, error: FetchError) {
        let failure = FetchFailure {
            id: error.id().to_string(),
            error,
        };
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(failure);
    }

    /// Takes a snapshot; `visited` comes from the run's visited set
    pub fn snapshot(&self, visited: usize) -> CrawlReport {
        CrawlReport {
            started_at: self.started_at,
            fetched: self.fetched.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            depth_exhausted: self.depth_exhausted.load(Ordering::Relaxed),
            failures: self
                .failures
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone(),
            visited,
        }
    }
}

impl Default for RunTally {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    let elapsed = Utc::now() - report.started_at;

    println!();
    println!("=== Crawl Report ===\n");
    println!("Overview:");
    println!("  Started at: {}", report.started_at.to_rfc3339());
    println!("  Elapsed: {}ms", elapsed.num_milliseconds());
    println!("  Identifiers claimed: {}", report.visited);
    println!("  Fetched: {}", report.fetched);
    println!("  Failed: {}", report.failures.len());
    println!("  Duplicate claims skipped: {}", report.duplicates);
    println!("  Depth-exhausted tasks: {}", report.depth_exhausted);

    if !report.failures.is_empty() {
        println!();
        println!("Failures ({}):", report.failures.len());
        for failure in &report.failures {
            println!("  - {}", failure.error);
        }
    }
}
