//! Run-scoped set of claimed identifiers
//!
//! The visited set is the only mutable state shared between traversal tasks.
//! An identifier is claimed before it is fetched, so a claim says "someone is
//! responsible for this" rather than "this has been fetched".

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// Concurrency-safe set of identifiers claimed during one crawl run
#[derive(Debug, Default)]
pub struct VisitedSet {
    claimed: Mutex<HashSet<String>>,
}

impl VisitedSet {
    /// Creates an empty visited set
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims an identifier for fetching
    ///
    /// The check and the insert happen under a single lock acquisition, so
    /// exactly one caller ever sees `true` for a given identifier no matter
    /// how many tasks race on it.
    ///
    /// # Returns
    ///
    /// * `true` - This call established the claim
    /// * `false` - The identifier was already claimed
    pub fn claim(&self, id: &str) -> bool {
        let mut claimed = self.lock();
        if claimed.contains(id) {
            return false;
        }
        claimed.insert(id.to_string())
    }

    /// Number of claimed identifiers
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the claimed identifiers in sorted order
    pub fn snapshot(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().iter().cloned().collect();
        ids.sort();
        ids
    }

    // A panic while holding the lock cannot leave the set half-updated, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
