//! In-memory fetchers
//!
//! `StaticFetcher` serves canned pages and is what the CLI uses for
//! `[[page]]` tables and the built-in sample. `CountingFetcher` wraps any other
//! fetcher and records how often each identifier was requested.

use crate::config::PageEntry;
use crate::crawler::fetcher::{FetchedPage, Fetcher};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Fetcher that returns canned results
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, FetchedPage>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a page
    pub fn with_page(mut self, id: impl Into<String>, page: FetchedPage) -> Self {
        self.pages.insert(id.into(), page);
        self
    }

    /// Builds a fetcher from `[[page]]` configuration entries
    pub fn from_entries(entries: &[PageEntry]) -> Self {
        entries
            .iter()
            .map(|entry| {
                (
                    entry.id.clone(),
                    FetchedPage::new(entry.content.clone(), entry.links.iter().cloned()),
                )
            })
            .collect()
    }

    /// The four-page golang.org sample graph
    ///
    /// `https://golang.org/cmd/` is linked from two pages but has no entry, so
    /// a crawl of this graph always reports exactly one fetch failure.
    pub fn golang_sample() -> Self {
        Self::new()
            .with_page(
                "https://golang.org/",
                FetchedPage::new(
                    "The Go Programming Language",
                    ["https://golang.org/pkg/", "https://golang.org/cmd/"],
                ),
            )
            .with_page(
                "https://golang.org/pkg/",
                FetchedPage::new(
                    "Packages",
                    [
                        "https://golang.org/",
                        "https://golang.org/cmd/",
                        "https://golang.org/pkg/fmt/",
                        "https://golang.org/pkg/os/",
                    ],
                ),
            )
            .with_page(
                "https://golang.org/pkg/fmt/",
                FetchedPage::new(
                    "Package fmt",
                    ["https://golang.org/", "https://golang.org/pkg/"],
                ),
            )
            .with_page(
                "https://golang.org/pkg/os/",
                FetchedPage::new(
                    "Package os",
                    ["https://golang.org/", "https://golang.org/pkg/"],
                ),
            )
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromIterator<(String, FetchedPage)> for StaticFetcher {
    fn from_iter<I: IntoIterator<Item = (String, FetchedPage)>>(iter: I) -> Self {
        Self {
            pages: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, id: &str) -> FetchResult<FetchedPage> {
        self.pages
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }
}

/// Wraps a fetcher and counts calls per identifier
pub struct CountingFetcher {
    inner: Arc<dyn Fetcher>,
    calls: Mutex<HashMap<String, usize>>,
}

impl CountingFetcher {
    pub fn new(inner: Arc<dyn Fetcher>) -> Self {
        Self {
            inner,
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Number of times `id` was fetched
    pub fn calls_for(&self, id: &str) -> usize {
        self.lock_calls().get(id).copied().unwrap_or(0)
    }

    /// Total number of fetch calls across all identifiers
    pub fn total_calls(&self) -> usize {
        self.lock_calls().values().sum()
    }

    /// Highest call count seen for any single identifier
    pub fn max_calls_per_id(&self) -> usize {
        self.lock_calls().values().copied().max().unwrap_or(0)
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, HashMap<String, usize>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch(&self, id: &str) -> FetchResult<FetchedPage> {
        *self.lock_calls().entry(id.to_string()).or_insert(0) += 1;
        self.inner.fetch(id).await
    }
}
