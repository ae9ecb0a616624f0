//! Output module for presenting crawl results
//!
//! This module handles:
//! - Formatting result items for display
//! - Recording and printing run statistics

pub mod stats;

pub use stats::{print_report, CrawlReport, FetchFailure, RunTally};

use crate::crawler::ResultItem;

/// Formats a result item as `found: <id> "<content>"`
///
/// Content is debug-quoted so embedded quotes and newlines stay on one line.
pub fn format_item(item: &ResultItem) -> String {
    format!("found: {} {:?}", item.id, item.content)
}
