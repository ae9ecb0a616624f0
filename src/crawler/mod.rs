//! Crawler module for concurrent link traversal
//!
//! This module contains the core crawling logic, including:
//! - The recursive fan-out/fan-in traversal
//! - The `Fetcher` capability and its HTTP and in-memory implementations
//! - HTML parsing and link extraction for the HTTP fetcher

mod fetcher;
mod parser;
mod static_fetcher;
mod traversal;

pub use fetcher::{build_http_client, FetchedPage, Fetcher, HttpFetcher};
pub use parser::{parse_html, ParsedPage};
pub use static_fetcher::{CountingFetcher, StaticFetcher};
pub use traversal::{crawl, CrawlStream, ResultItem};

use crate::config::{Config, FetcherKind};
use crate::{ConfigError, FanoutError};
use std::sync::Arc;

/// Builds the fetcher selected by the configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn Fetcher>)` - A fetcher ready to be shared across tasks
/// * `Err(FanoutError)` - The HTTP client could not be built, or the
///   configuration lacks what the selected fetcher needs
pub fn build_fetcher(config: &Config) -> Result<Arc<dyn Fetcher>, FanoutError> {
    match config.fetcher.kind {
        FetcherKind::Static => {
            tracing::debug!("Using static fetcher with {} pages", config.pages.len());
            Ok(Arc::new(StaticFetcher::from_entries(&config.pages)))
        }
        FetcherKind::Http => {
            let user_agent = config.user_agent.as_ref().ok_or_else(|| {
                ConfigError::Validation(
                    "[user-agent] section is required for the http fetcher".to_string(),
                )
            })?;
            tracing::debug!("Using HTTP fetcher as {}", user_agent.user_agent_string());
            Ok(Arc::new(HttpFetcher::new(user_agent)?))
        }
    }
}
